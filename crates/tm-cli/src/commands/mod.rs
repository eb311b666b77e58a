//! CLI subcommand implementations.

pub mod delete;
pub mod edit;
pub mod insights;
pub mod list;
pub mod refresh;
pub mod start;
pub mod status;
pub mod stop;
pub mod totals;
pub mod util;
