//! Time Machine CLI library.
//!
//! This crate provides the `tm` command-line interface: argument parsing,
//! layered configuration, and one module per subcommand.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{Config, dirs_data_path};
