//! Core domain logic for the Time Machine logger.
//!
//! This crate contains the fundamental types and logic for:
//! - Entries: completed intervals with a derived duration
//! - Logging sessions: the open start/stop marker
//! - Aggregation: per-category totals over the log
//! - The log manager: the single owner of the entry collection, mirrored to
//!   a local store and a remote service

mod aggregate;
mod clock;
mod entry;
mod manager;
mod remote;
mod session;
mod store;
pub mod types;

pub use aggregate::{
    Aggregator, BucketTotal, CategoryTotals, DEFAULT_CATEGORIES, OTHER_BUCKET, format_hours_minutes,
    format_minutes_seconds,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::TimeEntry;
pub use manager::{LogManager, LogManagerBuilder, LogSnapshot, RefreshError, RemoteTarget};
pub use remote::{RemoteError, RemoteLog};
pub use session::LoggingSession;
pub use store::{LogStore, MemoryStore, PersistenceError};
pub use types::{EntryId, Identity, ValidationError};
