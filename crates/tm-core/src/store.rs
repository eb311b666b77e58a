//! Local persistence seam for the entry log.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::entry::TimeEntry;
use crate::session::LoggingSession;

/// Local read/write failures.
///
/// The log manager never propagates these: a failed save keeps the
/// in-memory log, a failed load starts from an empty one.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the backing file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The collection could not be serialized.
    #[error("failed to encode log: {0}")]
    Encode(#[source] serde_json::Error),
    /// The stored data is corrupt or from an incompatible schema.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The store refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for the ordered entry collection and the open session.
///
/// Implementations are stateless with respect to the log: they never keep
/// their own copy, they only translate to and from the backing medium.
pub trait LogStore: Send + Sync {
    /// Replaces the stored collection. Must not leave a partial write behind.
    fn save(&self, entries: &[TimeEntry]) -> Result<(), PersistenceError>;

    /// Reads the stored collection; empty if nothing was ever saved.
    fn load(&self) -> Result<Vec<TimeEntry>, PersistenceError>;

    /// Stores or clears the open logging session.
    fn save_session(&self, session: Option<&LoggingSession>) -> Result<(), PersistenceError>;

    /// Reads the open logging session, if any.
    fn load_session(&self) -> Result<Option<LoggingSession>, PersistenceError>;
}

/// A [`LogStore`] held in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Option<Vec<TimeEntry>>>,
    session: Mutex<Option<LoggingSession>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a previously saved collection.
    pub fn with_entries(entries: Vec<TimeEntry>) -> Self {
        Self {
            entries: Mutex::new(Some(entries)),
            ..Self::default()
        }
    }

    /// Last saved collection, or `None` if `save` was never called.
    pub fn saved(&self) -> Option<Vec<TimeEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogStore for MemoryStore {
    fn save(&self, entries: &[TimeEntry]) -> Result<(), PersistenceError> {
        *self.entries.lock().unwrap_or_else(PoisonError::into_inner) = Some(entries.to_vec());
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn load(&self) -> Result<Vec<TimeEntry>, PersistenceError> {
        Ok(self.saved().unwrap_or_default())
    }

    fn save_session(&self, session: Option<&LoggingSession>) -> Result<(), PersistenceError> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = session.cloned();
        Ok(())
    }

    fn load_session(&self) -> Result<Option<LoggingSession>, PersistenceError> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_empty());
        assert!(store.saved().is_none());
        assert!(store.load_session().unwrap().is_none());
    }

    #[test]
    fn memory_store_round_trips() {
        let start = Utc.with_ymd_and_hms(2025, 5, 17, 9, 0, 0).unwrap();
        let entry = TimeEntry::new("Work", start, start).unwrap();
        let store = MemoryStore::new();
        store.save(std::slice::from_ref(&entry)).unwrap();
        assert_eq!(store.load().unwrap(), vec![entry]);
        assert_eq!(store.save_count(), 1);

        let session = LoggingSession::new("Rest", start);
        store.save_session(Some(&session)).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(session));
        store.save_session(None).unwrap();
        assert!(store.load_session().unwrap().is_none());
    }
}
