//! Local storage for the Time Machine logger.
//!
//! Everything is kept as plain JSON documents in the application's data
//! directory:
//!
//! - the entry log, a single array of `{id, category, start, end}` objects
//! - the open logging session, present only while logging
//! - the last AI insight of each kind
//!
//! # Atomicity
//!
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target. A crash mid-write leaves either the previous
//! document or the new one, never a truncated file.
//!
//! # Schema
//!
//! Timestamps are RFC 3339 strings in UTC (e.g. `2025-05-17T09:00:00Z`), as
//! produced by `chrono::DateTime<Utc>` serialization. Entry durations are
//! derived and never written. Adding fields is backwards compatible; removing
//! or renaming fields makes old files undecodable, which the log manager
//! treats as an empty log.

use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use tm_core::{LogStore, LoggingSession, PersistenceError, TimeEntry};

/// File name of the entry log inside a data directory.
pub const LOG_FILE: &str = "TimeLog.json";
/// File name of the open logging session inside a data directory.
pub const SESSION_FILE: &str = "session.json";
/// File name of the insight cache inside a data directory.
pub const INSIGHTS_FILE: &str = "insights.json";

/// A [`LogStore`] backed by JSON files.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    log_path: PathBuf,
    session_path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store using explicit file locations.
    ///
    /// Nothing is touched on disk until the first save.
    pub fn new(log_path: impl Into<PathBuf>, session_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            session_path: session_path.into(),
        }
    }

    /// Creates a store with the standard file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(LOG_FILE), dir.join(SESSION_FILE))
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }
}

impl LogStore for JsonFileStore {
    fn save(&self, entries: &[TimeEntry]) -> Result<(), PersistenceError> {
        write_json_atomic(&self.log_path, entries)?;
        tracing::debug!(path = %self.log_path.display(), entries = entries.len(), "saved log");
        Ok(())
    }

    fn load(&self) -> Result<Vec<TimeEntry>, PersistenceError> {
        let entries: Vec<TimeEntry> = read_json(&self.log_path)?.unwrap_or_default();
        tracing::debug!(path = %self.log_path.display(), entries = entries.len(), "loaded log");
        Ok(entries)
    }

    fn save_session(&self, session: Option<&LoggingSession>) -> Result<(), PersistenceError> {
        match session {
            Some(session) => write_json_atomic(&self.session_path, session),
            None => remove_if_exists(&self.session_path),
        }
    }

    fn load_session(&self) -> Result<Option<LoggingSession>, PersistenceError> {
        read_json(&self.session_path)
    }
}

/// The last generated insight of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedInsight {
    pub generated_at: DateTime<Utc>,
    pub lines: Vec<String>,
}

/// Last AI insight per kind, keyed by the kind's name.
#[derive(Debug, Clone)]
pub struct InsightCache {
    path: PathBuf,
}

impl InsightCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cached insight for `kind`, if one was stored.
    pub fn get(&self, kind: &str) -> Result<Option<CachedInsight>, PersistenceError> {
        Ok(self.read_all()?.remove(kind))
    }

    /// Replaces the cached insight for `kind`, keeping the other kinds.
    pub fn put(&self, kind: &str, insight: CachedInsight) -> Result<(), PersistenceError> {
        let mut all = match self.read_all() {
            Ok(all) => all,
            Err(err @ PersistenceError::Decode { .. }) => {
                tracing::warn!(error = %err, "insight cache unreadable; starting over");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        all.insert(kind.to_string(), insight);
        write_json_atomic(&self.path, &all)
    }

    fn read_all(&self) -> Result<BTreeMap<String, CachedInsight>, PersistenceError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }
}

/// Reads a JSON document; `None` if the file does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let contents = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&contents)
        .map(Some)
        .map_err(|source| PersistenceError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes `value` as JSON to `path` via a temporary file and rename.
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let io_err = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value).map_err(PersistenceError::Encode)?;
        writer.flush().map_err(io_err)?;
    }
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), PersistenceError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
