//! The log manager: sole owner of the entry collection.
//!
//! Every mutation runs the same write path while holding the state lock:
//! bump the revision, save locally, publish a snapshot to subscribers, then
//! hand the full collection to a background push. Readers only ever see
//! whole snapshots, never a collection halfway through an update.
//!
//! # Refresh and staleness
//!
//! [`LogManager::refresh`] replaces the local collection with the remote one.
//! The revision current when the pull was issued is compared with the
//! revision when the response arrives; if anything mutated the log in
//! between, the response is discarded rather than clobbering newer state.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::aggregate::{Aggregator, CategoryTotals};
use crate::clock::{Clock, SystemClock};
use crate::entry::TimeEntry;
use crate::remote::{RemoteError, RemoteLog};
use crate::session::LoggingSession;
use crate::store::LogStore;
use crate::types::{EntryId, Identity, ValidationError};

/// Why a refresh left the local log untouched.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// No remote service or identity was configured.
    #[error("remote sync is not configured")]
    Offline,
    /// The pull failed as a whole.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// The log changed while the pull was in flight.
    #[error("log changed while pull was in flight (revision {issued} -> {current})")]
    Stale { issued: u64, current: u64 },
}

/// A consistent view of the log at one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSnapshot {
    /// Entries, most recently created first.
    pub entries: Arc<[TimeEntry]>,
    /// The open logging session, if any.
    pub session: Option<LoggingSession>,
    /// Incremented on every collection mutation.
    pub revision: u64,
}

/// Remote service plus the identity its requests are keyed by.
#[derive(Clone)]
pub struct RemoteTarget {
    client: Arc<dyn RemoteLog>,
    identity: Identity,
}

impl RemoteTarget {
    pub fn new(client: Arc<dyn RemoteLog>, identity: Identity) -> Self {
        Self { client, identity }
    }
}

struct LogState {
    entries: Vec<TimeEntry>,
    session: Option<LoggingSession>,
    revision: u64,
}

impl LogState {
    fn snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            entries: self.entries.clone().into(),
            session: self.session.clone(),
            revision: self.revision,
        }
    }
}

/// Which side effects follow a collection mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WritePath {
    SaveAndPush,
    SaveOnly,
}

/// Configures and opens a [`LogManager`].
pub struct LogManagerBuilder {
    store: Arc<dyn LogStore>,
    remote: Option<RemoteTarget>,
    clock: Arc<dyn Clock>,
    aggregator: Aggregator,
}

impl LogManagerBuilder {
    /// Mirrors the log to `target`.
    #[must_use]
    pub fn remote(mut self, target: RemoteTarget) -> Self {
        self.remote = Some(target);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Loads the local log and any open session, then builds the manager.
    ///
    /// Unreadable local data is logged and replaced with an empty log.
    pub fn open(self) -> LogManager {
        let entries = match self.store.load() {
            Ok(entries) => dedupe(entries),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load local log; starting empty");
                Vec::new()
            }
        };
        let session = self.store.load_session().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to load logging session; discarding it");
            None
        });
        tracing::debug!(
            entries = entries.len(),
            logging = session.is_some(),
            "opened log"
        );

        let state = LogState {
            entries,
            session,
            revision: 0,
        };
        let (changes, _) = watch::channel(state.snapshot());

        LogManager {
            store: self.store,
            remote: self.remote,
            clock: self.clock,
            aggregator: self.aggregator,
            state: Mutex::new(state),
            changes,
            pending_push: Mutex::new(None),
        }
    }
}

/// Owns the authoritative entry collection and the logging session.
///
/// Share it behind an `Arc`; all operations take `&self`. Pushes are spawned
/// onto the ambient Tokio runtime, so mutating calls that should reach the
/// remote must run inside one.
pub struct LogManager {
    store: Arc<dyn LogStore>,
    remote: Option<RemoteTarget>,
    clock: Arc<dyn Clock>,
    aggregator: Aggregator,
    state: Mutex<LogState>,
    changes: watch::Sender<LogSnapshot>,
    pending_push: Mutex<Option<JoinHandle<()>>>,
}

impl LogManager {
    pub fn builder(store: Arc<dyn LogStore>) -> LogManagerBuilder {
        LogManagerBuilder {
            store,
            remote: None,
            clock: Arc::new(SystemClock),
            aggregator: Aggregator::default(),
        }
    }

    /// The current log.
    pub fn snapshot(&self) -> LogSnapshot {
        self.changes.borrow().clone()
    }

    /// Receives a fresh snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<LogSnapshot> {
        self.changes.subscribe()
    }

    pub fn entries(&self) -> Arc<[TimeEntry]> {
        self.changes.borrow().entries.clone()
    }

    pub fn session(&self) -> Option<LoggingSession> {
        self.changes.borrow().session.clone()
    }

    pub fn is_logging(&self) -> bool {
        self.changes.borrow().session.is_some()
    }

    pub const fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Per-category totals over the current log.
    pub fn totals(&self) -> CategoryTotals {
        self.aggregator.totals(&self.entries())
    }

    /// Begins logging `category` from now.
    ///
    /// Returns `false` and changes nothing if a session is already open.
    pub fn start_logging(&self, category: impl Into<String>) -> bool {
        let mut state = self.lock_state();
        if state.session.is_some() {
            tracing::debug!("already logging; ignoring start");
            return false;
        }
        let session = LoggingSession::new(category, self.clock.now());
        if let Err(err) = self.store.save_session(Some(&session)) {
            tracing::warn!(error = %err, "failed to persist logging session");
        }
        tracing::debug!(category = %session.category, started_at = %session.started_at, "started logging");
        state.session = Some(session);
        self.publish(&state);
        true
    }

    /// Closes the open session into a new entry at the front of the log.
    ///
    /// Returns `None` if nothing was being logged.
    pub fn stop_logging(&self) -> Option<TimeEntry> {
        let mut state = self.lock_state();
        let session = state.session.take()?;
        if let Err(err) = self.store.save_session(None) {
            tracing::warn!(error = %err, "failed to clear logging session");
        }
        let entry = session.finish(self.clock.now());
        tracing::info!(
            id = %entry.id(),
            category = entry.category(),
            seconds = entry.duration_secs(),
            "logged entry"
        );
        state.entries.insert(0, entry.clone());
        self.commit(&mut state, WritePath::SaveAndPush);
        Some(entry)
    }

    /// Removes the entries at `positions`; out-of-range positions are ignored.
    ///
    /// Returns how many entries were removed.
    pub fn delete_at(&self, positions: &[usize]) -> usize {
        let targets: HashSet<usize> = positions.iter().copied().collect();
        self.retain(|index, _| !targets.contains(&index))
    }

    /// Removes the entries with the given identifiers.
    ///
    /// Returns how many entries were removed.
    pub fn delete_ids(&self, ids: &[EntryId]) -> usize {
        let targets: HashSet<EntryId> = ids.iter().copied().collect();
        self.retain(|_, entry| !targets.contains(&entry.id()))
    }

    fn retain(&self, mut keep: impl FnMut(usize, &TimeEntry) -> bool) -> usize {
        let mut state = self.lock_state();
        let before = state.entries.len();
        let mut index = 0;
        state.entries.retain(|entry| {
            let kept = keep(index, entry);
            index += 1;
            kept
        });
        let removed = before - state.entries.len();
        if removed > 0 {
            tracing::info!(removed, "deleted entries");
            self.commit(&mut state, WritePath::SaveAndPush);
        }
        removed
    }

    /// Overwrites the entry with identifier `id` in place.
    ///
    /// Returns `Ok(false)` without touching anything if no entry has that
    /// identifier, and an error if `end` precedes `start`.
    pub fn edit_entry(
        &self,
        id: EntryId,
        category: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, ValidationError> {
        let replacement = TimeEntry::with_id(id, category, start, end)?;
        let mut state = self.lock_state();
        let Some(slot) = state.entries.iter_mut().find(|entry| entry.id() == id) else {
            tracing::debug!(%id, "edit target not found");
            return Ok(false);
        };
        *slot = replacement;
        tracing::info!(%id, "edited entry");
        self.commit(&mut state, WritePath::SaveAndPush);
        Ok(true)
    }

    /// Pulls the remote log and replaces the local one with it.
    ///
    /// Returns the number of entries now in the log. On any error the local
    /// log is left exactly as it was.
    pub async fn refresh(&self) -> Result<usize, RefreshError> {
        let target = self.remote.as_ref().ok_or(RefreshError::Offline)?;
        let issued = self.lock_state().revision;

        let pulled = match target.client.pull(&target.identity).await {
            Ok(pulled) => pulled,
            Err(err) => {
                tracing::warn!(error = %err, "remote pull failed; keeping local log");
                return Err(err.into());
            }
        };

        let mut state = self.lock_state();
        if state.revision != issued {
            tracing::info!(
                issued,
                current = state.revision,
                "discarding stale pull"
            );
            return Err(RefreshError::Stale {
                issued,
                current: state.revision,
            });
        }

        state.entries = dedupe(pulled);
        let count = state.entries.len();
        tracing::info!(entries = count, "replaced local log with remote");
        self.commit(&mut state, WritePath::SaveOnly);
        Ok(count)
    }

    /// Waits for the most recent push to finish.
    pub async fn flush(&self) {
        let pending = self
            .pending_push
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = pending {
            if let Err(err) = task.await {
                tracing::debug!(error = %err, "push task did not complete");
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(&self, state: &mut LogState, path: WritePath) {
        state.revision += 1;
        if let Err(err) = self.store.save(&state.entries) {
            tracing::warn!(error = %err, "failed to save log locally");
        }
        self.publish(state);
        if path == WritePath::SaveAndPush {
            self.spawn_push(state.entries.clone());
        }
    }

    fn publish(&self, state: &LogState) {
        self.changes.send_replace(state.snapshot());
    }

    fn spawn_push(&self, entries: Vec<TimeEntry>) {
        let Some(target) = self.remote.clone() else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("no async runtime available; skipping remote push");
            return;
        };

        let task = runtime.spawn(async move {
            match target.client.push(&target.identity, &entries).await {
                Ok(()) => tracing::debug!(entries = entries.len(), "pushed log to remote"),
                Err(err) => tracing::warn!(error = %err, "remote push failed"),
            }
        });

        let superseded = self
            .pending_push
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = superseded {
            previous.abort();
        }
    }
}

/// Drops entries whose identifier already appeared earlier in the list.
fn dedupe(entries: Vec<TimeEntry>) -> Vec<TimeEntry> {
    let mut seen = HashSet::with_capacity(entries.len());
    let before = entries.len();
    let unique: Vec<TimeEntry> = entries
        .into_iter()
        .filter(|entry| seen.insert(entry.id()))
        .collect();
    if unique.len() != before {
        tracing::warn!(dropped = before - unique.len(), "dropped entries with duplicate IDs");
    }
    unique
}
