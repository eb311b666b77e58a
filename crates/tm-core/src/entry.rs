//! Completed time-tracking intervals.

use chrono::{DateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EntryId, ValidationError};

/// One recorded interval of time spent on a category.
///
/// The duration is derived from `start` and `end` on every read and is never
/// stored. Timestamps are kept to whole seconds, the precision the remote
/// service exchanges, so an entry survives a push and pull unchanged.
/// Construction rejects intervals that end before they start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry")]
pub struct TimeEntry {
    id: EntryId,
    category: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawEntry {
    id: EntryId,
    category: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawEntry> for TimeEntry {
    type Error = ValidationError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        Self::with_id(raw.id, raw.category, raw.start, raw.end)
    }
}

impl TimeEntry {
    /// Creates an entry with a freshly generated identifier.
    pub fn new(
        category: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Self::with_id(EntryId::new(), category, start, end)
    }

    /// Rebuilds an entry whose identifier is already known, e.g. when
    /// rehydrating from disk or from the remote service.
    pub fn with_id(
        id: EntryId,
        category: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let (start, end) = (start.trunc_subsecs(0), end.trunc_subsecs(0));
        check_span(start, end)?;
        Ok(Self {
            id,
            category: category.into(),
            start,
            end,
        })
    }

    /// Builds an entry with a fresh identifier, pulling `end` up to `start`
    /// if the two are inverted.
    pub(crate) fn clamped(category: String, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let (start, end) = (start.trunc_subsecs(0), end.trunc_subsecs(0));
        Self {
            id: EntryId::new(),
            category,
            start,
            end: end.max(start),
        }
    }

    pub const fn id(&self) -> EntryId {
        self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Time between `start` and `end`.
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Whole seconds between `start` and `end`.
    pub fn duration_secs(&self) -> i64 {
        self.duration().num_seconds()
    }

    /// Replaces the category label.
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }

    /// Moves the interval, keeping the identifier.
    pub fn reschedule(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
        let (start, end) = (start.trunc_subsecs(0), end.trunc_subsecs(0));
        check_span(start, end)?;
        self.start = start;
        self.end = end;
        Ok(())
    }
}

fn check_span(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::EndBeforeStart {
            start: start.to_rfc3339_opts(SecondsFormat::Secs, true),
            end: end.to_rfc3339_opts(SecondsFormat::Secs, true),
        });
    }
    Ok(())
}
