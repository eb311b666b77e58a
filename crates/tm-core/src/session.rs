//! The in-progress logging marker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::TimeEntry;

/// An open logging session: a category and the moment logging began.
///
/// Exists only between a start and the matching stop. Stopping converts it
/// into a [`TimeEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSession {
    pub category: String,
    pub started_at: DateTime<Utc>,
}

impl LoggingSession {
    pub fn new(category: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            category: category.into(),
            started_at,
        }
    }

    /// Closes the session at `ended_at`.
    ///
    /// A clock that stepped backwards would yield an inverted interval; the
    /// end is clamped to the start in that case.
    pub fn finish(self, ended_at: DateTime<Utc>) -> TimeEntry {
        if ended_at < self.started_at {
            tracing::warn!(
                started_at = %self.started_at,
                %ended_at,
                "clock moved backwards while logging; clamping entry to zero length"
            );
        }
        TimeEntry::clamped(self.category, self.started_at, ended_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn finish_produces_entry_with_session_fields() {
        let start = Utc.with_ymd_and_hms(2025, 5, 17, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 5, 17, 9, 45, 0).unwrap();
        let entry = LoggingSession::new("Exercise", start).finish(end);
        assert_eq!(entry.category(), "Exercise");
        assert_eq!(entry.start(), start);
        assert_eq!(entry.end(), end);
        assert_eq!(entry.duration_secs(), 2700);
    }

    #[test]
    fn finish_clamps_backwards_clock() {
        let start = Utc.with_ymd_and_hms(2025, 5, 17, 9, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2025, 5, 17, 8, 0, 0).unwrap();
        let entry = LoggingSession::new("Work", start).finish(earlier);
        assert_eq!(entry.end(), start);
        assert_eq!(entry.duration_secs(), 0);
    }
}
