//! Status command for showing the open session and log size.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};

use tm_core::{LogManager, LogSnapshot, TimeEntry, format_hours_minutes, format_minutes_seconds};

use super::util::format_timestamp;

/// Renders the status report for `snapshot` as of `now`.
pub fn format_status<Tz>(snapshot: &LogSnapshot, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = Vec::new();
    match &snapshot.session {
        Some(session) => lines.push(format!(
            "Logging {} since {} ({}).",
            session.category,
            format_timestamp(session.started_at, tz),
            format_minutes_seconds((now - session.started_at).max(TimeDelta::zero()))
        )),
        None => lines.push("Not logging.".to_string()),
    }

    let logged = snapshot
        .entries
        .iter()
        .map(TimeEntry::duration)
        .fold(TimeDelta::zero(), |acc, d| acc + d);
    lines.push(format!(
        "Entries: {} ({} logged)",
        snapshot.entries.len(),
        format_hours_minutes(logged)
    ));
    lines.join("\n")
}

pub fn run<W: Write>(writer: &mut W, manager: &LogManager, now: DateTime<Utc>) -> Result<()> {
    writeln!(writer, "{}", format_status(&manager.snapshot(), now, &Local))?;
    Ok(())
}
