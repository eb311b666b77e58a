//! List command for showing the entry log, newest first.

use std::fmt::{Display, Write as _};
use std::io::Write;

use anyhow::Result;
use chrono::{Local, TimeZone};

use tm_core::{LogManager, TimeEntry, format_minutes_seconds};

use super::util::format_timestamp;

/// Format entries for human-readable output.
///
/// Positions start at 1 and match what `tm delete` accepts.
pub fn format_entries<Tz>(entries: &[TimeEntry], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut output = String::new();

    if entries.is_empty() {
        writeln!(output, "No entries logged yet.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:>3}  {:<14}  {:<16}  {:<16}  {:>9}  ID",
        "#", "Category", "Start", "End", "Duration"
    )
    .unwrap();

    for (index, entry) in entries.iter().enumerate() {
        // Truncate by characters, not bytes, to avoid panics on multi-byte UTF-8
        let category = if entry.category().chars().count() > 14 {
            format!("{}...", entry.category().chars().take(11).collect::<String>())
        } else {
            entry.category().to_string()
        };
        writeln!(
            output,
            "{:>3}  {:<14}  {:<16}  {:<16}  {:>9}  {}",
            index + 1,
            category,
            format_timestamp(entry.start(), tz),
            format_timestamp(entry.end(), tz),
            format_minutes_seconds(entry.duration()),
            entry.id()
        )
        .unwrap();
    }

    output
}

/// Format entries as JSON, in the same shape as the log file.
pub fn format_entries_json(entries: &[TimeEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

pub fn run<W: Write>(writer: &mut W, manager: &LogManager, json: bool) -> Result<()> {
    let entries = manager.entries();
    if json {
        writeln!(writer, "{}", format_entries_json(&entries)?)?;
    } else {
        write!(writer, "{}", format_entries(&entries, &Local))?;
    }
    Ok(())
}
