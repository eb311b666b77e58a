//! Edit command for changing an entry's category or times.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use tm_core::{EntryId, LogManager, format_minutes_seconds};

use super::util::parse_datetime;

/// Requested changes; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct EditArgs<'a> {
    pub category: Option<&'a str>,
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
}

pub fn run<W: Write>(
    writer: &mut W,
    manager: &LogManager,
    id: &str,
    args: &EditArgs<'_>,
    now: DateTime<Utc>,
) -> Result<()> {
    let id: EntryId = id.parse().with_context(|| format!("bad entry ID {id:?}"))?;
    let Some(current) = manager.entries().iter().find(|e| e.id() == id).cloned() else {
        anyhow::bail!("no entry with ID {id}");
    };

    let category = match args.category.map(str::trim) {
        Some("") => anyhow::bail!("category cannot be empty"),
        Some(category) => category.to_string(),
        None => current.category().to_string(),
    };
    let start = args
        .start
        .map(|s| parse_datetime(s, now))
        .transpose()?
        .unwrap_or_else(|| current.start());
    let end = args
        .end
        .map(|s| parse_datetime(s, now))
        .transpose()?
        .unwrap_or_else(|| current.end());

    if !manager.edit_entry(id, category, start, end)? {
        anyhow::bail!("entry {id} was removed before it could be edited");
    }

    if let Some(updated) = manager.entries().iter().find(|e| e.id() == id) {
        writeln!(
            writer,
            "Updated {}: {} ({}).",
            id,
            updated.category(),
            format_minutes_seconds(updated.duration())
        )?;
    }
    Ok(())
}
