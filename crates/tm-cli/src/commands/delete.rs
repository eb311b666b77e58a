//! Delete command for removing entries by position or ID.

use std::io::Write;

use anyhow::{Context, Result};

use tm_core::{EntryId, LogManager};

/// Deletes the entries at 1-based `positions`, then the entries with `ids`.
///
/// Positions refer to the log as it was before this command ran.
pub fn run<W: Write>(
    writer: &mut W,
    manager: &LogManager,
    ids: &[String],
    positions: &[usize],
) -> Result<()> {
    let ids = ids
        .iter()
        .map(|raw| raw.parse::<EntryId>().with_context(|| format!("bad entry ID {raw:?}")))
        .collect::<Result<Vec<_>>>()?;
    if positions.contains(&0) {
        anyhow::bail!("positions start at 1 (see 'tm list')");
    }
    if ids.is_empty() && positions.is_empty() {
        anyhow::bail!("nothing to delete: pass positions or --id");
    }

    let mut removed = 0;
    if !positions.is_empty() {
        let indices: Vec<usize> = positions.iter().map(|p| p - 1).collect();
        removed += manager.delete_at(&indices);
    }
    if !ids.is_empty() {
        removed += manager.delete_ids(&ids);
    }

    match removed {
        0 => writeln!(writer, "No matching entries.")?,
        1 => writeln!(writer, "Deleted 1 entry.")?,
        n => writeln!(writer, "Deleted {n} entries.")?,
    }
    Ok(())
}
