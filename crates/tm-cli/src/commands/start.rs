//! Start command for opening a logging session.

use std::io::Write;

use anyhow::Result;
use chrono::Local;

use tm_core::LogManager;

use super::util::format_timestamp;

/// Starts logging `category`, or `default_category` when none is given.
pub fn run<W: Write>(
    writer: &mut W,
    manager: &LogManager,
    category: Option<&str>,
    default_category: &str,
) -> Result<()> {
    let category = category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(default_category);

    if manager.start_logging(category) {
        writeln!(writer, "Started logging {category}.")?;
    } else if let Some(session) = manager.session() {
        writeln!(
            writer,
            "Already logging {} since {}. Run 'tm stop' first.",
            session.category,
            format_timestamp(session.started_at, &Local)
        )?;
    }
    Ok(())
}
