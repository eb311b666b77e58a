//! Stop command for closing the logging session into an entry.

use std::io::Write;

use anyhow::Result;

use tm_core::{LogManager, format_minutes_seconds};

pub fn run<W: Write>(writer: &mut W, manager: &LogManager) -> Result<()> {
    match manager.stop_logging() {
        Some(entry) => writeln!(
            writer,
            "Logged {} for {}.",
            entry.category(),
            format_minutes_seconds(entry.duration())
        )?,
        None => writeln!(writer, "Not logging anything.")?,
    }
    Ok(())
}
