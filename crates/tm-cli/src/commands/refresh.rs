//! Refresh command for pulling the server copy of the log.

use std::io::Write;

use anyhow::{Context, Result};

use tm_core::{LogManager, RefreshError};

pub async fn run<W: Write>(writer: &mut W, manager: &LogManager) -> Result<()> {
    match manager.refresh().await {
        Ok(count) => writeln!(writer, "Pulled {count} entries from the server.")?,
        Err(RefreshError::Offline) => {
            anyhow::bail!("remote sync is not configured: set email and api_key")
        }
        Err(err) => return Err(err).context("refresh failed; local log kept"),
    }
    Ok(())
}
