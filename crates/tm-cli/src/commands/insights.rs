//! Insights command for AI commentary on the log.
//!
//! Generating refreshes the log first so the prompt reflects the server copy,
//! then stores the answer in the insight cache. `--cached` only reads the
//! cache and never contacts either service.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};

use tm_core::{LogManager, RefreshError};
use tm_llm::InsightKind;
use tm_store::{CachedInsight, InsightCache};

use super::util::format_timestamp;

const fn title(kind: InsightKind) -> &'static str {
    match kind {
        InsightKind::Tips => "Tips",
        InsightKind::Scenarios => "Scenarios",
        InsightKind::Timeline => "Timeline",
    }
}

/// Renders an insight with a header naming its kind and age.
pub fn format_insight<Tz>(kind: InsightKind, insight: &CachedInsight, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = vec![format!(
        "{} (generated {})",
        title(kind),
        format_timestamp(insight.generated_at, tz)
    )];
    if insight.lines.is_empty() {
        lines.push("(no content)".to_string());
    }
    lines.extend(insight.lines.iter().cloned());
    lines.join("\n")
}

/// Prints the cached insight of `kind`.
pub fn show_cached<W: Write>(writer: &mut W, cache: &InsightCache, kind: InsightKind) -> Result<()> {
    match cache.get(kind.as_str()).context("failed to read insight cache")? {
        Some(insight) => writeln!(writer, "{}", format_insight(kind, &insight, &Local))?,
        None => writeln!(
            writer,
            "No cached {kind} yet. Run 'tm insights {kind}' to generate them."
        )?,
    }
    Ok(())
}

/// Generates a fresh insight of `kind`, caches it, and prints it.
pub async fn generate<W: Write>(
    writer: &mut W,
    manager: &LogManager,
    client: &tm_llm::Client,
    cache: &InsightCache,
    kind: InsightKind,
    now: DateTime<Utc>,
) -> Result<()> {
    match manager.refresh().await {
        Ok(count) => tracing::debug!(entries = count, "refreshed log before generating"),
        Err(RefreshError::Offline) => tracing::debug!("offline; using local log"),
        Err(err) => tracing::warn!(error = %err, "refresh failed; using local log"),
    }

    let entries = manager.entries();
    let lines = client
        .generate(kind, &entries, &Local)
        .await
        .with_context(|| format!("failed to generate {kind}"))?;

    let insight = CachedInsight {
        generated_at: now,
        lines,
    };
    if let Err(err) = cache.put(kind.as_str(), insight.clone()) {
        tracing::warn!(error = %err, "failed to cache insight");
    }

    writeln!(writer, "{}", format_insight(kind, &insight, &Local))?;
    Ok(())
}
