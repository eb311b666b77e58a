//! Totals command for per-category time.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use tm_core::{BucketTotal, CategoryTotals, LogManager, format_hours_minutes};

/// Format totals for human-readable output.
pub fn format_totals(totals: &CategoryTotals) -> String {
    let mut output = String::new();
    for bucket in totals.buckets() {
        writeln!(
            output,
            "{:<14}  {:>8}  {}",
            bucket.name,
            format_hours_minutes(bucket.total),
            entry_count(bucket.entries)
        )
        .unwrap();
    }
    writeln!(
        output,
        "{:<14}  {:>8}  {}",
        "Total",
        format_hours_minutes(totals.overall()),
        entry_count(totals.entry_count())
    )
    .unwrap();
    output
}

fn entry_count(n: usize) -> String {
    if n == 1 {
        "1 entry".to_string()
    } else {
        format!("{n} entries")
    }
}

/// JSON output structure.
#[derive(Debug, Serialize)]
pub struct JsonTotals<'a> {
    pub buckets: &'a [BucketTotal],
    pub total_seconds: i64,
    pub entries: usize,
}

/// Format totals as JSON.
pub fn format_totals_json(totals: &CategoryTotals) -> Result<String> {
    let json = JsonTotals {
        buckets: totals.buckets(),
        total_seconds: totals.overall().num_seconds(),
        entries: totals.entry_count(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

pub fn run<W: Write>(writer: &mut W, manager: &LogManager, json: bool) -> Result<()> {
    let totals = manager.totals();
    if json {
        writeln!(writer, "{}", format_totals_json(&totals)?)?;
    } else {
        write!(writer, "{}", format_totals(&totals))?;
    }
    Ok(())
}
