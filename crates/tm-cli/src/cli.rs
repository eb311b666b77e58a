//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use tm_llm::InsightKind;

/// Time Machine: a personal time logger.
///
/// Logs how long you spend in each category of activity, keeps the log
/// mirrored to a remote service, and asks an AI service what your habits add
/// up to.
#[derive(Debug, Parser)]
#[command(name = "tm", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start logging a category.
    Start {
        /// Category to log (defaults to the configured default category).
        category: Option<String>,
    },

    /// Stop logging and record the entry.
    Stop,

    /// Show the current logging session.
    Status,

    /// List logged entries, newest first.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete entries by position (as shown by `tm list`) or by ID.
    Delete {
        /// Entry ID to delete. May be repeated.
        #[arg(long = "id", value_name = "ID")]
        ids: Vec<String>,

        /// Positions to delete, starting at 1.
        positions: Vec<usize>,
    },

    /// Change the category or times of an entry.
    Edit {
        /// Entry ID.
        id: String,

        /// New category.
        #[arg(long)]
        category: Option<String>,

        /// New start time (ISO 8601 or relative like "2 hours ago").
        #[arg(long)]
        start: Option<String>,

        /// New end time (ISO 8601 or relative like "30 minutes ago").
        #[arg(long)]
        end: Option<String>,
    },

    /// Show total time per category.
    Totals {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Replace the local log with the server copy.
    Refresh,

    /// Ask the AI service about your habits.
    Insights {
        /// Insight kind: tips, scenarios or timeline.
        kind: InsightKind,

        /// Print the last generated insight instead of asking again.
        #[arg(long)]
        cached: bool,
    },
}
