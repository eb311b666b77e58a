use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tm_cli::commands::{delete, edit, insights, list, refresh, start, status, stop, totals};
use tm_cli::{Cli, Commands, Config};
use tm_core::{Aggregator, LogManager, RefreshError, RemoteTarget};
use tm_remote::HttpRemoteLog;
use tm_store::{InsightCache, JsonFileStore};

/// Opens the log manager over the configured files, with remote sync when
/// credentials are present.
fn open_manager(config: &Config) -> Result<LogManager> {
    let store = JsonFileStore::new(config.log_path.clone(), config.session_path.clone());
    let mut builder = LogManager::builder(Arc::new(store))
        .aggregator(Aggregator::new(config.categories.iter().cloned()));

    match config.identity() {
        Some(identity) => {
            let client = HttpRemoteLog::new(&config.server_url).context("invalid server_url")?;
            builder = builder.remote(RemoteTarget::new(Arc::new(client), identity));
        }
        None => tracing::debug!("no remote identity configured; running offline"),
    }

    Ok(builder.open())
}

/// Pulls the server copy before a command runs; failures leave the local log.
async fn sync_on_start(manager: &LogManager) {
    match manager.refresh().await {
        Ok(count) => tracing::debug!(entries = count, "synced log on start"),
        Err(RefreshError::Offline) => {}
        Err(err) => tracing::warn!(error = %err, "sync on start failed; using local log"),
    }
}

async fn dispatch(command: &Commands, config: &Config, manager: &LogManager) -> Result<()> {
    let mut out = std::io::stdout();
    match command {
        Commands::Start { category } => {
            start::run(&mut out, manager, category.as_deref(), &config.default_category)?;
        }
        Commands::Stop => stop::run(&mut out, manager)?,
        Commands::Status => status::run(&mut out, manager, Utc::now())?,
        Commands::List { json } => list::run(&mut out, manager, *json)?,
        Commands::Delete { ids, positions } => delete::run(&mut out, manager, ids, positions)?,
        Commands::Edit {
            id,
            category,
            start,
            end,
        } => {
            let args = edit::EditArgs {
                category: category.as_deref(),
                start: start.as_deref(),
                end: end.as_deref(),
            };
            edit::run(&mut out, manager, id, &args, Utc::now())?;
        }
        Commands::Totals { json } => totals::run(&mut out, manager, *json)?,
        Commands::Refresh => refresh::run(&mut out, manager).await?,
        Commands::Insights { kind, cached } => {
            let cache = InsightCache::new(config.insights_path.clone());
            if *cached {
                insights::show_cached(&mut out, &cache, *kind)?;
            } else {
                let client =
                    tm_llm::Client::new(&config.insight_url).context("invalid insight_url")?;
                insights::generate(&mut out, manager, &client, &cache, *kind, Utc::now()).await?;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let manager = open_manager(&config)?;

    // refresh and insights pull on their own
    let pulls_itself = matches!(command, Commands::Refresh | Commands::Insights { .. });
    if config.sync_on_start && !pulls_itself {
        sync_on_start(&manager).await;
    }

    let result = dispatch(command, &config, &manager).await;
    manager.flush().await;
    result
}
