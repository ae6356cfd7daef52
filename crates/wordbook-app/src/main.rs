use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use wordbook_config::EngineConfig;
use wordbook_core::Tier;
use wordbook_engine::DictionaryEngine;
use wordbook_store::ingest::RawEntry;
use wordbook_store::{SqliteWordStore, WordStore};

pub mod controller;
pub mod events;
pub mod io;

#[cfg(test)]
mod tests;

use self::controller::AppController;

#[derive(Debug, Parser)]
#[command(name = "wordbook", about = "Tiered local dictionary lookup engine")]
struct Args {
    /// SQLite database path (overrides WORDBOOK_DB_PATH)
    #[arg(long)]
    db: Option<String>,

    /// JSON file holding the curated hot-tier batch
    #[arg(long)]
    hot_tier: Option<PathBuf>,

    /// JSON file ingested as the extended (tier 2) vocabulary
    #[arg(long)]
    extended: Option<PathBuf>,

    /// JSON file ingested as the full (tier 3) corpus
    #[arg(long)]
    full: Option<PathBuf>,

    /// Untiered JSON dump, partitioned by the hot-tier qualification rule
    #[arg(long)]
    auto: Option<PathBuf>,

    /// Wipe the stored corpus before ingesting
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(atty::is(atty::Stream::Stdout))
        .init();

    let args = Args::parse();

    let mut config = EngineConfig::new();
    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }

    let store = SqliteWordStore::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open dictionary store at {}", config.db_path))?;
    if args.reset {
        store.delete_all().await?;
        tracing::info!("corpus reset");
    }

    let mut engine = DictionaryEngine::new(store, config);

    let controller = AppController::new();
    let provision_cancel = controller.child_token();

    tokio::select! {
        result = provision(&mut engine, &args, &provision_cancel) => result?,
        _ = signal::ctrl_c() => {
            provision_cancel.cancel();
            tracing::info!("Shutdown requested during provisioning");
            return Ok(());
        }
    }

    let mut tasks = controller.spawn_tasks(engine);

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
            controller.shutdown();
        }
        result = tasks.join_next() => {
            match result {
                Some(Ok(Ok(()))) => tracing::info!("task exited"),
                Some(Ok(Err(e))) => tracing::error!("task failed: {e}"),
                Some(Err(e)) => tracing::error!("task panicked: {e}"),
                None => {}
            }
            controller.shutdown();
        }
    }

    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task failed: {e}"),
            Err(e) => tracing::error!("task panicked: {e}"),
        }
    }

    Ok(())
}

/// Load whichever corpus files were passed on the command line
async fn provision(
    engine: &mut DictionaryEngine<SqliteWordStore>,
    args: &Args,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    if let Some(path) = &args.hot_tier {
        let records = read_records(path)?;
        let loaded = engine.load_hot_tier(&records, cancel).await?;
        tracing::info!("hot tier: {} words from {}", loaded, path.display());
    }

    if let Some(path) = &args.extended {
        let records = read_records(path)?;
        let report = engine.ingest(Tier::Extended, &records, cancel).await?;
        tracing::info!("extended tier: {} written from {}", report.written, path.display());
    }

    if let Some(path) = &args.full {
        let records = read_records(path)?;
        let report = engine.ingest(Tier::Full, &records, cancel).await?;
        tracing::info!("full tier: {} written from {}", report.written, path.display());
    }

    if let Some(path) = &args.auto {
        let records = read_records(path)?;
        let (hot, report) = engine.ingest_auto(&records, cancel).await?;
        tracing::info!(
            "auto-partitioned {}: {} hot, {} cold written",
            path.display(),
            hot,
            report.written
        );
    }

    Ok(())
}

fn read_records(path: &Path) -> anyhow::Result<Vec<RawEntry>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<RawEntry> = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(records)
}
