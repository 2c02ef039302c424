// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Taskloom - a team task bot with a spreadsheet mirror.
//!
//! This is the binary entry point. `serve` runs the bot, the mirror sync
//! worker and the archive scheduler together; `sync` and `archive` run one
//! pass of their respective jobs and exit, for cron or manual use.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use taskloom_bot::{BotContext, MemoryDialogs, StaticAccessPolicy};
use taskloom_config::TaskloomConfig;
use taskloom_core::SheetStore;
use taskloom_sheets::GoogleSheets;
use taskloom_storage::Database;
use taskloom_sync::SyncWorker;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Taskloom - a team task bot with a spreadsheet mirror.
#[derive(Parser, Debug)]
#[command(name = "taskloom", version, about, long_about = None)]
struct Cli {
    /// Path to a config file, bypassing the XDG lookup.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot, the mirror sync worker and the archive scheduler.
    Serve,
    /// Run one mirror drain cycle and exit.
    Sync,
    /// Run one archive sweep and exit.
    Archive,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => taskloom_config::load_and_validate_from(path),
        None => taskloom_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("taskloom: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve(config).await,
        Some(Commands::Sync) => sync_once(config).await,
        Some(Commands::Archive) => archive_once(config).await,
        None => {
            println!("taskloom: use --help for available commands");
            return;
        }
    };

    if let Err(e) = result {
        error!(error = %e, "fatal");
        std::process::exit(1);
    }
}

async fn serve(config: TaskloomConfig) -> Result<(), taskloom_core::TaskloomError> {
    let Some(token) = config.bot.token.clone() else {
        return Err(taskloom_core::TaskloomError::Config(
            "bot.token is required for serve".into(),
        ));
    };

    let db = Database::open(&config.storage.database_path).await?;
    info!(path = %config.storage.database_path, "database opened");

    if let Some(sheets) = mirror_store(&config)? {
        let worker = SyncWorker::new(
            db.clone(),
            sheets,
            Duration::from_secs(config.mirror.sync_interval_secs),
            config.mirror.batch_limit,
        );
        tokio::spawn(async move { worker.run().await });
    } else {
        warn!("mirror disabled, outbox events will queue until it is enabled");
    }

    {
        let db = db.clone();
        let cron = config.archive.cron.clone();
        tokio::spawn(async move {
            if let Err(e) = taskloom_sync::sweep::run_schedule(&db, &cron).await {
                error!(error = %e, "archive scheduler stopped");
            }
        });
    }

    let ctx = Arc::new(BotContext {
        db,
        dialogs: Arc::new(MemoryDialogs::new()),
        access: Arc::new(StaticAccessPolicy::from_config(&config.bot)),
    });
    taskloom_bot::run(&token, ctx).await;
    Ok(())
}

async fn sync_once(config: TaskloomConfig) -> Result<(), taskloom_core::TaskloomError> {
    let Some(sheets) = mirror_store(&config)? else {
        return Err(taskloom_core::TaskloomError::Config(
            "mirror.enabled must be true for sync".into(),
        ));
    };
    let db = Database::open(&config.storage.database_path).await?;
    let worker = SyncWorker::new(
        db.clone(),
        sheets,
        Duration::from_secs(config.mirror.sync_interval_secs),
        config.mirror.batch_limit,
    );
    let report = worker.drain().await?;
    info!(
        processed = report.processed,
        failed = report.failed,
        "drain finished"
    );
    db.close().await?;
    Ok(())
}

async fn archive_once(config: TaskloomConfig) -> Result<(), taskloom_core::TaskloomError> {
    let db = Database::open(&config.storage.database_path).await?;
    let report = taskloom_sync::sweep::run_once(&db).await?;
    info!(
        personal = report.personal,
        common = report.common,
        "archive sweep finished"
    );
    db.close().await?;
    Ok(())
}

/// Builds the Google Sheets client when the mirror is enabled.
/// Validation guarantees the id and token are present when it is.
fn mirror_store(
    config: &TaskloomConfig,
) -> Result<Option<Arc<dyn SheetStore>>, taskloom_core::TaskloomError> {
    if !config.mirror.enabled {
        return Ok(None);
    }
    let spreadsheet_id = config
        .mirror
        .spreadsheet_id
        .clone()
        .ok_or_else(|| taskloom_core::TaskloomError::Config("mirror.spreadsheet_id missing".into()))?;
    let api_token = config
        .mirror
        .api_token
        .clone()
        .ok_or_else(|| taskloom_core::TaskloomError::Config("mirror.api_token missing".into()))?;
    let sheets = GoogleSheets::new(api_token, spreadsheet_id)?;
    Ok(Some(Arc::new(sheets)))
}
