//! Main application entry point (CLI binary).
//!
//! Operator tooling around a spill store:
//! - `list` prints pending artifacts
//! - `replay` runs one restore pass into a database
//!
//! The store is configured from `SPILLWAY_*` variables (`SPILLWAY_TYPE`,
//! `SPILLWAY_FS_DIR`, `SPILLWAY_S3_BUCKET`, ...), so S3 spills are reachable
//! the same way as local ones. `--dir` selects a local directory instead.
//!
//! All core functionality is implemented in the library crate.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::FutureExt;

use spillway::config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_DATABASE_URL};
use spillway::initialization::init_logger_with;
use spillway::spill::options::{KEY_FS_DIR, KEY_TYPE};
use spillway::spill::{naming, ReplayCallback};
use spillway::storage::{pool, save_queue, Batch};
use spillway::{
    default_callback, AdapterKind, AdapterOptions, DataAdapter, Dumper, DumperConfig, LogFormat, LogLevel,
};

/// Inspect and replay spilled batches.
#[derive(Debug, Parser)]
#[command(name = "spillway", version, about = "Inspect and replay spilled batches.")]
struct Cli {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every pending artifact
    List {
        /// Local spill directory; overrides the configured store
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Replay every pending artifact into the database once
    Replay {
        /// Local spill directory; overrides the configured store
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Database URL (sqlite:<path>)
        #[arg(long, env = "SPILLWAY_DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database: String,

        /// Connect timeout in seconds
        #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs())]
        connect_timeout_secs: u64,
    },
}

/// Applies `--dir` on top of the environment-derived options.
fn spill_options(base: AdapterOptions, dir: Option<&Path>) -> AdapterOptions {
    match dir {
        Some(dir) => base
            .with(KEY_TYPE, AdapterKind::Fs.to_string())
            .with(KEY_FS_DIR, dir.to_string_lossy()),
        None => base,
    }
}

async fn open_dumper(dir: Option<&Path>) -> Result<Dumper> {
    let options = spill_options(AdapterOptions::from_env(), dir);
    let kind = options.kind().context("Invalid spill store configuration")?;
    Dumper::from_options(&options, DumperConfig::default(), default_callback())
        .await
        .with_context(|| format!("Failed to open {kind} spill store"))
}

async fn list(dir: Option<PathBuf>) -> Result<bool> {
    let dumper = open_dumper(dir.as_deref()).await?;
    let names = dumper
        .adapter()
        .list()
        .await
        .context("Failed to list spilled artifacts")?;

    for name in &names {
        let table = naming::table_of(name).unwrap_or("?");
        println!("{table}\t{name}");
    }
    log::info!(
        "{} pending artifacts in {} spill store",
        names.len(),
        dumper.adapter().kind()
    );
    Ok(true)
}

async fn replay(dir: Option<PathBuf>, database: String, connect_timeout: Duration) -> Result<bool> {
    let dumper = open_dumper(dir.as_deref()).await?;
    let pool = Arc::new(
        pool::connect(&database, 1, connect_timeout)
            .await
            .with_context(|| format!("Failed to connect to {database}"))?,
    );

    let target = pool.clone();
    let callback: ReplayCallback = Arc::new(move |table: String, batch: Batch| {
        let pool = target.clone();
        async move {
            save_queue(&pool, &table, &batch).await?;
            Ok(())
        }
        .boxed()
    });

    let report = dumper.restore_once(&callback).await;
    pool::close(&pool).await;
    let report = report.context("Failed to list spilled artifacts")?;

    println!(
        "Replayed {} artifact{} ({} rows), {} failed",
        report.replayed.len(),
        if report.replayed.len() == 1 { "" } else { "s" },
        report.rows(),
        report.failures.len()
    );
    for failure in &report.failures {
        eprintln!("  {}: {}", failure.name, failure.error);
    }
    Ok(report.failures.is_empty())
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logger_with(cli.log_level.into(), cli.log_format).context("Failed to initialize logger")?;

    let outcome = match cli.command {
        Command::List { dir } => list(dir).await,
        Command::Replay {
            dir,
            database,
            connect_timeout_secs,
        } => replay(dir, database, Duration::from_secs(connect_timeout_secs)).await,
    };

    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("spillway error: {:#}", e);
            process::exit(1);
        }
    }
}
