//! topsongs-snapshot - copy the chart CSV into the SQLite snapshot table
//!
//! Intended to run once a day from a scheduler. Exits non-zero on failure.

use anyhow::{Context, Result};
use clap::Parser;
use topsongs_common::config::{ChartConfig, ConfigOverrides, TomlConfig};
use topsongs_jobs::{init_tracing, run_snapshot};
use tracing::info;

/// Chart snapshot job
#[derive(Parser, Debug)]
#[command(name = "topsongs-snapshot")]
#[command(about = "Replace the SQLite snapshot table with the current chart CSV")]
#[command(version)]
struct Args {
    /// Chart CSV to read
    #[arg(long, env = "SPOTIFY_CSV_PATH")]
    csv_path: Option<String>,

    /// SQLite database to write
    #[arg(long, env = "SPOTIFY_SQLITE_PATH")]
    sqlite_path: Option<String>,

    /// Destination table name
    #[arg(long, env = "SPOTIFY_DB_TABLE")]
    table: Option<String>,

    /// Number of leading chart rows to copy
    #[arg(long, env = "SPOTIFY_LIMIT")]
    limit: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let overrides = ConfigOverrides {
        csv_path: args.csv_path,
        sqlite_path: args.sqlite_path,
        table_name: args.table,
        limit: args.limit,
        ..Default::default()
    };
    let config = ChartConfig::resolve(&overrides, &TomlConfig::load())
        .context("Invalid configuration")?;

    let report = run_snapshot(&config)
        .await
        .context("Snapshot job failed")?;

    info!("{}", report);
    Ok(())
}
