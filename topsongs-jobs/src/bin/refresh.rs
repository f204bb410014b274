//! topsongs-refresh - rewrite the chart CSV from the Spotify playlist

use anyhow::{Context, Result};
use clap::Parser;
use topsongs_common::config::{ChartConfig, ConfigOverrides, TomlConfig};
use topsongs_common::spotify::SpotifyEndpoints;
use topsongs_jobs::{init_tracing, run_refresh};
use tracing::info;

/// Chart refresh job
#[derive(Parser, Debug)]
#[command(name = "topsongs-refresh")]
#[command(about = "Fetch the Spotify playlist and overwrite the chart CSV")]
#[command(version)]
struct Args {
    /// Chart CSV to overwrite
    #[arg(long, env = "SPOTIFY_CSV_PATH")]
    csv_path: Option<String>,

    /// `.env` file with Spotify credentials
    #[arg(long, env = "SPOTIFY_ENV_PATH")]
    env_path: Option<String>,

    /// Number of tracks to fetch
    #[arg(long, env = "SPOTIFY_LIMIT")]
    limit: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let overrides = ConfigOverrides {
        csv_path: args.csv_path,
        env_path: args.env_path,
        limit: args.limit,
        ..Default::default()
    };
    let config = ChartConfig::resolve(&overrides, &TomlConfig::load())
        .context("Invalid configuration")?;

    let report = run_refresh(&config, &SpotifyEndpoints::default())
        .await
        .context("Refresh job failed")?;

    info!("{}", report);
    Ok(())
}
