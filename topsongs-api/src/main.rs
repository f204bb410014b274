//! topsongs-api - chart update server
//!
//! Serves `/health`, `POST /routes/csv/update` and `GET /routes/csv/top`
//! over the configured chart file.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use topsongs_api::{build_router, AppState};
use topsongs_common::config::{ChartConfig, ConfigOverrides, TomlConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for topsongs-api
#[derive(Parser, Debug)]
#[command(name = "topsongs-api")]
#[command(about = "Top songs chart update server")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "TOPSONGS_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "TOPSONGS_PORT")]
    port: u16,

    /// Chart CSV used when a request names none
    #[arg(long, env = "SPOTIFY_CSV_PATH")]
    csv_path: Option<String>,

    /// `.env` file with Spotify credentials
    #[arg(long, env = "SPOTIFY_ENV_PATH")]
    env_path: Option<String>,

    /// Row limit used when a request names none
    #[arg(long, env = "SPOTIFY_LIMIT")]
    limit: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,topsongs_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting topsongs-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let overrides = ConfigOverrides {
        csv_path: args.csv_path,
        env_path: args.env_path,
        limit: args.limit,
        ..Default::default()
    };
    let config = ChartConfig::resolve(&overrides, &TomlConfig::load())
        .context("Invalid configuration")?;
    info!("Chart CSV: {}", config.csv_path.display());
    info!("Credentials file: {}", config.env_path.display());
    info!("Default limit: {}", config.limit);

    let app = build_router(AppState::new(&config));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("topsongs-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
