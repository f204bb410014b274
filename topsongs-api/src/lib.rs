//! topsongs-api library - chart update server
//!
//! Serves the health check, the CSV update route and the leaderboard read
//! route over a single chart file.

use std::path::PathBuf;

use axum::Router;
use topsongs_common::config::ChartConfig;
use topsongs_common::spotify::SpotifyEndpoints;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

/// Application state shared across HTTP handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Chart file used when a request names none
    pub csv_path: PathBuf,
    /// `.env` file holding Spotify credentials
    pub env_path: PathBuf,
    /// Row limit used when a request names none
    pub default_limit: u32,
    /// Spotify endpoints (overridden in tests)
    pub spotify: SpotifyEndpoints,
}

impl AppState {
    pub fn new(config: &ChartConfig) -> Self {
        Self {
            csv_path: config.csv_path.clone(),
            env_path: config.env_path.clone(),
            default_limit: config.limit,
            spotify: SpotifyEndpoints::default(),
        }
    }

    pub fn with_spotify_endpoints(mut self, endpoints: SpotifyEndpoints) -> Self {
        self.spotify = endpoints;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::csv_routes())
        .fallback(api::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
