//! Spotify playlist adapter
//!
//! Turns a ranked Spotify playlist (the regional "Top 50" by default) into
//! chart rows. `streams` carries the track's popularity score, the closest
//! figure the public API exposes.

mod client;
mod credentials;
mod models;

use std::path::Path;

pub use client::{
    extract_error_message, SpotifyClient, SpotifyEndpoints, SPOTIFY_API_BASE, SPOTIFY_TOKEN_URL,
};
pub use credentials::{
    clean_env_value, SpotifyCredentials, CLIENT_ID_KEY, CLIENT_SECRET_KEY, DEFAULT_MARKET,
    DEFAULT_PLAYLIST_ID, MARKET_KEY, PLAYLIST_ID_KEY, TOKEN_KEY,
};
pub use models::{parse_track, PlaylistPage, Track};

use crate::models::ChartRow;
use crate::Result;

/// Resolve credentials from `env_path` plus the environment and fetch `limit` rows
pub async fn fetch_top_songs(
    endpoints: &SpotifyEndpoints,
    env_path: &Path,
    limit: u32,
) -> Result<Vec<ChartRow>> {
    let credentials = SpotifyCredentials::load(env_path)?;
    let client = SpotifyClient::new(endpoints.clone())?;
    client.fetch_top_tracks(&credentials, limit).await
}
