//! Refresh job: Spotify playlist -> chart CSV

use std::fmt;
use std::path::PathBuf;

use topsongs_common::config::ChartConfig;
use topsongs_common::spotify::{self, SpotifyEndpoints};
use topsongs_common::{CsvStore, Result};
use tracing::info;

/// Outcome of one refresh run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub rows: usize,
    pub csv_path: PathBuf,
    pub top_track: String,
}

impl fmt::Display for RefreshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Updated {} rows in {} (top track: {})",
            self.rows,
            self.csv_path.display(),
            self.top_track
        )
    }
}

/// Fetch `config.limit` rows from Spotify and overwrite the chart CSV
///
/// Nothing is written unless the fetch succeeds.
pub async fn run_refresh(config: &ChartConfig, endpoints: &SpotifyEndpoints) -> Result<RefreshReport> {
    let rows = spotify::fetch_top_songs(endpoints, &config.env_path, config.limit).await?;
    let written = CsvStore::new(&config.csv_path).save(&rows)?;

    let report = RefreshReport {
        rows: written.len(),
        csv_path: config.csv_path.clone(),
        top_track: written
            .first()
            .map(|row| row.track.clone())
            .unwrap_or_default(),
    };
    info!(
        rows = report.rows,
        csv_path = %report.csv_path.display(),
        top_track = %report.top_track,
        "Chart refreshed from Spotify"
    );
    Ok(report)
}
