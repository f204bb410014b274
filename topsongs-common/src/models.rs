//! Chart data models

use serde::{Deserialize, Serialize};

/// One ranked track entry of a chart snapshot
///
/// Field order matches the canonical CSV header `position,track,artist,streams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRow {
    pub position: i64,
    pub track: String,
    pub artist: String,
    /// Always >= 0 once normalized
    pub streams: i64,
}

impl ChartRow {
    pub fn new(position: i64, track: impl Into<String>, artist: impl Into<String>, streams: i64) -> Self {
        Self {
            position,
            track: track.into(),
            artist: artist.into(),
            streams,
        }
    }
}

/// Aggregate figures shown above the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_tracks: usize,
    pub total_streams: i64,
    /// Integer mean, truncated
    pub avg_streams: i64,
    pub top_track: String,
}

impl SummaryMetrics {
    /// Compute metrics over an ordered chart; `top_track` is the first row's track
    pub fn from_rows(rows: &[ChartRow]) -> Self {
        let Some(first) = rows.first() else {
            return Self {
                total_tracks: 0,
                total_streams: 0,
                avg_streams: 0,
                top_track: String::new(),
            };
        };

        // Accumulate wide; the total saturates, the mean stays exact
        let sum: i128 = rows.iter().map(|r| i128::from(r.streams)).sum();
        let mean = sum / rows.len() as i128;
        Self {
            total_tracks: rows.len(),
            total_streams: i64::try_from(sum).unwrap_or(i64::MAX),
            avg_streams: i64::try_from(mean).unwrap_or(i64::MAX),
            top_track: first.track.clone(),
        }
    }
}
