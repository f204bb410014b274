//! Spotify Web API payloads
//!
//! Only the fields the chart needs are modelled. Item-level parsing is
//! lenient: an item that does not fit is skipped, not fatal.

use serde::Deserialize;
use serde_json::Value;

/// Client-credentials token response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// One page of `GET /playlists/{id}/tracks`
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistPage {
    pub items: Vec<Value>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Option<Value>,
    #[serde(default)]
    pub popularity: Option<Value>,
}

impl Track {
    pub fn name(&self) -> &str {
        self.name.as_deref().map(str::trim).unwrap_or("")
    }

    /// Non-blank artist names joined with ", "
    pub fn artist_names(&self) -> String {
        self.artists
            .as_ref()
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|artist| artist.get("name")?.as_str())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Popularity clamped to >= 0; absent or non-numeric counts as 0
    pub fn popularity(&self) -> i64 {
        let value = match &self.popularity {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        };
        value.max(0)
    }
}

/// Parse one playlist item into its track, if it has a usable one
pub fn parse_track(item: &Value) -> Option<Track> {
    if !item.is_object() {
        return None;
    }
    let item: PlaylistItem = serde_json::from_value(item.clone()).ok()?;
    let track = item.track?;
    if track.name().is_empty() {
        return None;
    }
    Some(track)
}
