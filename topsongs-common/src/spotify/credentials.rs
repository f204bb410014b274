//! Spotify credential resolution
//!
//! Each key is taken from the process environment when set to a non-blank
//! value, otherwise from the `.env` file. A missing `.env` file simply
//! contributes nothing.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::Result;

pub const DEFAULT_PLAYLIST_ID: &str = "37i9dQZEVXbMXbN3EUUhlg";
pub const DEFAULT_MARKET: &str = "BR";

pub const TOKEN_KEY: &str = "SPOTIFY_TOKEN";
pub const CLIENT_ID_KEY: &str = "SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_KEY: &str = "SPOTIFY_CLIENT_SECRET";
pub const PLAYLIST_ID_KEY: &str = "SPOTIFY_PLAYLIST_ID";
pub const MARKET_KEY: &str = "SPOTIFY_MARKET";

const KEYS: [&str; 5] = [
    TOKEN_KEY,
    CLIENT_ID_KEY,
    CLIENT_SECRET_KEY,
    PLAYLIST_ID_KEY,
    MARKET_KEY,
];

/// Resolved Spotify settings
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SpotifyCredentials {
    /// Pre-issued bearer token; takes precedence over client credentials
    pub token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub playlist_id: String,
    pub market: String,
}

impl fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("SpotifyCredentials")
            .field("token", &redact(&self.token))
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("playlist_id", &self.playlist_id)
            .field("market", &self.market)
            .finish()
    }
}

impl SpotifyCredentials {
    /// Resolve from the process environment and the `.env` file at `env_path`
    pub fn load(env_path: &Path) -> Result<Self> {
        let file_values = read_env_file(env_path)?;
        Ok(Self::from_sources(
            |key| std::env::var(key).ok(),
            &file_values,
        ))
    }

    /// Resolve from an environment lookup and already-parsed file values
    pub fn from_sources(
        env: impl Fn(&str) -> Option<String>,
        file_values: &HashMap<String, String>,
    ) -> Self {
        let mut resolved: HashMap<&str, String> = HashMap::new();
        for key in KEYS {
            let from_env = env(key).filter(|v| !v.trim().is_empty());
            let value = match from_env {
                Some(raw) => Some(clean_env_value(&raw)),
                None => file_values.get(key).cloned(),
            };
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                resolved.insert(key, value.trim().to_string());
            }
        }

        Self {
            token: resolved.remove(TOKEN_KEY),
            client_id: resolved.remove(CLIENT_ID_KEY),
            client_secret: resolved.remove(CLIENT_SECRET_KEY),
            playlist_id: resolved
                .remove(PLAYLIST_ID_KEY)
                .unwrap_or_else(|| DEFAULT_PLAYLIST_ID.to_string()),
            market: resolved
                .remove(MARKET_KEY)
                .unwrap_or_else(|| DEFAULT_MARKET.to_string()),
        }
    }
}

/// Trim, drop one trailing `;`, then drop one pair of matching surrounding quotes
pub fn clean_env_value(value: &str) -> String {
    let mut cleaned = value.trim();
    if let Some(stripped) = cleaned.strip_suffix(';') {
        cleaned = stripped.trim_end();
    }

    let bytes = cleaned.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' || first == b'"') && first == last {
            cleaned = &cleaned[1..cleaned.len() - 1];
        }
    }
    cleaned.trim().to_string()
}

/// Parse a `.env` file into cleaned key/value pairs; unparseable lines are skipped
fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        debug!(path = %path.display(), "No .env file, using process environment only");
        return Ok(HashMap::new());
    }

    let mut values = HashMap::new();
    let iter = dotenvy::from_path_iter(path).map_err(|e| {
        crate::Error::Config(format!("Could not read {}: {}", path.display(), e))
    })?;
    for item in iter {
        match item {
            Ok((key, value)) => {
                values.insert(key.trim().to_string(), clean_env_value(&value));
            }
            Err(e) => warn!("Skipping line in {}: {}", path.display(), e),
        }
    }
    Ok(values)
}
