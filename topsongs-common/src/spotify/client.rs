//! Spotify Web API client
//!
//! Fetches a ranked playlist and turns it into chart rows. Requests are made
//! one at a time with no retries; the only fallback is dropping the market
//! filter when a playlist is forbidden in the configured market.

use std::time::Duration;

use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::credentials::SpotifyCredentials;
use super::models::{parse_track, PlaylistPage, TokenResponse};
use crate::models::ChartRow;
use crate::{Error, Result};

pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

const USER_AGENT: &str = concat!("topsongs/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 20;
const PAGE_SIZE: u32 = 100;

/// Base URLs the client talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyEndpoints {
    pub api_base: String,
    pub token_url: String,
}

impl Default for SpotifyEndpoints {
    fn default() -> Self {
        Self {
            api_base: SPOTIFY_API_BASE.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
        }
    }
}

/// Spotify Web API client
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http_client: reqwest::Client,
    endpoints: SpotifyEndpoints,
}

impl SpotifyClient {
    pub fn new(endpoints: SpotifyEndpoints) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoints,
        })
    }

    pub fn endpoints(&self) -> &SpotifyEndpoints {
        &self.endpoints
    }

    /// Fetch up to `limit` chart rows from the configured playlist
    ///
    /// Rows are numbered 1.. in playlist order.
    pub async fn fetch_top_tracks(
        &self,
        credentials: &SpotifyCredentials,
        limit: u32,
    ) -> Result<Vec<ChartRow>> {
        if limit == 0 {
            return Err(Error::invalid_limit("The limit", "must be greater than zero."));
        }

        let token = self.resolve_access_token(credentials).await?;
        let rows = self
            .fetch_playlist_rows(&token, &credentials.playlist_id, &credentials.market, limit)
            .await?;

        if rows.is_empty() {
            return Err(Error::NoRows(
                "Spotify API returned no tracks for the selected playlist.".to_string(),
            ));
        }

        info!(
            playlist = %credentials.playlist_id,
            rows = rows.len(),
            top_track = %rows[0].track,
            "Fetched chart from Spotify"
        );
        Ok(rows)
    }

    async fn resolve_access_token(&self, credentials: &SpotifyCredentials) -> Result<String> {
        if let Some(token) = &credentials.token {
            debug!("Using pre-issued Spotify token");
            return Ok(token.clone());
        }

        match (&credentials.client_id, &credentials.client_secret) {
            (Some(id), Some(secret)) => self.create_access_token(id, secret).await,
            _ => Err(Error::Auth(
                "Spotify credentials not configured. Set SPOTIFY_TOKEN or \
                 SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET."
                    .to_string(),
            )),
        }
    }

    /// Exchange client credentials for a bearer token
    async fn create_access_token(&self, client_id: &str, client_secret: &str) -> Result<String> {
        let url = &self.endpoints.token_url;
        debug!(url = %url, "Requesting Spotify access token");

        let response = self
            .http_client
            .post(url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "token request rejected ({}): {}",
                status.as_u16(),
                extract_error_message(&text)
            )));
        }

        let token: TokenResponse = decode_json(response).await?;
        token
            .access_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::Auth("Could not obtain an access token from Spotify.".to_string())
            })
    }

    /// Fetch rows, retrying once without the market filter if it is forbidden
    async fn fetch_playlist_rows(
        &self,
        token: &str,
        playlist_id: &str,
        market: &str,
        limit: u32,
    ) -> Result<Vec<ChartRow>> {
        let market = market.trim();
        if market.is_empty() {
            return self.fetch_rows_for_market(token, playlist_id, None, limit).await;
        }

        match self
            .fetch_rows_for_market(token, playlist_id, Some(market), limit)
            .await
        {
            Err(Error::Api { status: 403, .. }) => {
                warn!(
                    playlist = %playlist_id,
                    market = %market,
                    "Playlist forbidden for market, retrying without market filter"
                );
                self.fetch_rows_for_market(token, playlist_id, None, limit)
                    .await
                    .map_err(|e| match e {
                        Error::Api {
                            status: 403,
                            method,
                            url,
                            message,
                        } => Error::Api {
                            status: 403,
                            method,
                            url,
                            message: format!(
                                "{message} | Access denied for playlist '{playlist_id}' with and \
                                 without market filter. Try another public playlist ID in \
                                 SPOTIFY_PLAYLIST_ID."
                            ),
                        },
                        other => other,
                    })
            }
            other => other,
        }
    }

    async fn fetch_rows_for_market(
        &self,
        token: &str,
        playlist_id: &str,
        market: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ChartRow>> {
        let url = self.playlist_tracks_url(playlist_id, market)?;

        let mut rows: Vec<ChartRow> = Vec::new();
        let mut next_url = Some(url.to_string());
        while let Some(url) = next_url.take() {
            let page: PlaylistPage = self.get_json(&url, token).await?;
            debug!(url = %url, items = page.items.len(), "Fetched playlist page");

            for track in page.items.iter().filter_map(parse_track) {
                let artist = track.artist_names();
                if artist.is_empty() {
                    continue;
                }
                rows.push(ChartRow {
                    position: rows.len() as i64 + 1,
                    track: track.name().to_string(),
                    artist,
                    streams: track.popularity(),
                });
                if rows.len() >= limit as usize {
                    return Ok(rows);
                }
            }

            next_url = page.next.filter(|next| !next.is_empty());
        }

        Ok(rows)
    }

    /// First page URL; path segments and query values are percent-encoded
    fn playlist_tracks_url(&self, playlist_id: &str, market: Option<&str>) -> Result<Url> {
        let api_base = &self.endpoints.api_base;
        let invalid = || Error::Config(format!("Invalid Spotify API base URL '{api_base}'"));

        let mut url = Url::parse(api_base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["playlists", playlist_id, "tracks"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &PAGE_SIZE.to_string());
            if let Some(market) = market {
                query.append_pair("market", market);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let response = check_status(response, "GET", url).await?;
        decode_json(response).await
    }
}

/// Map non-2xx responses onto `Auth` (401) or `Api`
async fn check_status(response: Response, method: &str, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = extract_error_message(&text);
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Auth(format!(
            "access token rejected or expired: {message}"
        )));
    }

    Err(Error::Api {
        status: status.as_u16(),
        method: method.to_string(),
        url: url.to_string(),
        message,
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let text = response
        .text()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| Error::Parse(e.to_string()))
}

/// Pull a human-readable message out of a Spotify error body
pub fn extract_error_message(body: &str) -> String {
    let fallback = || {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "Unknown Spotify API error.".to_string()
        } else {
            trimmed.to_string()
        }
    };

    let Ok(Value::Object(parsed)) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    if let Some(description) = parsed.get("error_description") {
        return value_text(description);
    }
    match parsed.get("error") {
        Some(Value::Object(error)) => match error.get("message") {
            Some(message) => value_text(message),
            None => fallback(),
        },
        Some(Value::String(error)) => error.clone(),
        _ => fallback(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
