//! Chart file routes
//!
//! - `POST /routes/csv/update`: replace the chart file from Spotify or from submitted rows
//! - `GET /routes/csv/top`: read the leading rows of the chart with summary metrics

use std::path::{Path, PathBuf};

use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use topsongs_common::config::non_blank;
use topsongs_common::schema::{self, RawRow};
use topsongs_common::{spotify, ChartRow, CsvStore, SummaryMetrics};
use tracing::{info, warn};

use super::method_not_allowed;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Update payload, discriminated by `source`
#[derive(Debug, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum UpdateRequest {
    Spotify {
        /// `None` only when absent; an explicit `null` is kept for validation
        #[serde(default, deserialize_with = "present_value")]
        limit: Option<Value>,
        #[serde(default)]
        csv_path: Option<String>,
        #[serde(default)]
        env_path: Option<String>,
    },
    Rows {
        #[serde(default)]
        rows: Option<Value>,
        #[serde(default)]
        csv_path: Option<String>,
    },
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub status: String,
    pub source: String,
    pub csv_path: String,
    pub written: usize,
    pub limit_requested: usize,
    pub top_track: String,
    pub updated_at_utc: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopQuery {
    pub limit: Option<String>,
    pub csv_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TopResponse {
    pub status: String,
    pub csv_path: String,
    pub rows: Vec<ChartRow>,
    pub summary: SummaryMetrics,
}

/// Build chart file routes
pub fn csv_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/routes/csv/update",
            post(update_csv).fallback(method_not_allowed),
        )
        .route("/routes/csv/top", get(top_chart).fallback(method_not_allowed))
}

/// POST /routes/csv/update
///
/// The body is read raw so that malformed JSON is reported in the API's own
/// error format. The chart file is only written once the new rows are fully
/// validated; a failed request leaves it untouched.
pub async fn update_csv(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<UpdateResponse>> {
    let request = parse_update_request(&body)?;

    let (source, csv_path, limit_requested, rows) = match request {
        UpdateRequest::Spotify {
            limit,
            csv_path,
            env_path,
        } => {
            let limit = match limit {
                Some(value) => schema::parse_limit_value(&value, "limit")?,
                None => state.default_limit,
            };
            let env_path = resolve_path(env_path.as_deref(), &state.env_path);

            let rows = spotify::fetch_top_songs(&state.spotify, &env_path, limit)
                .await
                .map_err(|e| {
                    warn!(error = %e, "Spotify fetch failed");
                    ApiError::Upstream(e.to_string())
                })?;
            ("spotify", csv_path, limit as usize, rows)
        }
        UpdateRequest::Rows { rows, csv_path } => {
            let raw_rows = rows_from_payload(rows)?;
            let submitted = raw_rows.len();
            ("rows", csv_path, submitted, schema::normalize_rows(&raw_rows))
        }
    };

    let csv_path = resolve_path(csv_path.as_deref(), &state.csv_path);
    let store = CsvStore::new(csv_path.clone());
    let written = tokio::task::spawn_blocking(move || store.save(&rows))
        .await
        .map_err(|e| ApiError::Internal(format!("CSV write task failed: {e}")))??;

    let top_track = written
        .first()
        .map(|row| row.track.clone())
        .unwrap_or_default();

    info!(
        source,
        csv_path = %csv_path.display(),
        written = written.len(),
        top_track = %top_track,
        "Chart CSV updated"
    );

    Ok(Json(UpdateResponse {
        status: "ok".to_string(),
        source: source.to_string(),
        csv_path: csv_path.display().to_string(),
        written: written.len(),
        limit_requested,
        top_track,
        updated_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}

/// GET /routes/csv/top?limit=N&csv_path=P
pub async fn top_chart(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> ApiResult<Json<TopResponse>> {
    let limit = match non_blank(query.limit.as_deref()) {
        Some(raw) => schema::parse_limit_str(&raw, "limit")?,
        None => state.default_limit,
    };
    let csv_path = resolve_path(query.csv_path.as_deref(), &state.csv_path);

    let store = CsvStore::new(csv_path.clone());
    let rows = tokio::task::spawn_blocking(move || store.load_top(limit))
        .await
        .map_err(|e| ApiError::Internal(format!("CSV read task failed: {e}")))??;
    let summary = SummaryMetrics::from_rows(&rows);

    Ok(Json(TopResponse {
        status: "ok".to_string(),
        csv_path: csv_path.display().to_string(),
        rows,
        summary,
    }))
}

/// Decode the update body, reporting shape problems as `BadRequest`
fn parse_update_request(body: &[u8]) -> ApiResult<UpdateRequest> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Request body must be valid JSON: {e}")))?;

    let Value::Object(fields) = &value else {
        return Err(ApiError::BadRequest(
            "Request body must be a JSON object.".to_string(),
        ));
    };

    match fields.get("source") {
        None | Some(Value::Null) => {
            return Err(ApiError::BadRequest("Field 'source' is required.".to_string()))
        }
        Some(Value::String(source)) if source == "spotify" || source == "rows" => {}
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "Unsupported source {other}. Expected \"spotify\" or \"rows\"."
            )))
        }
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))
}

/// Check the submitted rows, stopping at the first row missing a column
fn rows_from_payload(rows: Option<Value>) -> ApiResult<Vec<RawRow>> {
    let items = match rows {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => {
            return Err(ApiError::Validation(
                "Field 'rows' must be a non-empty array.".to_string(),
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let Value::Object(fields) = item else {
                return Err(ApiError::Validation(format!(
                    "Row {} must be a JSON object.",
                    index + 1
                )));
            };
            let raw = schema::raw_row_from_json(fields);
            schema::validate_row(&raw)
                .map_err(|e| ApiError::Validation(format!("Row {}: {}", index + 1, e)))?;
            Ok(raw)
        })
        .collect()
}

/// Requested path, or the server default when absent or blank
fn resolve_path(requested: Option<&str>, default: &Path) -> PathBuf {
    non_blank(requested)
        .map(PathBuf::from)
        .unwrap_or_else(|| default.to_path_buf())
}
