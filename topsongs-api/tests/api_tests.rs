//! Integration tests for topsongs-api endpoints
//!
//! Tests cover:
//! - Health endpoint, independent of chart state
//! - Update route, `rows` source: success, validation failures, file untouched on failure
//! - Update route, `spotify` source against a local stand-in API
//! - Leaderboard read route
//! - JSON errors for malformed bodies, wrong methods and unknown routes

use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use serial_test::serial;
use tempfile::TempDir;
use topsongs_api::{build_router, AppState};
use topsongs_common::config::ChartConfig;
use topsongs_common::spotify::SpotifyEndpoints;
use topsongs_common::{ChartRow, CsvStore};
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: app whose default chart file lives in `dir`
fn setup_app(dir: &TempDir) -> (Router, PathBuf) {
    let config = ChartConfig {
        csv_path: dir.path().join("data").join("top.csv"),
        env_path: dir.path().join(".env"),
        ..Default::default()
    };
    let csv_path = config.csv_path.clone();
    (build_router(AppState::new(&config)), csv_path)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn seed_chart(path: &Path) {
    CsvStore::new(path)
        .save(&[
            ChartRow::new(1, "Old One", "Old A", 30),
            ChartRow::new(2, "Old Two", "Old B", 20),
            ChartRow::new(3, "Old Three", "Old C", 10),
        ])
        .unwrap();
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_ok_without_chart_file() {
    let dir = TempDir::new().unwrap();
    let (app, csv_path) = setup_app(&dir);

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "topsongs-api");
    assert!(body["version"].is_string());
    assert!(!csv_path.exists());
}

// =============================================================================
// Update route: rows source
// =============================================================================

#[tokio::test]
async fn test_rows_update_writes_single_row() {
    let dir = TempDir::new().unwrap();
    let (app, csv_path) = setup_app(&dir);

    let body = r#"{"source":"rows","rows":[{"position":1,"track":"Song","artist":"Artist","streams":123}]}"#;
    let response = app.oneshot(post_json("/routes/csv/update", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["source"], "rows");
    assert_eq!(body["written"], 1);
    assert_eq!(body["limit_requested"], 1);
    assert_eq!(body["top_track"], "Song");
    assert_eq!(body["csv_path"], csv_path.display().to_string());
    assert!(body["updated_at_utc"].as_str().unwrap().ends_with('Z'));

    let stored = CsvStore::new(&csv_path).load().unwrap();
    assert_eq!(stored, vec![ChartRow::new(1, "Song", "Artist", 123)]);
}

#[tokio::test]
async fn test_rows_update_missing_artist_leaves_file_unchanged() {
    let dir = TempDir::new().unwrap();
    let (app, csv_path) = setup_app(&dir);
    seed_chart(&csv_path);
    let before = std::fs::read(&csv_path).unwrap();

    let body = r#"{"source":"rows","rows":[{"position":1,"track":"Song","streams":123}]}"#;
    let response = app.oneshot(post_json("/routes/csv/update", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("artist"));
    assert_eq!(std::fs::read(&csv_path).unwrap(), before);
}

#[tokio::test]
async fn test_rows_update_normalizes_and_honours_csv_path() {
    let dir = TempDir::new().unwrap();
    let (app, default_path) = setup_app(&dir);
    let other = dir.path().join("other.csv");

    let body = json!({
        "source": "rows",
        "csv_path": other.display().to_string(),
        "rows": [
            {"position": "2", "track": " Second ", "artist": "B", "streams": -4},
            {"position": 1, "track": "First", "artist": "A", "streams": 9.7},
            {"position": 3, "track": "", "artist": "C", "streams": 1}
        ]
    });
    let response = app
        .oneshot(post_json("/routes/csv/update", &body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["written"], 2);
    assert_eq!(body["limit_requested"], 3);
    assert_eq!(body["top_track"], "First");

    assert!(!default_path.exists());
    assert_eq!(
        CsvStore::new(&other).load().unwrap(),
        vec![ChartRow::new(1, "First", "A", 9), ChartRow::new(2, "Second", "B", 0)]
    );
}

#[tokio::test]
async fn test_rows_update_rejects_empty_rows() {
    let dir = TempDir::new().unwrap();
    let (app, csv_path) = setup_app(&dir);

    let response = app
        .oneshot(post_json("/routes/csv/update", r#"{"source":"rows","rows":[]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(!csv_path.exists());
}

#[tokio::test]
async fn test_rows_update_with_no_usable_rows_is_validation_error() {
    let dir = TempDir::new().unwrap();
    let (app, csv_path) = setup_app(&dir);
    seed_chart(&csv_path);
    let before = std::fs::read(&csv_path).unwrap();

    let body = r#"{"source":"rows","rows":[{"position":"x","track":"A","artist":"B","streams":1}]}"#;
    let response = app.oneshot(post_json("/routes/csv/update", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["message"], "No valid rows to save in CSV.");
    assert_eq!(std::fs::read(&csv_path).unwrap(), before);
}

// =============================================================================
// Update route: request shape
// =============================================================================

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir);

    for body in ["{not json", r#"{"rows":[]}"#, r#"{"source":"radio"}"#] {
        let response = app
            .clone()
            .oneshot(post_json("/routes/csv/update", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        let json = extract_json(response.into_body()).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST", "{body}");
    }
}

#[tokio::test]
async fn test_spotify_invalid_limit_is_rejected_before_fetch() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir);

    for limit in [json!(0), json!(-3), json!("ten"), json!(2.5)] {
        let body = json!({"source": "spotify", "limit": limit});
        let response = app
            .clone()
            .oneshot(post_json("/routes/csv/update", &body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{limit}");
        let json = extract_json(response.into_body()).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR", "{limit}");
    }
}

#[tokio::test]
async fn test_spotify_null_limit_is_validation_error() {
    let dir = TempDir::new().unwrap();
    let (app, csv_path) = setup_app(&dir);

    let response = app
        .oneshot(post_json("/routes/csv/update", r#"{"source":"spotify","limit":null}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "limit must be an integer.");
    assert!(!csv_path.exists());
}

#[tokio::test]
async fn test_get_on_update_route_is_method_not_allowed() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir);

    let response = app
        .oneshot(test_request("GET", "/routes/csv/update"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir);

    let response = app.oneshot(test_request("GET", "/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// Leaderboard read route
// =============================================================================

#[tokio::test]
async fn test_top_route_returns_rows_and_summary() {
    let dir = TempDir::new().unwrap();
    let (app, csv_path) = setup_app(&dir);
    seed_chart(&csv_path);

    let response = app
        .oneshot(test_request("GET", "/routes/csv/top?limit=2"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["rows"].as_array().unwrap().len(), 2);
    assert_eq!(body["rows"][0]["track"], "Old One");
    assert_eq!(body["summary"]["total_tracks"], 2);
    assert_eq!(body["summary"]["total_streams"], 50);
    assert_eq!(body["summary"]["avg_streams"], 25);
    assert_eq!(body["summary"]["top_track"], "Old One");
}

#[tokio::test]
async fn test_top_route_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir);

    let response = app
        .oneshot(test_request("GET", "/routes/csv/top"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_top_route_rejects_zero_limit() {
    let dir = TempDir::new().unwrap();
    let (app, csv_path) = setup_app(&dir);
    seed_chart(&csv_path);

    let response = app
        .oneshot(test_request("GET", "/routes/csv/top?limit=0"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["message"], "limit must be greater than zero.");
}

// =============================================================================
// Update route: spotify source
// =============================================================================

/// Start a stand-in Spotify API that serves a three-track playlist
async fn start_fake_spotify(playlist_status: StatusCode) -> SpotifyEndpoints {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let router = Router::new()
        .route(
            "/api/token",
            post(|| async { Json(json!({"access_token": "issued-token"})) }),
        )
        .route(
            "/v1/playlists/:id/tracks",
            get(move || async move {
                if playlist_status != StatusCode::OK {
                    return (
                        playlist_status,
                        Json(json!({"error": {"status": playlist_status.as_u16(), "message": "Service unavailable"}})),
                    );
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "items": [
                            {"track": {"name": "Hit", "artists": [{"name": "Star"}], "popularity": 97}},
                            {"track": {"name": "Duet", "artists": [{"name": "A"}, {"name": "B"}], "popularity": 88}},
                            {"track": {"name": "Third", "artists": [{"name": "C"}], "popularity": 70}}
                        ],
                        "next": null
                    })),
                )
            }),
        );

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    SpotifyEndpoints {
        api_base: format!("{base}/v1"),
        token_url: format!("{base}/api/token"),
    }
}

fn clear_spotify_env() {
    for key in [
        "SPOTIFY_TOKEN",
        "SPOTIFY_CLIENT_ID",
        "SPOTIFY_CLIENT_SECRET",
        "SPOTIFY_PLAYLIST_ID",
        "SPOTIFY_MARKET",
    ] {
        std::env::remove_var(key);
    }
}

fn spotify_app(dir: &TempDir, endpoints: SpotifyEndpoints) -> (Router, PathBuf) {
    let config = ChartConfig {
        csv_path: dir.path().join("top.csv"),
        env_path: dir.path().join(".env"),
        ..Default::default()
    };
    std::fs::write(
        &config.env_path,
        "SPOTIFY_CLIENT_ID=abc\nSPOTIFY_CLIENT_SECRET=def\n",
    )
    .unwrap();
    let csv_path = config.csv_path.clone();
    let state = AppState::new(&config).with_spotify_endpoints(endpoints);
    (build_router(state), csv_path)
}

#[tokio::test]
#[serial]
async fn test_spotify_update_writes_fetched_rows() {
    clear_spotify_env();
    let endpoints = start_fake_spotify(StatusCode::OK).await;
    let dir = TempDir::new().unwrap();
    let (app, csv_path) = spotify_app(&dir, endpoints);

    let response = app
        .oneshot(post_json("/routes/csv/update", r#"{"source":"spotify","limit":"2"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["source"], "spotify");
    assert_eq!(body["written"], 2);
    assert_eq!(body["limit_requested"], 2);
    assert_eq!(body["top_track"], "Hit");

    assert_eq!(
        CsvStore::new(&csv_path).load().unwrap(),
        vec![ChartRow::new(1, "Hit", "Star", 97), ChartRow::new(2, "Duet", "A, B", 88)]
    );
}

#[tokio::test]
#[serial]
async fn test_spotify_failure_is_bad_gateway_and_keeps_file() {
    clear_spotify_env();
    let endpoints = start_fake_spotify(StatusCode::SERVICE_UNAVAILABLE).await;
    let dir = TempDir::new().unwrap();
    let (app, csv_path) = spotify_app(&dir, endpoints);
    seed_chart(&csv_path);
    let before = std::fs::read(&csv_path).unwrap();

    let response = app
        .oneshot(post_json("/routes/csv/update", r#"{"source":"spotify"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("503"));
    assert_eq!(std::fs::read(&csv_path).unwrap(), before);
}

#[tokio::test]
#[serial]
async fn test_spotify_without_credentials_is_bad_gateway() {
    clear_spotify_env();
    let dir = TempDir::new().unwrap();
    let (app, _) = setup_app(&dir);

    let response = app
        .oneshot(post_json("/routes/csv/update", r#"{"source":"spotify","limit":5}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("SPOTIFY_CLIENT_ID"));
}
