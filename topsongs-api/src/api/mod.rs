//! HTTP API handlers

use axum::http::{Method, Uri};

use crate::error::ApiError;

pub mod csv_routes;
pub mod health;

pub use csv_routes::{csv_routes, top_chart, update_csv, UpdateRequest, UpdateResponse};
pub use health::{health_check, health_routes, HealthResponse};

/// Fallback for a known path reached with the wrong method
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!("Method {} not allowed for {}", method, uri.path()))
}

/// Fallback for unknown paths
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
