//! Error types for topsongs-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request body or missing/unknown `source` (400)
    #[error("{0}")]
    BadRequest(String),

    /// Payload decoded but failed chart validation (400)
    #[error("{0}")]
    Validation(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Known route, wrong method (405)
    #[error("{0}")]
    MethodNotAllowed(String),

    /// Spotify failed or rejected the request (502)
    #[error("{0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            ApiError::Upstream(_) => "UPSTREAM_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<topsongs_common::Error> for ApiError {
    fn from(err: topsongs_common::Error) -> Self {
        if err.is_validation() {
            ApiError::Validation(err.to_string())
        } else if err.is_upstream() {
            ApiError::Upstream(err.to_string())
        } else if let topsongs_common::Error::NotFound(msg) = err {
            ApiError::NotFound(msg)
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "status": "error",
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (self.status(), body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
