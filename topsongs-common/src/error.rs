//! Common error types for the chart service

use thiserror::Error;

use crate::schema::REQUIRED_COLUMNS;

/// Common result type for chart operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the server and the jobs
#[derive(Error, Debug)]
pub enum Error {
    /// Input lacks one or more required chart columns
    #[error(
        "Invalid CSV format. Missing columns: {}. Expected: {}.",
        .missing.join(", "),
        REQUIRED_COLUMNS.join(", ")
    )]
    MissingColumns { missing: Vec<String> },

    /// Limit is not a positive integer
    #[error("{field} {reason}")]
    InvalidLimit { field: String, reason: String },

    /// Nothing usable survived validation
    #[error("{0}")]
    NoRows(String),

    /// Spotify credentials missing, rejected or expired
    #[error("Spotify authentication failed: {0}")]
    Auth(String),

    /// Spotify answered with a non-2xx status
    #[error("Spotify API error ({status}) on {method} {url}: {message}")]
    Api {
        status: u16,
        method: String,
        url: String,
        message: String,
    },

    /// Spotify could not be reached
    #[error("Failed to reach Spotify API: {0}")]
    Network(String),

    /// Spotify answered with a body we could not interpret
    #[error("Spotify API returned an unexpected payload: {0}")]
    Parse(String),

    /// Snapshot database could not be opened or written
    #[error("Could not write SQLite database '{path}': {message}")]
    Persistence { path: String, message: String },

    /// CSV encoding/decoding error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Build an `InvalidLimit` for the named field
    pub fn invalid_limit(field: &str, reason: &str) -> Self {
        Error::InvalidLimit {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures caused by the caller's input rather than by I/O or upstream
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingColumns { .. } | Error::InvalidLimit { .. } | Error::NoRows(_)
        )
    }

    /// True for failures originating at the Spotify API
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Auth(_) | Error::Api { .. } | Error::Network(_) | Error::Parse(_)
        )
    }
}
