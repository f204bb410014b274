//! # Top Songs Common Library
//!
//! Shared code for the chart server and the scheduled jobs:
//! - Chart row schema, limit validation and row normalization
//! - CSV store (load/save of the chart file)
//! - Spotify playlist adapter
//! - SQLite snapshot table access
//! - Configuration resolution

pub mod config;
pub mod csv_store;
pub mod db;
pub mod error;
pub mod models;
pub mod schema;
pub mod spotify;

pub use csv_store::CsvStore;
pub use error::{Error, Result};
pub use models::{ChartRow, SummaryMetrics};
