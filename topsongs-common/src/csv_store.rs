//! CSV store for the chart file
//!
//! The chart file is a single named mutable resource: `load` reads and
//! normalizes it, `save` replaces its entire contents. Writes are plain
//! overwrites; callers must not overlap writers, and a reader running during
//! a write may observe a partially written file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::models::ChartRow;
use crate::schema::{self, RawRow};
use crate::{Error, Result};

/// Default location of the chart file, relative to the working directory
pub const DEFAULT_CSV_PATH: &str = "data/top_songs_brasil.csv";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Handle to one chart CSV file
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every valid row, sorted by position
    ///
    /// Fails with `MissingColumns` when the header lacks a required column and
    /// with `NoRows` when no row survives normalization.
    pub fn load(&self) -> Result<Vec<ChartRow>> {
        if !self.path.exists() {
            return Err(Error::NotFound(format!(
                "CSV file not found: {}",
                self.path.display()
            )));
        }

        let bytes = std::fs::read(&self.path)?;
        let text = decode_text(&bytes);

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        schema::check_columns(headers.iter())?;

        let mut raw_rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let raw: RawRow = headers
                .iter()
                .zip(record.iter())
                .map(|(column, value)| (column.to_string(), value.to_string()))
                .collect();
            raw_rows.push(raw);
        }

        let rows = schema::normalize_rows(&raw_rows);
        debug!(
            path = %self.path.display(),
            read = raw_rows.len(),
            kept = rows.len(),
            "Loaded chart CSV"
        );

        if rows.is_empty() {
            return Err(Error::NoRows(
                "CSV has no valid rows after validation.".to_string(),
            ));
        }
        Ok(rows)
    }

    /// Read the first `limit` rows of the chart
    pub fn load_top(&self, limit: u32) -> Result<Vec<ChartRow>> {
        if limit == 0 {
            return Err(Error::invalid_limit("The limit", "must be greater than zero."));
        }
        let mut rows = self.load()?;
        rows.truncate(limit as usize);
        Ok(rows)
    }

    /// Replace the file with the canonical header followed by `rows`
    ///
    /// Rows are normalized first; the normalized rows actually written are returned.
    pub fn save(&self, rows: &[ChartRow]) -> Result<Vec<ChartRow>> {
        let rows = schema::normalize_chart(rows.iter().cloned());
        if rows.is_empty() {
            return Err(Error::NoRows("No valid rows to save in CSV.".to_string()));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        info!(
            path = %self.path.display(),
            rows = rows.len(),
            "Chart CSV written"
        );
        Ok(rows)
    }
}

/// Decode file bytes: UTF-8 (BOM stripped), falling back to Latin-1
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            debug!("Chart CSV is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}
