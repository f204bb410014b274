//! Chart schema, limit validation and row normalization
//!
//! This is the contract shared by the CSV store, the snapshot job and the
//! update route: every row that reaches disk or the database passed through
//! [`check_columns`] and [`normalize_rows`].

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::ChartRow;
use crate::{Error, Result};

/// Required chart columns, in canonical header order
pub const REQUIRED_COLUMNS: [&str; 4] = ["position", "track", "artist", "streams"];

/// Row limit used when none is configured
pub const DEFAULT_LIMIT: u32 = 50;

/// A row before normalization: column name to raw cell text
///
/// Empty text stands for a missing value (empty CSV cell, JSON `null`).
pub type RawRow = BTreeMap<String, String>;

/// Fail with `MissingColumns` unless every required column is present
pub fn check_columns<'a>(present: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let present: Vec<&str> = present.into_iter().collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !present.contains(*column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingColumns { missing })
    }
}

/// Presence check for a single row
pub fn validate_row(row: &RawRow) -> Result<()> {
    check_columns(row.keys().map(String::as_str))
}

/// Parse a limit given as text (environment variable, query string)
pub fn parse_limit_str(raw: &str, field: &str) -> Result<u32> {
    let parsed: i64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::invalid_limit(field, "must be an integer."))?;
    ensure_positive(parsed, field)
}

/// Parse a limit given as a JSON value; integers and integer strings are accepted
pub fn parse_limit_value(value: &Value, field: &str) -> Result<u32> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(parsed) => ensure_positive(parsed, field),
            None if n.is_u64() => Err(too_large(field)),
            None => Err(Error::invalid_limit(field, "must be an integer.")),
        },
        Value::String(s) => parse_limit_str(s, field),
        _ => Err(Error::invalid_limit(field, "must be an integer.")),
    }
}

fn ensure_positive(parsed: i64, field: &str) -> Result<u32> {
    if parsed <= 0 {
        return Err(Error::invalid_limit(field, "must be greater than zero."));
    }
    u32::try_from(parsed).map_err(|_| too_large(field))
}

fn too_large(field: &str) -> Error {
    Error::invalid_limit(field, &format!("must not exceed {}.", u32::MAX))
}

/// Convert a JSON object into a raw row
///
/// Strings are taken as-is, `null` becomes an empty (missing) value and any
/// other JSON value is rendered as JSON text.
pub fn raw_row_from_json(object: &serde_json::Map<String, Value>) -> RawRow {
    object
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

/// Coerce cell text to an integer: integer text directly, decimal text truncated
fn coerce_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    let value = trimmed.parse::<f64>().ok()?;
    if !value.is_finite() || value.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(value.trunc() as i64)
}

/// Normalize a single raw row, or `None` if the row must be dropped
pub fn normalize_row(raw: &RawRow) -> Option<ChartRow> {
    let field = |name: &str| raw.get(name).map(String::as_str).unwrap_or("");

    let position = coerce_integer(field("position"))?;
    let streams = coerce_integer(field("streams"))?;
    let row = ChartRow {
        position,
        track: field("track").to_string(),
        artist: field("artist").to_string(),
        streams,
    };
    clean(row)
}

/// Normalize raw rows: drop unusable rows, clamp streams, stable-sort by position
pub fn normalize_rows<'a>(raw: impl IntoIterator<Item = &'a RawRow>) -> Vec<ChartRow> {
    let mut rows: Vec<ChartRow> = raw.into_iter().filter_map(normalize_row).collect();
    rows.sort_by_key(|row| row.position);
    rows
}

/// Apply the same normalization to rows that are already typed
pub fn normalize_chart(rows: impl IntoIterator<Item = ChartRow>) -> Vec<ChartRow> {
    let mut rows: Vec<ChartRow> = rows.into_iter().filter_map(clean).collect();
    rows.sort_by_key(|row| row.position);
    rows
}

fn clean(mut row: ChartRow) -> Option<ChartRow> {
    row.track = row.track.trim().to_string();
    row.artist = row.artist.trim().to_string();
    if row.track.is_empty() || row.artist.is_empty() {
        return None;
    }
    row.streams = row.streams.max(0);
    Some(row)
}
