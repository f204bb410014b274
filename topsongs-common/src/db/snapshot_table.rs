//! Snapshot table: a full copy of the chart, replaced wholesale on every run

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use super::{persistence, validate_table_name};
use crate::models::ChartRow;
use crate::Result;

/// When a snapshot was taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStamp {
    /// UTC calendar date, `YYYY-MM-DD`
    pub snapshot_date: String,
    /// RFC 3339 UTC timestamp
    pub captured_at_utc: String,
}

impl SnapshotStamp {
    pub fn at(run_at: DateTime<Utc>) -> Self {
        Self {
            snapshot_date: run_at.date_naive().format("%Y-%m-%d").to_string(),
            captured_at_utc: run_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    pub fn now() -> Self {
        Self::at(Utc::now())
    }
}

/// Create the snapshot table if it does not exist
pub async fn create_snapshot_table(pool: &SqlitePool, db_path: &Path, table: &str) -> Result<()> {
    validate_table_name(table)?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            snapshot_date TEXT NOT NULL,
            position INTEGER NOT NULL,
            track TEXT NOT NULL,
            artist TEXT NOT NULL,
            streams INTEGER NOT NULL,
            captured_at_utc TEXT NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await
    .map_err(|e| persistence(db_path, e))?;

    Ok(())
}

/// Delete every row of `table` and insert `rows`, in one transaction
///
/// Returns the number of rows inserted. On failure nothing is committed, so
/// the previous snapshot stays in place.
pub async fn replace_snapshot(
    pool: &SqlitePool,
    db_path: &Path,
    table: &str,
    rows: &[ChartRow],
    stamp: &SnapshotStamp,
) -> Result<u64> {
    validate_table_name(table)?;

    let mut tx = pool.begin().await.map_err(|e| persistence(db_path, e))?;

    let deleted = sqlx::query(&format!("DELETE FROM {table}"))
        .execute(&mut *tx)
        .await
        .map_err(|e| persistence(db_path, e))?
        .rows_affected();

    let insert_sql = format!(
        "INSERT INTO {table} (snapshot_date, position, track, artist, streams, captured_at_utc) \
         VALUES (?, ?, ?, ?, ?, ?)"
    );
    let mut inserted = 0;
    for row in rows {
        inserted += sqlx::query(&insert_sql)
            .bind(&stamp.snapshot_date)
            .bind(row.position)
            .bind(&row.track)
            .bind(&row.artist)
            .bind(row.streams)
            .bind(&stamp.captured_at_utc)
            .execute(&mut *tx)
            .await
            .map_err(|e| persistence(db_path, e))?
            .rows_affected();
    }

    tx.commit().await.map_err(|e| persistence(db_path, e))?;

    tracing::debug!(table = %table, deleted, inserted, "Snapshot table replaced");
    Ok(inserted)
}

/// Read the current snapshot back, ordered by position
pub async fn fetch_snapshot_rows(pool: &SqlitePool, db_path: &Path, table: &str) -> Result<Vec<ChartRow>> {
    validate_table_name(table)?;

    let rows = sqlx::query(&format!(
        "SELECT position, track, artist, streams FROM {table} ORDER BY position, rowid"
    ))
    .fetch_all(pool)
    .await
    .map_err(|e| persistence(db_path, e))?;

    rows.iter()
        .map(|row| {
            Ok(ChartRow {
                position: row.try_get("position").map_err(|e| persistence(db_path, e))?,
                track: row.try_get("track").map_err(|e| persistence(db_path, e))?,
                artist: row.try_get("artist").map_err(|e| persistence(db_path, e))?,
                streams: row.try_get("streams").map_err(|e| persistence(db_path, e))?,
            })
        })
        .collect()
}
