//! Snapshot job: chart CSV -> SQLite table
//!
//! The destination table is replaced wholesale on every run. Delete and
//! insert share one transaction, so a failed run leaves the previous
//! snapshot in place.

use std::fmt;
use std::path::PathBuf;

use topsongs_common::config::ChartConfig;
use topsongs_common::db::{self, SnapshotStamp};
use topsongs_common::{CsvStore, Result};
use tracing::info;

/// Outcome of one snapshot run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotReport {
    pub rows: u64,
    pub table: String,
    pub snapshot_date: String,
    pub db_path: PathBuf,
}

impl fmt::Display for SnapshotReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Saved {} rows to table '{}' for {} in {}",
            self.rows,
            self.table,
            self.snapshot_date,
            self.db_path.display()
        )
    }
}

/// Run the snapshot stamped with the current time
pub async fn run_snapshot(config: &ChartConfig) -> Result<SnapshotReport> {
    run_snapshot_at(config, SnapshotStamp::now()).await
}

/// Run the snapshot with an explicit stamp
pub async fn run_snapshot_at(config: &ChartConfig, stamp: SnapshotStamp) -> Result<SnapshotReport> {
    db::validate_table_name(&config.table_name)?;

    let rows = CsvStore::new(&config.csv_path).load_top(config.limit)?;
    info!(
        csv_path = %config.csv_path.display(),
        rows = rows.len(),
        "Loaded chart for snapshot"
    );

    let pool = db::open_snapshot_database(&config.sqlite_path).await?;
    let result = async {
        db::create_snapshot_table(&pool, &config.sqlite_path, &config.table_name).await?;
        db::replace_snapshot(&pool, &config.sqlite_path, &config.table_name, &rows, &stamp).await
    }
    .await;
    pool.close().await;
    let inserted = result?;

    let report = SnapshotReport {
        rows: inserted,
        table: config.table_name.clone(),
        snapshot_date: stamp.snapshot_date,
        db_path: config.sqlite_path.clone(),
    };
    info!(
        rows = report.rows,
        table = %report.table,
        snapshot_date = %report.snapshot_date,
        db_path = %report.db_path.display(),
        "Snapshot complete"
    );
    Ok(report)
}
