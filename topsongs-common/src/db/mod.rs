//! SQLite access for chart snapshots

mod snapshot_table;

pub use snapshot_table::{create_snapshot_table, fetch_snapshot_rows, replace_snapshot, SnapshotStamp};

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::{Error, Result};

/// Open (creating if needed) the snapshot database
///
/// The job is a single writer, so one connection is enough.
pub async fn open_snapshot_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| persistence(db_path, e))?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| persistence(db_path, e))?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    Ok(pool)
}

/// Table names are interpolated into SQL, so only `[A-Za-z_][A-Za-z0-9_]*` is allowed
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::Config(
            "SPOTIFY_DB_TABLE must use only letters, digits, and underscore, \
             starting with a letter or underscore."
                .to_string(),
        ))
    }
}

/// Wrap a database failure with the database path
pub(crate) fn persistence(db_path: &Path, err: impl std::fmt::Display) -> Error {
    Error::Persistence {
        path: db_path.display().to_string(),
        message: err.to_string(),
    }
}
