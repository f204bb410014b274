//! topsongs-jobs library - scheduled chart jobs
//!
//! - [`snapshot`]: copy the chart CSV into the SQLite snapshot table
//! - [`refresh`]: rewrite the chart CSV from the Spotify playlist
//!
//! Both jobs take their settings from a resolved [`ChartConfig`] and are run
//! by thin binaries that parse arguments and install logging.
//!
//! [`ChartConfig`]: topsongs_common::config::ChartConfig

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod refresh;
pub mod snapshot;

pub use refresh::{run_refresh, RefreshReport};
pub use snapshot::{run_snapshot, run_snapshot_at, SnapshotReport};

/// Install the fmt subscriber; `RUST_LOG` overrides the default `info` level
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
