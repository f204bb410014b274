//! Configuration loading and resolution
//!
//! Every setting is resolved in priority order:
//! 1. Command-line argument or environment variable (both arrive through clap)
//! 2. TOML config file
//! 3. Compiled default
//!
//! Blank values count as unset at every level.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::csv_store::DEFAULT_CSV_PATH;
use crate::schema::{self, DEFAULT_LIMIT};
use crate::{Error, Result};

pub const DEFAULT_SQLITE_PATH: &str = "data/spotify_top.db";
pub const DEFAULT_TABLE_NAME: &str = "spotify_top_daily";
pub const DEFAULT_ENV_PATH: &str = ".env";

/// Environment variable naming an explicit TOML config file
pub const CONFIG_FILE_ENV: &str = "TOPSONGS_CONFIG";

/// Contents of the optional TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub csv_path: Option<String>,
    pub sqlite_path: Option<String>,
    pub table_name: Option<String>,
    pub limit: Option<i64>,
    pub env_path: Option<String>,
}

impl TomlConfig {
    /// Load the config file if one exists
    ///
    /// A missing or malformed file is not fatal: a warning is logged and
    /// compiled defaults apply.
    pub fn load() -> Self {
        let Some(path) = config_file_path() else {
            debug!("No config file found, using defaults");
            return Self::default();
        };

        match Self::from_file(&path) {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded config file");
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub csv_path: Option<String>,
    pub sqlite_path: Option<String>,
    pub table_name: Option<String>,
    pub limit: Option<String>,
    pub env_path: Option<String>,
}

/// Fully resolved settings shared by the server and the jobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartConfig {
    pub csv_path: PathBuf,
    pub sqlite_path: PathBuf,
    pub table_name: String,
    pub limit: u32,
    pub env_path: PathBuf,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            sqlite_path: PathBuf::from(DEFAULT_SQLITE_PATH),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            limit: DEFAULT_LIMIT,
            env_path: PathBuf::from(DEFAULT_ENV_PATH),
        }
    }
}

impl ChartConfig {
    /// Resolve settings from overrides, then the config file, then defaults
    pub fn resolve(overrides: &ConfigOverrides, file: &TomlConfig) -> Result<Self> {
        let defaults = Self::default();

        let pick = |cli: &Option<String>, toml: &Option<String>| -> Option<String> {
            non_blank(cli.as_deref()).or_else(|| non_blank(toml.as_deref()))
        };

        let limit = match non_blank(overrides.limit.as_deref()) {
            Some(raw) => schema::parse_limit_str(&raw, "SPOTIFY_LIMIT")?,
            None => match file.limit {
                Some(value) => schema::parse_limit_str(&value.to_string(), "limit")?,
                None => defaults.limit,
            },
        };

        Ok(Self {
            csv_path: pick(&overrides.csv_path, &file.csv_path)
                .map(PathBuf::from)
                .unwrap_or(defaults.csv_path),
            sqlite_path: pick(&overrides.sqlite_path, &file.sqlite_path)
                .map(PathBuf::from)
                .unwrap_or(defaults.sqlite_path),
            table_name: pick(&overrides.table_name, &file.table_name)
                .unwrap_or(defaults.table_name),
            limit,
            env_path: pick(&overrides.env_path, &file.env_path)
                .map(PathBuf::from)
                .unwrap_or(defaults.env_path),
        })
    }
}

/// Trimmed value, or `None` when blank
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Locate the config file: `TOPSONGS_CONFIG` first, then the user config directory
fn config_file_path() -> Option<PathBuf> {
    if let Some(explicit) = non_blank(std::env::var(CONFIG_FILE_ENV).ok().as_deref()) {
        return Some(PathBuf::from(explicit));
    }

    let user_config = dirs::config_dir()?.join("topsongs").join("config.toml");
    user_config.exists().then_some(user_config)
}
