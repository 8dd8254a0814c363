//! Application configuration loaded from an optional TOML file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite file holding the collection snapshot.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Days covered by `upcoming` when no count is given.
    #[serde(default = "default_upcoming_days")]
    pub upcoming_days: u32,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("db.sqlite3")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_upcoming_days() -> u32 {
    7
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_level: default_log_level(),
            upcoming_days: default_upcoming_days(),
        }
    }
}

impl Config {
    /// Loads the configuration from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
