//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::store::DB_FILE;

/// Retries for a `new` command whose generated test number was taken meanwhile
pub const DEFAULT_INSERT_RETRIES: u32 = 3;

/// lilerp configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Database file
    pub database: Option<PathBuf>,

    /// Default output format
    pub default_format: Option<String>,

    /// How often `new` regenerates a test number after a collision
    pub insert_retries: Option<u32>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        // 1. Built-in defaults (already in Default impl)
        let mut config = Config::default();

        // 2. Global user config (~/.config/lil-erp/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Environment variables
        config.merge(Self::from_env(|key| std::env::var(key).ok()));

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    /// Settings taken from `LILERP_*` variables
    fn from_env(var: impl Fn(&str) -> Option<String>) -> Config {
        let insert_retries = var("LILERP_INSERT_RETRIES").and_then(|v| match v.trim().parse() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!(value = %v, "LILERP_INSERT_RETRIES is not a number");
                None
            }
        });

        Config {
            database: var("LILERP_DB")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            default_format: var("LILERP_FORMAT").filter(|v| !v.trim().is_empty()),
            insert_retries,
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("", "", "lil-erp")
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.insert_retries.is_some() {
            self.insert_retries = other.insert_retries;
        }
    }

    /// Database file, falling back to the platform data directory
    pub fn database_path(&self) -> PathBuf {
        if let Some(ref path) = self.database {
            return path.clone();
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join(DB_FILE))
            .unwrap_or_else(|| PathBuf::from(DB_FILE))
    }

    pub fn insert_retries(&self) -> u32 {
        self.insert_retries.unwrap_or(DEFAULT_INSERT_RETRIES)
    }
}
