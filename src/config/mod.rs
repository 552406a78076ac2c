//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables.

mod storage;
mod workflow;

pub use storage::{SqliteConfig, StorageConfig, StorageType};
pub use workflow::{
    DownloadsConfig, LockConfig, WorkflowConfig, DEFAULT_DOWNLOADS_TIMEOUT_MS,
    DEFAULT_LOCK_ACQUIRE_TIMEOUT_MS,
};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "catalog.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "CATALOG_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "CATALOG";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "CATALOG_LOG";

use serde::Deserialize;

use crate::error::{CatalogError, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Resource lock configuration.
    pub locks: LockConfig,
    /// Downloads trigger endpoints.
    pub downloads: DownloadsConfig,
    /// Publishing workflow configuration.
    pub workflow: WorkflowConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `catalog.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CatalogError::InvalidConfig(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CatalogError::InvalidConfig(e.to_string()))
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self::default()
    }
}
