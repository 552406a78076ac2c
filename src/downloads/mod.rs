//! Download artifact generation triggers.
//!
//! Publishing only fires the trigger; the artifacts themselves are produced by
//! a downstream pipeline. [`DownloadsRegistry`] maps each dataset type to the
//! generator responsible for it.

mod http;
pub mod mock;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::DownloadsConfig;
use crate::error::{CatalogError, Result};
use crate::models::DatasetType;

pub use http::{GenerateRequest, HttpDownloadsGenerator};

/// Trigger for download artifact generation.
#[async_trait]
pub trait DownloadsGenerator: Send + Sync {
    /// Ask the pipeline to (re)generate downloads for one version.
    async fn generate(
        &self,
        dataset_id: &str,
        instance_id: &str,
        edition: &str,
        version: &str,
    ) -> Result<()>;

    /// Generator name for logging.
    fn name(&self) -> &str;
}

/// Dataset type to generator mapping.
#[derive(Default, Clone)]
pub struct DownloadsRegistry {
    generators: HashMap<DatasetType, Arc<dyn DownloadsGenerator>>,
}

impl DownloadsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build HTTP generators for every endpoint present in `config`.
    pub fn from_config(config: &DownloadsConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let mut registry = Self::new();

        if let Some(url) = &config.cmd_url {
            let generator: Arc<dyn DownloadsGenerator> =
                Arc::new(HttpDownloadsGenerator::new("cmd", url, timeout)?);
            registry.register(DatasetType::Filterable, generator);
            info!(endpoint = %url, "downloads: filterable generator configured");
        }

        if let Some(url) = &config.cantabular_url {
            let generator: Arc<dyn DownloadsGenerator> =
                Arc::new(HttpDownloadsGenerator::new("cantabular", url, timeout)?);
            for dataset_type in DatasetType::ALL.into_iter().filter(DatasetType::is_cantabular) {
                registry.register(dataset_type, Arc::clone(&generator));
            }
            info!(endpoint = %url, "downloads: cantabular generator configured");
        }

        Ok(registry)
    }

    pub fn register(&mut self, dataset_type: DatasetType, generator: Arc<dyn DownloadsGenerator>) {
        self.generators.insert(dataset_type, generator);
    }

    /// Generator for `dataset_type`, `GeneratorNotConfigured` if none.
    pub fn get(&self, dataset_type: DatasetType) -> Result<Arc<dyn DownloadsGenerator>> {
        self.generators
            .get(&dataset_type)
            .cloned()
            .ok_or(CatalogError::GeneratorNotConfigured(dataset_type))
    }
}
