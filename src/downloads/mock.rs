//! Recording generator for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::DownloadsGenerator;
use crate::error::{CatalogError, Result};

/// Arguments of one `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateCall {
    pub dataset_id: String,
    pub instance_id: String,
    pub edition: String,
    pub version: String,
}

/// Generator that records every call and replays queued failures.
#[derive(Default)]
pub struct RecordingGenerator {
    calls: RwLock<Vec<GenerateCall>>,
    failures: RwLock<VecDeque<CatalogError>>,
}

impl RecordingGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<GenerateCall> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    pub async fn push_failure(&self, err: CatalogError) {
        self.failures.write().await.push_back(err);
    }
}

#[async_trait]
impl DownloadsGenerator for RecordingGenerator {
    async fn generate(
        &self,
        dataset_id: &str,
        instance_id: &str,
        edition: &str,
        version: &str,
    ) -> Result<()> {
        self.calls.write().await.push(GenerateCall {
            dataset_id: dataset_id.to_string(),
            instance_id: instance_id.to_string(),
            edition: edition.to_string(),
            version: version.to_string(),
        });
        match self.failures.write().await.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "recording"
    }
}
