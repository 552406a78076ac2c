//! HTTP downloads trigger.
//!
//! POSTs a JSON generate request to the configured pipeline endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

use super::DownloadsGenerator;
use crate::error::{CatalogError, Result};

/// Body of a generate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest<'a> {
    pub dataset_id: &'a str,
    pub instance_id: &'a str,
    pub edition: &'a str,
    pub version: &'a str,
}

/// Generator that triggers a downstream pipeline over HTTP.
pub struct HttpDownloadsGenerator {
    name: String,
    endpoint: String,
    client: Client,
}

impl HttpDownloadsGenerator {
    pub fn new(name: &str, endpoint: &str, timeout: Duration) -> Result<Self> {
        if endpoint.is_empty() {
            return Err(CatalogError::InvalidConfig(format!(
                "downloads endpoint for {name} is empty"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::InvalidConfig(format!("downloads client: {e}")))?;

        Ok(Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DownloadsGenerator for HttpDownloadsGenerator {
    async fn generate(
        &self,
        dataset_id: &str,
        instance_id: &str,
        edition: &str,
        version: &str,
    ) -> Result<()> {
        let request = GenerateRequest {
            dataset_id,
            instance_id,
            edition,
            version,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| CatalogError::DownloadsGeneration(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(
                generator = %self.name,
                dataset_id,
                edition,
                version,
                "downloads generation triggered"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!(
            generator = %self.name,
            endpoint = %self.endpoint,
            status = %status,
            body = %body,
            "downloads trigger failed"
        );
        Err(CatalogError::DownloadsGeneration(format!(
            "HTTP {} - {}",
            status,
            body.chars().take(200).collect::<String>()
        )))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
