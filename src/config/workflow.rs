//! Workflow, lock and downloads-trigger configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::workflow::Transition;

/// Default lock acquire timeout in milliseconds.
pub const DEFAULT_LOCK_ACQUIRE_TIMEOUT_MS: u64 = 10_000;

/// Default timeout for one downloads trigger request in milliseconds.
pub const DEFAULT_DOWNLOADS_TIMEOUT_MS: u64 = 5_000;

/// Resource lock configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// How long to wait for a contended lock before failing.
    pub acquire_timeout_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            acquire_timeout_ms: DEFAULT_LOCK_ACQUIRE_TIMEOUT_MS,
        }
    }
}

impl LockConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

/// Endpoints that kick off download artifact generation.
///
/// Dataset types whose endpoint is unset have no generator; transitions that
/// need one fail with a dependency error.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadsConfig {
    /// Trigger endpoint for filterable (CMD) datasets.
    pub cmd_url: Option<String>,
    /// Trigger endpoint for cantabular datasets.
    pub cantabular_url: Option<String>,
    /// Per-request timeout.
    pub timeout_ms: u64,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            cmd_url: None,
            cantabular_url: None,
            timeout_ms: DEFAULT_DOWNLOADS_TIMEOUT_MS,
        }
    }
}

/// Publishing workflow configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Deadline for one amend call, lock wait excluded. Unset means no deadline.
    pub amend_timeout_ms: Option<u64>,
    /// Replaces the built-in transition table when set.
    pub transitions: Option<Vec<Transition>>,
}

impl WorkflowConfig {
    pub fn amend_timeout(&self) -> Option<Duration> {
        self.amend_timeout_ms.map(Duration::from_millis)
    }
}
