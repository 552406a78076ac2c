//! Per-resource mutual exclusion for the read-merge-write cycle.
//!
//! The [`LockManager`] owns every held guard; callers only hold an opaque
//! [`LockId`] and hand it back to release. A key is locked by at most one
//! token at a time. Both lock kinds share one key space, so a version guarded
//! through the instance lock and through the versions lock is still exclusive.
//!
//! # Example
//!
//! ```rust,ignore
//! let locks = LockManager::new(Duration::from_secs(10));
//! let id = locks.acquire("cpih01/time-series/3").await?;
//! // critical section
//! locks.release(&id).await;
//! ```

mod lease;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{CatalogError, Result};
use crate::models::DatasetType;

pub use lease::LockLease;

/// Default time to wait for a contended lock.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Opaque lock token. Only equality is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockId(String);

impl LockId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which lock guards a version: import instances for legacy and cantabular
/// types, the versions collection for static datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Instance,
    Versions,
}

impl LockKind {
    pub fn for_type(dataset_type: DatasetType) -> Self {
        if dataset_type.is_static() {
            LockKind::Versions
        } else {
            LockKind::Instance
        }
    }
}

struct HeldLock {
    key: String,
    _guard: OwnedMutexGuard<()>,
}

/// In-process lock arena.
pub struct LockManager {
    resources: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    held: Mutex<HashMap<LockId, HeldLock>>,
    acquire_timeout: Duration,
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new(DEFAULT_ACQUIRE_TIMEOUT)
    }
}

impl LockManager {
    pub fn new(acquire_timeout: Duration) -> Self {
        Self {
            resources: Mutex::new(HashMap::new()),
            held: Mutex::new(HashMap::new()),
            acquire_timeout,
        }
    }

    /// Wait for `key` to be free and take it.
    pub async fn acquire(&self, key: &str) -> Result<LockId> {
        let resource = {
            let mut resources = self.resources.lock().await;
            Arc::clone(resources.entry(key.to_string()).or_default())
        };

        let guard = tokio::time::timeout(self.acquire_timeout, resource.lock_owned())
            .await
            .map_err(|_| CatalogError::LockAcquisition {
                key: key.to_string(),
                reason: format!("timed out after {:?}", self.acquire_timeout),
            })?;

        let lock_id = LockId::generate();
        self.held.lock().await.insert(
            lock_id.clone(),
            HeldLock {
                key: key.to_string(),
                _guard: guard,
            },
        );
        debug!(key, %lock_id, "lock acquired");
        Ok(lock_id)
    }

    /// Release a held token. Returns false for unknown or already released tokens.
    pub async fn release(&self, lock_id: &LockId) -> bool {
        let Some(held) = self.held.lock().await.remove(lock_id) else {
            warn!(%lock_id, "release of unknown lock");
            return false;
        };
        let key = held.key.clone();
        drop(held);

        let mut resources = self.resources.lock().await;
        if resources
            .get(&key)
            .is_some_and(|resource| Arc::strong_count(resource) == 1)
        {
            resources.remove(&key);
        }
        debug!(key, %lock_id, "lock released");
        true
    }

    /// Whether some token currently holds `key`.
    pub async fn is_locked(&self, key: &str) -> bool {
        self.held.lock().await.values().any(|held| held.key == key)
    }

    /// Number of tokens currently held.
    pub async fn held_count(&self) -> usize {
        self.held.lock().await.len()
    }
}
