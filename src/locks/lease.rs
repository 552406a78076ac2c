//! Lock lease: acquire once, release exactly once.

use std::sync::Arc;

use tracing::{error, warn};

use super::{LockId, LockKind};
use crate::error::Result;
use crate::storage::DataStore;

/// A held resource lock bound to the store that issued it.
///
/// Call [`LockLease::release`] on every exit path. If the lease is dropped
/// without being released (the owning future was cancelled), release is
/// scheduled on the current runtime instead.
pub struct LockLease {
    store: Arc<dyn DataStore>,
    kind: LockKind,
    key: String,
    lock_id: Option<LockId>,
}

impl LockLease {
    pub async fn acquire(store: Arc<dyn DataStore>, kind: LockKind, key: &str) -> Result<Self> {
        let lock_id = match kind {
            LockKind::Instance => store.acquire_instance_lock(key).await?,
            LockKind::Versions => store.acquire_versions_lock(key).await?,
        };
        Ok(Self {
            store,
            kind,
            key: key.to_string(),
            lock_id: Some(lock_id),
        })
    }

    pub fn kind(&self) -> LockKind {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn release(mut self) {
        if let Some(lock_id) = self.lock_id.take() {
            unlock(self.store.as_ref(), self.kind, &lock_id).await;
        }
    }
}

async fn unlock(store: &dyn DataStore, kind: LockKind, lock_id: &LockId) {
    match kind {
        LockKind::Instance => store.unlock_instance(lock_id).await,
        LockKind::Versions => store.unlock_versions(lock_id).await,
    }
}

impl Drop for LockLease {
    fn drop(&mut self) {
        let Some(lock_id) = self.lock_id.take() else {
            return;
        };
        warn!(key = %self.key, %lock_id, "lock lease dropped without release");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                let kind = self.kind;
                handle.spawn(async move {
                    unlock(store.as_ref(), kind, &lock_id).await;
                });
            }
            Err(_) => {
                error!(key = %self.key, %lock_id, "no runtime to release dropped lock lease");
            }
        }
    }
}
