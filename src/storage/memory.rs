//! In-memory `DataStore` backed by `tokio::sync::RwLock` maps.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::helpers::{
    check_etag, has_instance, instance_for, stamp_edition, stamp_new_version, stamp_version,
    version_resource,
};
use super::DataStore;
use crate::error::{CatalogError, Result};
use crate::locks::{LockId, LockManager};
use crate::models::{Dataset, DatasetUpdate, EditionUpdate, Instance, State, Version};
use crate::utils::etag;

type EditionKey = (String, String);
type VersionKey = (String, String, u32);

fn edition_key(dataset_id: &str, edition: &str) -> EditionKey {
    (dataset_id.to_string(), edition.to_string())
}

fn version_key(dataset_id: &str, edition: &str, version: u32) -> VersionKey {
    (dataset_id.to_string(), edition.to_string(), version)
}

/// Catalog store held entirely in process memory.
pub struct MemoryDataStore {
    datasets: RwLock<HashMap<String, DatasetUpdate>>,
    editions: RwLock<HashMap<EditionKey, EditionUpdate>>,
    versions: RwLock<HashMap<VersionKey, Version>>,
    instances: RwLock<HashMap<String, Instance>>,
    locks: Arc<LockManager>,
}

impl Default for MemoryDataStore {
    fn default() -> Self {
        Self::with_locks(Arc::new(LockManager::default()))
    }
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locks(locks: Arc<LockManager>) -> Self {
        Self {
            datasets: RwLock::new(HashMap::new()),
            editions: RwLock::new(HashMap::new()),
            versions: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            locks,
        }
    }

    /// The lock arena shared by both lock kinds.
    pub fn locks(&self) -> &Arc<LockManager> {
        &self.locks
    }

    async fn write_version(
        &self,
        current: &Version,
        candidate: &Version,
        etag_selector: &str,
        mirror_instance: bool,
    ) -> Result<String> {
        let key = version_key(&current.dataset_id, &current.edition, current.version);
        let resource = version_resource(current);

        let stored = {
            let mut versions = self.versions.write().await;
            let existing = versions.get(&key).ok_or(CatalogError::VersionNotFound)?;
            check_etag(&resource, etag_selector, &existing.e_tag)?;

            let stored = stamp_version(existing, candidate)?;
            versions.insert(key, stored.clone());
            stored
        };

        if mirror_instance && !stored.id.is_empty() {
            if let Some(instance) = self.instances.write().await.get_mut(&stored.id) {
                instance.state = stored.state;
            }
        }

        debug!(resource, e_tag = %stored.e_tag, "version written");
        Ok(stored.e_tag)
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn get_dataset(&self, id: &str) -> Result<DatasetUpdate> {
        self.datasets
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(CatalogError::DatasetNotFound)
    }

    async fn upsert_dataset(&self, id: &str, doc: &DatasetUpdate) -> Result<()> {
        let mut doc = doc.clone();
        doc.id = id.to_string();
        self.datasets.write().await.insert(id.to_string(), doc);
        Ok(())
    }

    async fn update_dataset_with_association(
        &self,
        dataset_id: &str,
        state: State,
        version: &Version,
    ) -> Result<()> {
        let mut datasets = self.datasets.write().await;
        let doc = datasets
            .get_mut(dataset_id)
            .ok_or(CatalogError::DatasetNotFound)?;
        doc.next
            .get_or_insert_with(|| Dataset {
                id: dataset_id.to_string(),
                ..Default::default()
            })
            .associate(state, version);
        Ok(())
    }

    async fn get_edition(
        &self,
        dataset_id: &str,
        edition: &str,
        etag: &str,
    ) -> Result<EditionUpdate> {
        let editions = self.editions.read().await;
        match editions.get(&edition_key(dataset_id, edition)) {
            Some(doc) if etag::matches(etag, &doc.e_tag) => Ok(doc.clone()),
            _ => Err(CatalogError::EditionNotFound),
        }
    }

    async fn upsert_edition(
        &self,
        dataset_id: &str,
        edition: &str,
        doc: &EditionUpdate,
    ) -> Result<()> {
        let stored = stamp_edition(doc)?;
        self.editions
            .write()
            .await
            .insert(edition_key(dataset_id, edition), stored);
        Ok(())
    }

    async fn add_version(&self, version: &Version) -> Result<String> {
        let stored = stamp_new_version(version)?;
        let key = version_key(&stored.dataset_id, &stored.edition, stored.version);

        if has_instance(&stored) {
            self.instances
                .write()
                .await
                .insert(stored.id.clone(), instance_for(&stored));
        }

        let e_tag = stored.e_tag.clone();
        self.versions.write().await.insert(key, stored);
        Ok(e_tag)
    }

    async fn get_version(
        &self,
        dataset_id: &str,
        edition: &str,
        version: u32,
        etag: &str,
    ) -> Result<Version> {
        let versions = self.versions.read().await;
        match versions.get(&version_key(dataset_id, edition, version)) {
            Some(doc) if etag::matches(etag, &doc.e_tag) => Ok(doc.clone()),
            _ => Err(CatalogError::VersionNotFound),
        }
    }

    async fn update_version(
        &self,
        current: &Version,
        candidate: &Version,
        etag_selector: &str,
    ) -> Result<String> {
        self.write_version(current, candidate, etag_selector, true)
            .await
    }

    async fn update_version_static(
        &self,
        current: &Version,
        candidate: &Version,
        etag_selector: &str,
    ) -> Result<String> {
        self.write_version(current, candidate, etag_selector, false)
            .await
    }

    async fn get_instance(&self, id: &str) -> Result<Instance> {
        self.instances
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(CatalogError::InstanceNotFound)
    }

    async fn set_instance_is_published(&self, instance_id: &str) -> Result<()> {
        let mut instances = self.instances.write().await;
        let instance = instances
            .get_mut(instance_id)
            .ok_or(CatalogError::InstanceNotFound)?;
        instance.is_published = true;
        instance.state = Some(State::Published);
        debug!(instance_id, "instance published");
        Ok(())
    }

    async fn acquire_instance_lock(&self, instance_id: &str) -> Result<LockId> {
        self.locks.acquire(instance_id).await
    }

    async fn unlock_instance(&self, lock_id: &LockId) {
        self.locks.release(lock_id).await;
    }

    async fn acquire_versions_lock(&self, key: &str) -> Result<LockId> {
        self.locks.acquire(key).await
    }

    async fn unlock_versions(&self, lock_id: &LockId) {
        self.locks.release(lock_id).await;
    }
}
