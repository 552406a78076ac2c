//! Mock storage implementation for testing.
//!
//! [`MockDataStore`] delegates to a [`MemoryDataStore`], counts every call
//! per method name and replays queued one-shot failures, so tests can assert
//! on call counts ("lock acquired once, released once") and force any
//! collaborator error at a chosen point.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DataStore, MemoryDataStore};
use crate::error::{CatalogError, Result};
use crate::locks::{LockId, LockManager};
use crate::models::{DatasetType, DatasetUpdate, EditionUpdate, Instance, State, Version};

/// Method names accepted by [`MockDataStore::calls`] and [`MockDataStore::push_failure`].
pub mod method {
    pub const GET_DATASET: &str = "get_dataset";
    pub const UPSERT_DATASET: &str = "upsert_dataset";
    pub const UPDATE_DATASET_WITH_ASSOCIATION: &str = "update_dataset_with_association";
    pub const GET_DATASET_TYPE: &str = "get_dataset_type";
    pub const GET_EDITION: &str = "get_edition";
    pub const UPSERT_EDITION: &str = "upsert_edition";
    pub const CHECK_EDITION_EXISTS: &str = "check_edition_exists";
    pub const ADD_VERSION: &str = "add_version";
    pub const GET_VERSION: &str = "get_version";
    pub const UPDATE_VERSION: &str = "update_version";
    pub const UPDATE_VERSION_STATIC: &str = "update_version_static";
    pub const GET_INSTANCE: &str = "get_instance";
    pub const SET_INSTANCE_IS_PUBLISHED: &str = "set_instance_is_published";
    pub const ACQUIRE_INSTANCE_LOCK: &str = "acquire_instance_lock";
    pub const UNLOCK_INSTANCE: &str = "unlock_instance";
    pub const ACQUIRE_VERSIONS_LOCK: &str = "acquire_versions_lock";
    pub const UNLOCK_VERSIONS: &str = "unlock_versions";
}

/// Mock data store with call counting and failure injection.
#[derive(Default)]
pub struct MockDataStore {
    inner: MemoryDataStore,
    calls: RwLock<HashMap<&'static str, usize>>,
    failures: RwLock<HashMap<&'static str, VecDeque<CatalogError>>>,
}

impl MockDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locks(locks: Arc<LockManager>) -> Self {
        Self {
            inner: MemoryDataStore::with_locks(locks),
            calls: RwLock::default(),
            failures: RwLock::default(),
        }
    }

    /// The wrapped store, for seeding documents without counting calls.
    pub fn inner(&self) -> &MemoryDataStore {
        &self.inner
    }

    /// Number of times `method` has been called.
    pub async fn calls(&self, method: &str) -> usize {
        self.calls.read().await.get(method).copied().unwrap_or(0)
    }

    /// Total lock acquisitions across both lock kinds.
    pub async fn lock_acquires(&self) -> usize {
        self.calls(method::ACQUIRE_INSTANCE_LOCK).await
            + self.calls(method::ACQUIRE_VERSIONS_LOCK).await
    }

    /// Total lock releases across both lock kinds.
    pub async fn lock_releases(&self) -> usize {
        self.calls(method::UNLOCK_INSTANCE).await + self.calls(method::UNLOCK_VERSIONS).await
    }

    pub async fn reset_calls(&self) {
        self.calls.write().await.clear();
    }

    /// Fail the next call to `method` with `err`. Queued failures are
    /// consumed in order, one per call.
    pub async fn push_failure(&self, method: &'static str, err: CatalogError) {
        self.failures
            .write()
            .await
            .entry(method)
            .or_default()
            .push_back(err);
    }

    async fn record(&self, method: &'static str) -> Result<()> {
        *self.calls.write().await.entry(method).or_insert(0) += 1;
        match self
            .failures
            .write()
            .await
            .get_mut(method)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataStore for MockDataStore {
    async fn get_dataset(&self, id: &str) -> Result<DatasetUpdate> {
        self.record(method::GET_DATASET).await?;
        self.inner.get_dataset(id).await
    }

    async fn upsert_dataset(&self, id: &str, doc: &DatasetUpdate) -> Result<()> {
        self.record(method::UPSERT_DATASET).await?;
        self.inner.upsert_dataset(id, doc).await
    }

    async fn update_dataset_with_association(
        &self,
        dataset_id: &str,
        state: State,
        version: &Version,
    ) -> Result<()> {
        self.record(method::UPDATE_DATASET_WITH_ASSOCIATION).await?;
        self.inner
            .update_dataset_with_association(dataset_id, state, version)
            .await
    }

    async fn get_dataset_type(&self, dataset_id: &str, authorised: bool) -> Result<DatasetType> {
        self.record(method::GET_DATASET_TYPE).await?;
        self.inner.get_dataset_type(dataset_id, authorised).await
    }

    async fn get_edition(
        &self,
        dataset_id: &str,
        edition: &str,
        etag: &str,
    ) -> Result<EditionUpdate> {
        self.record(method::GET_EDITION).await?;
        self.inner.get_edition(dataset_id, edition, etag).await
    }

    async fn upsert_edition(
        &self,
        dataset_id: &str,
        edition: &str,
        doc: &EditionUpdate,
    ) -> Result<()> {
        self.record(method::UPSERT_EDITION).await?;
        self.inner.upsert_edition(dataset_id, edition, doc).await
    }

    async fn check_edition_exists(
        &self,
        dataset_id: &str,
        edition: &str,
        state: Option<State>,
    ) -> Result<()> {
        self.record(method::CHECK_EDITION_EXISTS).await?;
        self.inner
            .check_edition_exists(dataset_id, edition, state)
            .await
    }

    async fn add_version(&self, version: &Version) -> Result<String> {
        self.record(method::ADD_VERSION).await?;
        self.inner.add_version(version).await
    }

    async fn get_version(
        &self,
        dataset_id: &str,
        edition: &str,
        version: u32,
        etag: &str,
    ) -> Result<Version> {
        self.record(method::GET_VERSION).await?;
        self.inner
            .get_version(dataset_id, edition, version, etag)
            .await
    }

    async fn update_version(
        &self,
        current: &Version,
        candidate: &Version,
        etag_selector: &str,
    ) -> Result<String> {
        self.record(method::UPDATE_VERSION).await?;
        self.inner
            .update_version(current, candidate, etag_selector)
            .await
    }

    async fn update_version_static(
        &self,
        current: &Version,
        candidate: &Version,
        etag_selector: &str,
    ) -> Result<String> {
        self.record(method::UPDATE_VERSION_STATIC).await?;
        self.inner
            .update_version_static(current, candidate, etag_selector)
            .await
    }

    async fn get_instance(&self, id: &str) -> Result<Instance> {
        self.record(method::GET_INSTANCE).await?;
        self.inner.get_instance(id).await
    }

    async fn set_instance_is_published(&self, instance_id: &str) -> Result<()> {
        self.record(method::SET_INSTANCE_IS_PUBLISHED).await?;
        self.inner.set_instance_is_published(instance_id).await
    }

    async fn acquire_instance_lock(&self, instance_id: &str) -> Result<LockId> {
        self.record(method::ACQUIRE_INSTANCE_LOCK).await?;
        self.inner.acquire_instance_lock(instance_id).await
    }

    async fn unlock_instance(&self, lock_id: &LockId) {
        // Release cannot fail; a queued failure is simply consumed.
        let _ = self.record(method::UNLOCK_INSTANCE).await;
        self.inner.unlock_instance(lock_id).await
    }

    async fn acquire_versions_lock(&self, key: &str) -> Result<LockId> {
        self.record(method::ACQUIRE_VERSIONS_LOCK).await?;
        self.inner.acquire_versions_lock(key).await
    }

    async fn unlock_versions(&self, lock_id: &LockId) {
        let _ = self.record(method::UNLOCK_VERSIONS).await;
        self.inner.unlock_versions(lock_id).await
    }
}
