//! Storage implementations.
//!
//! [`DataStore`] is the contract the publishing workflow consumes: read the
//! current documents, conditionally write a new version, upsert the parent
//! Current/Next documents, and take/release per-resource locks.
//!
//! Implementations:
//! - `MemoryDataStore`: in-process maps, default for local development
//! - `SqliteDataStore`: SQLite via sqlx + sea-query (feature `sqlite`)
//! - `mock::MockDataStore`: call counting and failure injection for tests

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::{StorageConfig, StorageType};
use crate::error::{CatalogError, Result};
use crate::locks::{LockId, LockManager};
use crate::models::{DatasetType, DatasetUpdate, EditionUpdate, Instance, State, Version};

pub mod helpers;
pub mod memory;
pub mod mock;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryDataStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDataStore;

/// Interface for catalog document persistence.
///
/// Every version write is conditioned on an ETag selector; `"*"` disables the
/// check. A selector that no longer matches the stored document fails with
/// [`CatalogError::Conflict`].
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Fetch a dataset with both of its halves.
    async fn get_dataset(&self, id: &str) -> Result<DatasetUpdate>;

    /// Replace a dataset document wholesale.
    async fn upsert_dataset(&self, id: &str, doc: &DatasetUpdate) -> Result<()>;

    /// Write association metadata for `version` into the dataset's Next.
    async fn update_dataset_with_association(
        &self,
        dataset_id: &str,
        state: State,
        version: &Version,
    ) -> Result<()>;

    /// Resolve the dataset's type; authorised readers see Next.
    async fn get_dataset_type(&self, dataset_id: &str, authorised: bool) -> Result<DatasetType> {
        let dataset = self.get_dataset(dataset_id).await?;
        let raw = dataset
            .type_for(authorised)
            .ok_or(CatalogError::DatasetNotFound)?;
        DatasetType::resolve(raw)
    }

    /// Fetch an edition; a non-wildcard `etag` must match the stored one.
    async fn get_edition(&self, dataset_id: &str, edition: &str, etag: &str)
        -> Result<EditionUpdate>;

    /// Replace an edition document wholesale.
    async fn upsert_edition(&self, dataset_id: &str, edition: &str, doc: &EditionUpdate)
        -> Result<()>;

    /// Succeeds when the edition exists (and, if given, is currently in `state`).
    async fn check_edition_exists(
        &self,
        dataset_id: &str,
        edition: &str,
        state: Option<State>,
    ) -> Result<()> {
        let doc = self
            .get_edition(dataset_id, edition, crate::utils::etag::ANY_ETAG)
            .await?;
        match state {
            None => Ok(()),
            Some(wanted) => {
                let current_state = doc.current.as_ref().and_then(|current| current.state);
                if current_state == Some(wanted) {
                    Ok(())
                } else {
                    Err(CatalogError::EditionNotFound)
                }
            }
        }
    }

    /// Insert a new version, returning its ETag. Non-static versions also get
    /// a backing instance keyed by the version's `id`.
    async fn add_version(&self, version: &Version) -> Result<String>;

    /// Fetch a version; a non-wildcard `etag` must match the stored one.
    async fn get_version(
        &self,
        dataset_id: &str,
        edition: &str,
        version: u32,
        etag: &str,
    ) -> Result<Version>;

    /// Conditionally replace `current` with `candidate`, mirroring the new
    /// state into the backing instance. Returns the new ETag.
    async fn update_version(
        &self,
        current: &Version,
        candidate: &Version,
        etag_selector: &str,
    ) -> Result<String>;

    /// Conditionally replace a static version (no backing instance).
    async fn update_version_static(
        &self,
        current: &Version,
        candidate: &Version,
        etag_selector: &str,
    ) -> Result<String>;

    async fn get_instance(&self, id: &str) -> Result<Instance>;

    async fn set_instance_is_published(&self, instance_id: &str) -> Result<()>;

    async fn acquire_instance_lock(&self, instance_id: &str) -> Result<LockId>;

    async fn unlock_instance(&self, lock_id: &LockId);

    async fn acquire_versions_lock(&self, key: &str) -> Result<LockId>;

    async fn unlock_versions(&self, lock_id: &LockId);
}

/// Initialize storage based on configuration.
pub async fn init_storage(
    config: &StorageConfig,
    lock_timeout: Duration,
) -> Result<Arc<dyn DataStore>> {
    let locks = Arc::new(LockManager::new(lock_timeout));

    match config.storage_type {
        StorageType::Memory => {
            info!("Storage: in-memory");
            Ok(Arc::new(MemoryDataStore::with_locks(locks)))
        }
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            info!("Storage: sqlite at {}", config.sqlite.path);
            let store = SqliteDataStore::connect(&config.sqlite.path, locks).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => {
            tracing::error!("SQLite storage requested but 'sqlite' feature is not enabled");
            Err(CatalogError::InvalidConfig(
                "sqlite feature not enabled".to_string(),
            ))
        }
    }
}
