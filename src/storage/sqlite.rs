//! SQLite implementation of the catalog store.
//!
//! Documents are JSON text keyed by their natural identifiers. Version writes
//! run inside `BEGIN IMMEDIATE` and are conditioned on the stored ETag, so a
//! writer outside this process that changed the row in between is detected as
//! a conflict (zero rows affected).

use std::sync::Arc;

use async_trait::async_trait;
use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};
use sqlx::pool::PoolConnection;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::helpers::{
    check_etag, has_instance, instance_for, stamp_edition, stamp_new_version, stamp_version,
    version_resource,
};
use super::schema::{
    Datasets, Editions, Instances, Versions, CREATE_DATASETS_TABLE, CREATE_EDITIONS_TABLE,
    CREATE_INSTANCES_TABLE, CREATE_VERSIONS_TABLE,
};
use super::DataStore;
use crate::error::{CatalogError, Result};
use crate::locks::{LockId, LockManager};
use crate::models::{Dataset, DatasetUpdate, EditionUpdate, Instance, State, Version};
use crate::utils::etag;

/// SQLite implementation of DataStore.
pub struct SqliteDataStore {
    pool: SqlitePool,
    locks: Arc<LockManager>,
}

impl SqliteDataStore {
    /// Create a new SQLite store over an existing pool.
    pub fn new(pool: SqlitePool, locks: Arc<LockManager>) -> Self {
        Self { pool, locks }
    }

    /// Open (creating if needed) the database at `path` and initialize the schema.
    pub async fn connect(path: &str, locks: Arc<LockManager>) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CatalogError::InvalidConfig(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let pool = SqlitePool::connect(&format!("sqlite:{path}?mode=rwc")).await?;
        let store = Self::new(pool, locks);
        store.init().await?;
        Ok(store)
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        for ddl in [
            CREATE_DATASETS_TABLE,
            CREATE_EDITIONS_TABLE,
            CREATE_VERSIONS_TABLE,
            CREATE_INSTANCES_TABLE,
        ] {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// BEGIN IMMEDIATE takes the write lock upfront so read-then-write
    /// sequences cannot deadlock upgrading a shared lock.
    async fn begin(&self) -> Result<PoolConnection<Sqlite>> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(conn)
    }

    async fn finish<T>(conn: &mut SqliteConnection, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(value)
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(e)
            }
        }
    }

    async fn fetch_dataset(conn: &mut SqliteConnection, id: &str) -> Result<DatasetUpdate> {
        let query = Query::select()
            .column(Datasets::Document)
            .from(Datasets::Table)
            .and_where(Expr::col(Datasets::Id).eq(id))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(CatalogError::DatasetNotFound)?;
        let document: String = row.get("document");
        Ok(serde_json::from_str(&document)?)
    }

    async fn store_dataset(conn: &mut SqliteConnection, id: &str, doc: &DatasetUpdate) -> Result<()> {
        let mut doc = doc.clone();
        doc.id = id.to_string();
        let document = serde_json::to_string(&doc)?;

        let query = Query::insert()
            .into_table(Datasets::Table)
            .columns([Datasets::Id, Datasets::Document])
            .values_panic([id.into(), document.into()])
            .on_conflict(
                OnConflict::column(Datasets::Id)
                    .update_column(Datasets::Document)
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&mut *conn).await?;
        Ok(())
    }

    async fn fetch_version(
        conn: &mut SqliteConnection,
        dataset_id: &str,
        edition: &str,
        version: u32,
    ) -> Result<Option<Version>> {
        let query = Query::select()
            .column(Versions::Document)
            .from(Versions::Table)
            .and_where(Expr::col(Versions::DatasetId).eq(dataset_id))
            .and_where(Expr::col(Versions::Edition).eq(edition))
            .and_where(Expr::col(Versions::Version).eq(i64::from(version)))
            .to_string(SqliteQueryBuilder);

        match sqlx::query(&query).fetch_optional(&mut *conn).await? {
            Some(row) => {
                let document: String = row.get("document");
                Ok(Some(serde_json::from_str(&document)?))
            }
            None => Ok(None),
        }
    }

    async fn write_version(
        conn: &mut SqliteConnection,
        current: &Version,
        candidate: &Version,
        etag_selector: &str,
        mirror_instance: bool,
    ) -> Result<String> {
        let resource = version_resource(current);
        let existing =
            Self::fetch_version(conn, &current.dataset_id, &current.edition, current.version)
                .await?
                .ok_or(CatalogError::VersionNotFound)?;
        check_etag(&resource, etag_selector, &existing.e_tag)?;

        let stored = stamp_version(&existing, candidate)?;
        let document = serde_json::to_string(&stored)?;

        let query = Query::update()
            .table(Versions::Table)
            .value(Versions::ETag, stored.e_tag.clone())
            .value(Versions::Document, document)
            .and_where(Expr::col(Versions::DatasetId).eq(existing.dataset_id.as_str()))
            .and_where(Expr::col(Versions::Edition).eq(existing.edition.as_str()))
            .and_where(Expr::col(Versions::Version).eq(i64::from(existing.version)))
            .and_where(Expr::col(Versions::ETag).eq(existing.e_tag.as_str()))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&mut *conn).await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::Conflict {
                resource,
                selector: etag_selector.to_string(),
            });
        }

        if mirror_instance && !stored.id.is_empty() {
            let query = Query::update()
                .table(Instances::Table)
                .value(Instances::State, stored.state.map(|state| state.as_str()))
                .and_where(Expr::col(Instances::Id).eq(stored.id.as_str()))
                .to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *conn).await?;
        }

        debug!(resource, e_tag = %stored.e_tag, "version written");
        Ok(stored.e_tag)
    }

    async fn update(
        &self,
        current: &Version,
        candidate: &Version,
        etag_selector: &str,
        mirror_instance: bool,
    ) -> Result<String> {
        let mut conn = self.begin().await?;
        let result =
            Self::write_version(&mut conn, current, candidate, etag_selector, mirror_instance)
                .await;
        Self::finish(&mut conn, result).await
    }
}

#[async_trait]
impl DataStore for SqliteDataStore {
    async fn get_dataset(&self, id: &str) -> Result<DatasetUpdate> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_dataset(&mut conn, id).await
    }

    async fn upsert_dataset(&self, id: &str, doc: &DatasetUpdate) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::store_dataset(&mut conn, id, doc).await
    }

    async fn update_dataset_with_association(
        &self,
        dataset_id: &str,
        state: State,
        version: &Version,
    ) -> Result<()> {
        let mut conn = self.begin().await?;
        let result: Result<()> = async {
            let mut doc = Self::fetch_dataset(&mut conn, dataset_id).await?;
            doc.next
                .get_or_insert_with(|| Dataset {
                    id: dataset_id.to_string(),
                    ..Default::default()
                })
                .associate(state, version);
            Self::store_dataset(&mut conn, dataset_id, &doc).await
        }
        .await;
        Self::finish(&mut conn, result).await
    }

    async fn get_edition(
        &self,
        dataset_id: &str,
        edition: &str,
        etag: &str,
    ) -> Result<EditionUpdate> {
        let query = Query::select()
            .column(Editions::Document)
            .from(Editions::Table)
            .and_where(Expr::col(Editions::DatasetId).eq(dataset_id))
            .and_where(Expr::col(Editions::Edition).eq(edition))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CatalogError::EditionNotFound)?;
        let document: String = row.get("document");
        let doc: EditionUpdate = serde_json::from_str(&document)?;

        if etag::matches(etag, &doc.e_tag) {
            Ok(doc)
        } else {
            Err(CatalogError::EditionNotFound)
        }
    }

    async fn upsert_edition(
        &self,
        dataset_id: &str,
        edition: &str,
        doc: &EditionUpdate,
    ) -> Result<()> {
        let stored = stamp_edition(doc)?;
        let document = serde_json::to_string(&stored)?;

        let query = Query::insert()
            .into_table(Editions::Table)
            .columns([
                Editions::DatasetId,
                Editions::Edition,
                Editions::ETag,
                Editions::Document,
            ])
            .values_panic([
                dataset_id.into(),
                edition.into(),
                stored.e_tag.into(),
                document.into(),
            ])
            .on_conflict(
                OnConflict::columns([Editions::DatasetId, Editions::Edition])
                    .update_columns([Editions::ETag, Editions::Document])
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    async fn add_version(&self, version: &Version) -> Result<String> {
        let stored = stamp_new_version(version)?;
        let document = serde_json::to_string(&stored)?;

        let mut conn = self.begin().await?;
        let result: Result<String> = async {
            let query = Query::insert()
                .into_table(Versions::Table)
                .columns([
                    Versions::DatasetId,
                    Versions::Edition,
                    Versions::Version,
                    Versions::ETag,
                    Versions::Document,
                ])
                .values_panic([
                    stored.dataset_id.as_str().into(),
                    stored.edition.as_str().into(),
                    i64::from(stored.version).into(),
                    stored.e_tag.as_str().into(),
                    document.into(),
                ])
                .on_conflict(
                    OnConflict::columns([
                        Versions::DatasetId,
                        Versions::Edition,
                        Versions::Version,
                    ])
                    .update_columns([Versions::ETag, Versions::Document])
                    .to_owned(),
                )
                .to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *conn).await?;

            if has_instance(&stored) {
                let instance = instance_for(&stored);
                let query = Query::insert()
                    .into_table(Instances::Table)
                    .columns([Instances::Id, Instances::State, Instances::IsPublished])
                    .values_panic([
                        instance.id.into(),
                        instance.state.map(|state| state.as_str()).into(),
                        instance.is_published.into(),
                    ])
                    .on_conflict(
                        OnConflict::column(Instances::Id)
                            .update_columns([Instances::State, Instances::IsPublished])
                            .to_owned(),
                    )
                    .to_string(SqliteQueryBuilder);
                sqlx::query(&query).execute(&mut *conn).await?;
            }
            Ok(stored.e_tag.clone())
        }
        .await;
        Self::finish(&mut conn, result).await
    }

    async fn get_version(
        &self,
        dataset_id: &str,
        edition: &str,
        version: u32,
        etag: &str,
    ) -> Result<Version> {
        let mut conn = self.pool.acquire().await?;
        match Self::fetch_version(&mut conn, dataset_id, edition, version).await? {
            Some(doc) if etag::matches(etag, &doc.e_tag) => Ok(doc),
            _ => Err(CatalogError::VersionNotFound),
        }
    }

    async fn update_version(
        &self,
        current: &Version,
        candidate: &Version,
        etag_selector: &str,
    ) -> Result<String> {
        self.update(current, candidate, etag_selector, true).await
    }

    async fn update_version_static(
        &self,
        current: &Version,
        candidate: &Version,
        etag_selector: &str,
    ) -> Result<String> {
        self.update(current, candidate, etag_selector, false).await
    }

    async fn get_instance(&self, id: &str) -> Result<Instance> {
        let query = Query::select()
            .columns([Instances::Id, Instances::State, Instances::IsPublished])
            .from(Instances::Table)
            .and_where(Expr::col(Instances::Id).eq(id))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CatalogError::InstanceNotFound)?;

        let state: Option<String> = row.get("state");
        let is_published: i64 = row.get("is_published");
        Ok(Instance {
            id: row.get("id"),
            state: state.as_deref().map(str::parse).transpose()?,
            is_published: is_published != 0,
        })
    }

    async fn set_instance_is_published(&self, instance_id: &str) -> Result<()> {
        let query = Query::update()
            .table(Instances::Table)
            .value(Instances::IsPublished, true)
            .value(Instances::State, State::Published.as_str())
            .and_where(Expr::col(Instances::Id).eq(instance_id))
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::InstanceNotFound);
        }
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
