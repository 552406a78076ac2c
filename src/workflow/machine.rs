//! Orchestrator: one `amend_version` call drives one transition.
//!
//! Pipeline: resolve identifiers → lock → read → merge → validate →
//! transition check → state handler → unlock.
//!
//! The lock is taken before any version or dataset document is read so two
//! requests against the same version cannot both decide a transition from the
//! same stored state. Only the dataset's type is looked up first, to pick the
//! lock kind.
//! It is released exactly once on every exit path, including a missed
//! deadline.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::handlers::{HandlerRegistry, TransitionContext};
use super::merge::combine;
use super::transitions::TransitionTable;
use super::validate::{validate_dataset_type, validate_version};
use crate::config::Config;
use crate::downloads::DownloadsRegistry;
use crate::error::{CatalogError, Result};
use crate::locks::{LockKind, LockLease};
use crate::models::{Version, VersionDetails, VersionIdentifiers};
use crate::storage::DataStore;
use crate::utils::etag::ANY_ETAG;

/// Per-request options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmendOptions {
    /// ETag selector for reading the current version (`*` for any).
    pub if_match: String,
    /// Caller states download artifacts already exist; skips generator triggers.
    pub has_downloads: bool,
}

impl Default for AmendOptions {
    fn default() -> Self {
        Self {
            if_match: ANY_ETAG.to_string(),
            has_downloads: false,
        }
    }
}

impl AmendOptions {
    pub fn if_match(mut self, etag: impl Into<String>) -> Self {
        self.if_match = etag.into();
        self
    }

    pub fn has_downloads(mut self, has_downloads: bool) -> Self {
        self.has_downloads = has_downloads;
        self
    }
}

/// Version publishing state machine.
pub struct StateMachine {
    store: Arc<dyn DataStore>,
    transitions: TransitionTable,
    handlers: HandlerRegistry,
    downloads: DownloadsRegistry,
    amend_timeout: Option<Duration>,
}

impl StateMachine {
    /// Built-in transition table and handlers, no downloads generators.
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            store,
            transitions: TransitionTable::default_table(),
            handlers: HandlerRegistry::default(),
            downloads: DownloadsRegistry::new(),
            amend_timeout: None,
        }
    }

    /// Build from configuration: optional transition table override,
    /// HTTP downloads generators and the per-call deadline.
    pub fn from_config(store: Arc<dyn DataStore>, config: &Config) -> Result<Self> {
        let transitions = match &config.workflow.transitions {
            Some(rules) => TransitionTable::new(rules.iter().cloned())?,
            None => TransitionTable::default_table(),
        };
        let downloads = DownloadsRegistry::from_config(&config.downloads)?;

        info!(
            rules = transitions.len(),
            amend_timeout = ?config.workflow.amend_timeout(),
            "state machine configured"
        );

        Ok(Self::new(store)
            .with_transitions(transitions)
            .with_downloads(downloads)
            .with_amend_timeout(config.workflow.amend_timeout()))
    }

    pub fn with_transitions(mut self, transitions: TransitionTable) -> Self {
        self.transitions = transitions;
        self
    }

    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn with_downloads(mut self, downloads: DownloadsRegistry) -> Self {
        self.downloads = downloads;
        self
    }

    pub fn with_amend_timeout(mut self, amend_timeout: Option<Duration>) -> Self {
        self.amend_timeout = amend_timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Apply `update` to the version named by `identifiers` and move it into
    /// `update.state`. Returns the persisted version with its new ETag.
    #[tracing::instrument(
        name = "workflow.amend_version",
        skip_all,
        fields(
            dataset_id = %identifiers.dataset_id,
            edition = %identifiers.edition,
            version = %identifiers.version,
            state = ?update.state,
        )
    )]
    pub async fn amend_version(
        &self,
        identifiers: &VersionIdentifiers,
        update: Version,
        options: AmendOptions,
    ) -> Result<Version> {
        let details = identifiers.resolve()?;
        // Ignored by the merge, but must still name a known type
        if !update.dataset_type.is_empty() {
            validate_dataset_type(&update.dataset_type)?;
        }
        let kind = self.lock_kind_for(&details).await;

        let lease = LockLease::acquire(Arc::clone(&self.store), kind, &details.resource_key())
            .await
            .inspect_err(|e| warn!(error = %e, "failed to lock version"))?;
        debug!(key = lease.key(), kind = ?lease.kind(), "version locked");

        let result = match self.amend_timeout {
            Some(deadline) => {
                match tokio::time::timeout(deadline, self.amend_locked(&details, &update, &options))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(CatalogError::Timeout(deadline)),
                }
            }
            None => self.amend_locked(&details, &update, &options).await,
        };

        lease.release().await;

        match &result {
            Ok(persisted) => info!(
                state = ?persisted.state,
                e_tag = %persisted.e_tag,
                "version amended"
            ),
            Err(e) => warn!(error = %e, kind = ?e.kind(), "version amend failed"),
        }
        result
    }

    async fn amend_locked(
        &self,
        details: &VersionDetails,
        update: &Version,
        options: &AmendOptions,
    ) -> Result<Version> {
        let store = self.store.as_ref();

        let dataset = store.get_dataset(&details.dataset_id).await?;
        store
            .check_edition_exists(&details.dataset_id, &details.edition, None)
            .await?;
        let current = store
            .get_version(
                &details.dataset_id,
                &details.edition,
                details.version,
                &options.if_match,
            )
            .await?;

        let candidate = combine(&current, update);
        validate_version(&candidate)?;

        let target = candidate.state.ok_or(CatalogError::MissingState)?;
        let dataset_type = candidate.resolved_type()?;
        if let Err(e) = self.transitions.check(current.state, target, dataset_type) {
            debug!(
                from = ?current.state,
                to = %target,
                dataset_type = %dataset_type,
                "transition rejected"
            );
            return Err(e);
        }

        let handler = self.handlers.get(target)?;
        let ctx = TransitionContext {
            store,
            downloads: &self.downloads,
            transitions: &self.transitions,
            details,
            dataset: &dataset,
            current: &current,
            candidate: &candidate,
            update,
            if_match: &options.if_match,
            has_downloads: options.has_downloads,
        };
        handler.handle(&ctx).await
    }

    /// Static datasets take the versions lock, everything else the instance
    /// lock. A failed lookup falls back to the instance lock; both kinds share
    /// one key space and the locked read reports the real error.
    async fn lock_kind_for(&self, details: &VersionDetails) -> LockKind {
        match self.store.get_dataset_type(&details.dataset_id, true).await {
            Ok(dataset_type) => LockKind::for_type(dataset_type),
            Err(e) => {
                debug!(error = %e, "dataset type lookup failed, taking the instance lock");
                LockKind::Instance
            }
        }
    }
}
