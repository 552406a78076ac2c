//! State handlers: the side effects of entering each target state.
//!
//! Handlers run only after the transition table has accepted the move. Each
//! persists the version itself (through [`persist_version`]) and then
//! performs its cascade. Cascades have no compensation: a failure after the
//! version write leaves that write committed, and the caller resubmits.
//!
//! [`persist_version`]: super::persist::persist_version

mod associated;
mod draft;
mod edition_confirmed;
mod published;
mod terminal;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::downloads::DownloadsRegistry;
use crate::error::{CatalogError, Result};
use crate::models::{DatasetType, DatasetUpdate, State, Version, VersionDetails};
use crate::storage::DataStore;
use crate::workflow::transitions::TransitionTable;

pub use associated::AssociatedHandler;
pub use draft::DraftHandler;
pub use edition_confirmed::EditionConfirmedHandler;
pub use published::PublishedHandler;
pub use terminal::TerminalHandler;

/// Everything a handler needs for one transition.
pub struct TransitionContext<'a> {
    pub store: &'a dyn DataStore,
    pub downloads: &'a DownloadsRegistry,
    /// Rules the move was accepted under; re-checked after a lost race.
    pub transitions: &'a TransitionTable,
    pub details: &'a VersionDetails,
    /// Owning dataset as read before the transition.
    pub dataset: &'a DatasetUpdate,
    /// Stored version the candidate was merged from.
    pub current: &'a Version,
    /// Merged and validated document to persist.
    pub candidate: &'a Version,
    /// The caller's partial update, kept for re-merging after a conflict.
    pub update: &'a Version,
    /// The caller's If-Match selector.
    pub if_match: &'a str,
    /// Caller states download artifacts already exist.
    pub has_downloads: bool,
}

impl TransitionContext<'_> {
    /// The version's stored dataset type, already checked by the validator.
    pub fn dataset_type(&self) -> Result<DatasetType> {
        self.candidate.resolved_type()
    }

    /// Fire the downloads trigger for this version.
    pub async fn generate_downloads(&self, dataset_type: DatasetType) -> Result<()> {
        let generator = self.downloads.get(dataset_type)?;
        let details = self.details;
        generator
            .generate(
                &details.dataset_id,
                &self.candidate.id,
                &details.edition,
                &details.version.to_string(),
            )
            .await?;
        info!(
            dataset_id = %details.dataset_id,
            edition = %details.edition,
            version = details.version,
            generator = generator.name(),
            "downloads generation requested"
        );
        Ok(())
    }
}

/// Side effects of entering one target state.
#[async_trait]
pub trait StateHandler: Send + Sync {
    /// Persist the candidate and run the cascade; returns the persisted version.
    async fn handle(&self, ctx: &TransitionContext<'_>) -> Result<Version>;
}

/// Target state to handler mapping.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<State, Arc<dyn StateHandler>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        let draft: Arc<dyn StateHandler> = Arc::new(DraftHandler);
        let terminal: Arc<dyn StateHandler> = Arc::new(TerminalHandler);

        let mut handlers: HashMap<State, Arc<dyn StateHandler>> = HashMap::new();
        handlers.insert(State::Created, Arc::clone(&draft));
        handlers.insert(State::Submitted, Arc::clone(&draft));
        handlers.insert(State::Completed, draft);
        handlers.insert(State::EditionConfirmed, Arc::new(EditionConfirmedHandler));
        handlers.insert(State::Associated, Arc::new(AssociatedHandler));
        handlers.insert(State::Published, Arc::new(PublishedHandler));
        handlers.insert(State::Detached, Arc::clone(&terminal));
        handlers.insert(State::Failed, terminal);
        Self { handlers }
    }
}

impl HandlerRegistry {
    /// Replace the handler for `state`.
    pub fn register(&mut self, state: State, handler: Arc<dyn StateHandler>) {
        self.handlers.insert(state, handler);
    }

    pub fn get(&self, state: State) -> Result<Arc<dyn StateHandler>> {
        self.handlers
            .get(&state)
            .cloned()
            .ok_or(CatalogError::StateTransitionNotAllowed)
    }
}
