//! Detached / Failed: abandon the version without touching its parents.

use async_trait::async_trait;
use tracing::info;

use super::{StateHandler, TransitionContext};
use crate::error::Result;
use crate::models::Version;
use crate::workflow::persist::{persist_version, WritePath};

pub struct TerminalHandler;

#[async_trait]
impl StateHandler for TerminalHandler {
    #[tracing::instrument(name = "handler.terminal", skip_all, fields(resource = %ctx.details.resource_key()))]
    async fn handle(&self, ctx: &TransitionContext<'_>) -> Result<Version> {
        let path = WritePath::for_static(ctx.dataset_type()?.is_static());
        let persisted = persist_version(ctx, path).await?;
        info!(state = ?persisted.state, "version abandoned");
        Ok(persisted)
    }
}
