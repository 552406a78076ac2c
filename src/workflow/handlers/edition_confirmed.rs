//! EditionConfirmed: the version's edition is fixed and release metadata is complete.

use async_trait::async_trait;
use tracing::info;

use super::{StateHandler, TransitionContext};
use crate::error::Result;
use crate::models::Version;
use crate::workflow::persist::{persist_version, WritePath};
use crate::workflow::validate::validate_version;

pub struct EditionConfirmedHandler;

#[async_trait]
impl StateHandler for EditionConfirmedHandler {
    #[tracing::instrument(name = "handler.edition_confirmed", skip_all, fields(resource = %ctx.details.resource_key()))]
    async fn handle(&self, ctx: &TransitionContext<'_>) -> Result<Version> {
        validate_version(ctx.candidate)?;
        let path = WritePath::for_static(ctx.dataset_type()?.is_static());
        let persisted = persist_version(ctx, path).await?;
        info!("edition confirmed");
        Ok(persisted)
    }
}
