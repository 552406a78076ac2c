//! Associated: the version joins an editorial collection.

use async_trait::async_trait;
use tracing::{error, info};

use super::{StateHandler, TransitionContext};
use crate::error::Result;
use crate::models::{State, Version};
use crate::workflow::persist::{persist_version, WritePath};
use crate::workflow::validate::validate_version;

/// Persists the version, then for imported datasets records the association
/// on the dataset's Next and triggers download generation.
pub struct AssociatedHandler;

#[async_trait]
impl StateHandler for AssociatedHandler {
    #[tracing::instrument(name = "handler.associated", skip_all, fields(resource = %ctx.details.resource_key()))]
    async fn handle(&self, ctx: &TransitionContext<'_>) -> Result<Version> {
        validate_version(ctx.candidate)?;
        let dataset_type = ctx.dataset_type()?;

        let persisted = persist_version(ctx, WritePath::for_static(dataset_type.is_static())).await?;

        if dataset_type.is_static() {
            info!(collection_id = %persisted.collection_id, "static version associated");
            return Ok(persisted);
        }

        if let Err(e) = ctx
            .store
            .update_dataset_with_association(&ctx.details.dataset_id, State::Associated, &persisted)
            .await
        {
            error!(error = %e, "failed to record association on dataset");
            return Err(e);
        }

        if !ctx.has_downloads {
            ctx.generate_downloads(dataset_type).await.inspect_err(|e| {
                error!(error = %e, "failed to trigger downloads for associated version");
            })?;
        }

        info!(collection_id = %persisted.collection_id, "version associated");
        Ok(persisted)
    }
}
