//! Published: make the version public and promote its edition and dataset.

use async_trait::async_trait;
use tracing::{error, info};

use super::{StateHandler, TransitionContext};
use crate::error::Result;
use crate::models::Version;
use crate::utils::etag::ANY_ETAG;
use crate::workflow::persist::{persist_version, WritePath};
use crate::workflow::validate::validate_version;

/// Steps run in a fixed order with no rollback:
///
/// 1. validate and persist the version
/// 2. promote the edition (Next published, latest-version link, Current = Next)
/// 3. mark the backing instance published (imported datasets only)
/// 4. resolve the dataset type from the stored dataset
/// 5. flatten the dataset: Current = Next = published document
/// 6. trigger downloads if no public CSV exists yet
///
/// Every step is safe to repeat, so a failed publish is resumed by
/// resubmitting the same request.
pub struct PublishedHandler;

#[async_trait]
impl StateHandler for PublishedHandler {
    #[tracing::instrument(name = "handler.published", skip_all, fields(resource = %ctx.details.resource_key()))]
    async fn handle(&self, ctx: &TransitionContext<'_>) -> Result<Version> {
        let details = ctx.details;
        validate_version(ctx.candidate)?;
        let is_static = ctx.dataset_type()?.is_static();

        let persisted = persist_version(ctx, WritePath::for_static(is_static)).await?;

        let mut edition = ctx
            .store
            .get_edition(&details.dataset_id, &details.edition, ANY_ETAG)
            .await
            .inspect_err(|e| error!(error = %e, "failed to load edition for publish"))?;
        edition.promote(persisted.version_link())?;
        ctx.store
            .upsert_edition(&details.dataset_id, &details.edition, &edition)
            .await
            .inspect_err(|e| error!(error = %e, "failed to promote edition"))?;

        if !is_static {
            ctx.store
                .set_instance_is_published(&persisted.id)
                .await
                .inspect_err(|e| error!(error = %e, "failed to mark instance published"))?;
        }

        let dataset_type = ctx
            .store
            .get_dataset_type(&details.dataset_id, true)
            .await
            .inspect_err(|e| error!(error = %e, "failed to resolve dataset type"))?;

        let promoted = ctx.dataset.promote(&persisted);
        ctx.store
            .upsert_dataset(&details.dataset_id, &promoted)
            .await
            .inspect_err(|e| error!(error = %e, "failed to promote dataset"))?;

        let has_public_csv = persisted
            .downloads
            .as_ref()
            .is_some_and(|downloads| downloads.has_public_csv());
        if !has_public_csv && !ctx.has_downloads && !is_static {
            ctx.generate_downloads(dataset_type).await.inspect_err(|e| {
                error!(error = %e, "failed to trigger downloads for published version");
            })?;
        }

        info!("version published");
        Ok(persisted)
    }
}
