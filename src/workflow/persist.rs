//! Conflict-aware version write.
//!
//! The write is conditioned on the ETag of the document the candidate was
//! merged from, unless the caller sent the `*` selector. If another writer got
//! there first the store reports a conflict; the version is then re-read, the
//! caller's update re-merged, re-validated and re-checked against the
//! transition table, and the write attempted once more. A second conflict, or
//! any other error, is returned to the caller.

use std::sync::atomic::{AtomicUsize, Ordering};

use backon::Retryable;
use tracing::{debug, warn};

use super::handlers::TransitionContext;
use super::merge::combine;
use super::validate::validate_version;
use crate::error::{CatalogError, Result};
use crate::models::Version;
use crate::utils::etag::ANY_ETAG;
use crate::utils::retry::{conflict_backoff, is_retryable};

/// Which store method performs the version write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePath {
    /// `update_version`: also mirrors the state into the backing instance.
    Generic,
    /// `update_version_static`: static datasets have no instance.
    Static,
}

impl WritePath {
    pub fn for_static(is_static: bool) -> Self {
        if is_static {
            WritePath::Static
        } else {
            WritePath::Generic
        }
    }
}

async fn write(
    ctx: &TransitionContext<'_>,
    path: WritePath,
    current: &Version,
    candidate: &Version,
) -> Result<Version> {
    let selector = if ctx.if_match == ANY_ETAG {
        ANY_ETAG
    } else {
        current.e_tag.as_str()
    };
    let e_tag = match path {
        WritePath::Generic => {
            ctx.store
                .update_version(current, candidate, selector)
                .await?
        }
        WritePath::Static => {
            ctx.store
                .update_version_static(current, candidate, selector)
                .await?
        }
    };

    let mut persisted = candidate.clone();
    persisted.e_tag = e_tag;
    Ok(persisted)
}

/// Re-read the version and rebuild the candidate from the caller's update.
/// The winning writer may have moved the version on, so the move is checked
/// against the transition table again.
async fn refresh(ctx: &TransitionContext<'_>) -> Result<(Version, Version)> {
    let details = ctx.details;
    let current = ctx
        .store
        .get_version(
            &details.dataset_id,
            &details.edition,
            details.version,
            ctx.if_match,
        )
        .await?;
    let candidate = combine(&current, ctx.update);
    validate_version(&candidate)?;

    let target = candidate.state.ok_or(CatalogError::MissingState)?;
    ctx.transitions
        .check(current.state, target, candidate.resolved_type()?)
        .inspect_err(|_| {
            debug!(
                from = ?current.state,
                to = %target,
                "transition no longer legal after refresh"
            )
        })?;
    Ok((current, candidate))
}

/// Persist `ctx.candidate`, retrying once on an ETag conflict.
pub async fn persist_version(ctx: &TransitionContext<'_>, path: WritePath) -> Result<Version> {
    let attempts = AtomicUsize::new(0);

    let result = (|| async {
        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            write(ctx, path, ctx.current, ctx.candidate).await
        } else {
            let (current, candidate) = refresh(ctx).await?;
            write(ctx, path, &current, &candidate).await
        }
    })
    .retry(conflict_backoff())
    .when(is_retryable)
    .notify(|err, delay| {
        warn!(
            resource = %ctx.details.resource_key(),
            error = %err,
            ?delay,
            "version write lost an etag race, retrying"
        );
    })
    .await;

    if let Ok(persisted) = &result {
        debug!(
            resource = %ctx.details.resource_key(),
            e_tag = %persisted.e_tag,
            attempts = attempts.load(Ordering::SeqCst),
            "version persisted"
        );
    }
    result
}
