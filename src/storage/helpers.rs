//! Shared storage helper functions.
//!
//! ETag preconditions and document stamping used by every backend, so the
//! memory and SQLite stores agree on what a write produces.

use chrono::Utc;

use crate::error::{CatalogError, Result};
use crate::models::{EditionUpdate, Instance, Version};
use crate::utils::etag;

/// Human-readable resource name for conflict errors.
pub fn version_resource(version: &Version) -> String {
    format!("{}/{}/{}", version.dataset_id, version.edition, version.version)
}

/// Fail with `Conflict` unless `selector` admits the stored ETag.
pub fn check_etag(resource: &str, selector: &str, stored: &str) -> Result<()> {
    if etag::matches(selector, stored) {
        Ok(())
    } else {
        Err(CatalogError::Conflict {
            resource: resource.to_string(),
            selector: selector.to_string(),
        })
    }
}

/// Build the document that replaces `current`.
///
/// Identity is taken from the stored document; the candidate cannot move a
/// version to another slot. `last_updated` and `e_tag` are recomputed.
pub fn stamp_version(current: &Version, candidate: &Version) -> Result<Version> {
    let mut stored = candidate.clone();
    stored.id.clone_from(&current.id);
    stored.dataset_id.clone_from(&current.dataset_id);
    stored.edition.clone_from(&current.edition);
    stored.version = current.version;
    stored.last_updated = Some(Utc::now());
    stored.e_tag = stored.hash()?;
    Ok(stored)
}

/// Stamp a version being inserted for the first time.
pub fn stamp_new_version(version: &Version) -> Result<Version> {
    let mut stored = version.clone();
    stored.last_updated = Some(Utc::now());
    stored.e_tag = stored.hash()?;
    Ok(stored)
}

/// Recompute an edition's ETag over its Current/Next halves.
pub fn stamp_edition(doc: &EditionUpdate) -> Result<EditionUpdate> {
    let mut stored = doc.clone();
    stored.e_tag.clear();
    stored.e_tag = etag::content_hash(&stored)?;
    Ok(stored)
}

/// Whether `version` is backed by an import instance.
pub fn has_instance(version: &Version) -> bool {
    !version.id.is_empty()
        && !version
            .resolved_type()
            .is_ok_and(|dataset_type| dataset_type.is_static())
}

/// Fresh instance record for a newly added version.
pub fn instance_for(version: &Version) -> Instance {
    Instance {
        id: version.id.clone(),
        state: version.state,
        is_published: false,
    }
}
