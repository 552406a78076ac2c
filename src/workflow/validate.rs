//! Validator: mandatory-field checks on a merged candidate.

use crate::error::{CatalogError, Result};
use crate::models::{DatasetType, Version};

pub use crate::models::parse_version_number;

/// Check `candidate` is complete enough for its target state.
///
/// Every missing field is reported at once so the caller can fix them in one go.
pub fn validate_version(candidate: &Version) -> Result<()> {
    let state = candidate.state.ok_or(CatalogError::MissingState)?;
    validate_dataset_type(&candidate.dataset_type)?;

    if !state.requires_release_metadata() {
        return Ok(());
    }

    let mut missing = Vec::new();
    if candidate.release_date.is_empty() {
        missing.push("release_date".to_string());
    }
    if let Some(downloads) = &candidate.downloads {
        for (format, download) in downloads.formats() {
            let Some(download) = download else { continue };
            if download.href.is_empty() {
                missing.push(format!("downloads.{format}.href"));
            }
            if download.size.is_empty() {
                missing.push(format!("downloads.{format}.size"));
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::MissingMandatoryFields(missing))
    }
}

/// Resolve a dataset type string, `InvalidDatasetType` when unknown.
pub fn validate_dataset_type(raw: &str) -> Result<DatasetType> {
    DatasetType::resolve(raw)
}
