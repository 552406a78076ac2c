//! Request identifiers for a version.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Identifiers as supplied by a caller (path segments).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionIdentifiers {
    pub dataset_id: String,
    pub edition: String,
    pub version: String,
}

impl VersionIdentifiers {
    pub fn new(
        dataset_id: impl Into<String>,
        edition: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            edition: edition.into(),
            version: version.into(),
        }
    }

    /// Validate and parse into [`VersionDetails`].
    pub fn resolve(&self) -> Result<VersionDetails> {
        if self.dataset_id.is_empty() {
            return Err(CatalogError::MissingIdentifier("dataset_id"));
        }
        if self.edition.is_empty() {
            return Err(CatalogError::MissingIdentifier("edition"));
        }
        Ok(VersionDetails {
            dataset_id: self.dataset_id.clone(),
            edition: self.edition.clone(),
            version: parse_version_number(&self.version)?,
        })
    }
}

/// Resolved identifiers of one version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionDetails {
    pub dataset_id: String,
    pub edition: String,
    pub version: u32,
}

impl VersionDetails {
    /// Key naming this version's resource for locking.
    pub fn resource_key(&self) -> String {
        format!("{}/{}/{}", self.dataset_id, self.edition, self.version)
    }
}

/// Parse a version number; must be a positive integer.
pub fn parse_version_number(raw: &str) -> Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CatalogError::InvalidVersionNumber),
    }
}
