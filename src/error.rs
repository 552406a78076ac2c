//! Catalog error taxonomy.

use std::time::Duration;

use crate::models::DatasetType;

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Coarse classification of [`CatalogError`] for callers mapping to transport codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    StateTransitionNotAllowed,
    Conflict,
    DependencyFailure,
    Internal,
}

/// Errors raised by the publishing workflow and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("dataset not found")]
    DatasetNotFound,

    #[error("edition not found")]
    EditionNotFound,

    #[error("version not found")]
    VersionNotFound,

    #[error("instance not found")]
    InstanceNotFound,

    #[error("invalid version requested")]
    InvalidVersionNumber,

    #[error("missing identifier: {0}")]
    MissingIdentifier(&'static str),

    #[error("missing state")]
    MissingState,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("missing mandatory fields: [{}]", .0.join(" "))]
    MissingMandatoryFields(Vec<String>),

    #[error("invalid dataset type")]
    InvalidDatasetType,

    #[error("state not allowed to transition")]
    StateTransitionNotAllowed,

    #[error("invalid arguments to PublishLinks - versionLink empty")]
    MissingVersionLink,

    /// The stored document's ETag no longer matches the write selector.
    #[error("version {resource} has been modified: etag {selector} does not match")]
    Conflict { resource: String, selector: String },

    #[error("failed to acquire lock on {key}: {reason}")]
    LockAcquisition { key: String, reason: String },

    #[error("no downloads generator configured for dataset type {0}")]
    GeneratorNotConfigured(DatasetType),

    #[error("downloads generation failed: {0}")]
    DownloadsGeneration(String),

    #[error("request deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::DatasetNotFound
            | CatalogError::EditionNotFound
            | CatalogError::VersionNotFound
            | CatalogError::InstanceNotFound => ErrorKind::NotFound,
            CatalogError::InvalidVersionNumber
            | CatalogError::MissingIdentifier(_)
            | CatalogError::MissingState
            | CatalogError::InvalidState(_)
            | CatalogError::MissingMandatoryFields(_)
            | CatalogError::InvalidDatasetType
            | CatalogError::MissingVersionLink => ErrorKind::InvalidInput,
            CatalogError::StateTransitionNotAllowed => ErrorKind::StateTransitionNotAllowed,
            CatalogError::Conflict { .. } => ErrorKind::Conflict,
            CatalogError::LockAcquisition { .. }
            | CatalogError::GeneratorNotConfigured(_)
            | CatalogError::DownloadsGeneration(_)
            | CatalogError::Timeout(_) => ErrorKind::DependencyFailure,
            CatalogError::InvalidConfig(_) | CatalogError::Serialization(_) => ErrorKind::Internal,
            #[cfg(feature = "sqlite")]
            CatalogError::Database(_) => ErrorKind::DependencyFailure,
        }
    }

    /// A lost optimistic-concurrency race; the only retryable error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CatalogError::Conflict { .. })
    }
}
