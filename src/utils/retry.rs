//! Retry utilities: backoff builders and retryable error classification.
//!
//! Uses `backon` for exponential backoff with jitter. A version write that
//! loses an ETag race is retried exactly once; anything else is fatal.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::error::CatalogError;

/// Number of retries after an ETag conflict.
pub const CONFLICT_RETRIES: usize = 1;

/// Backoff for a version write that lost an ETag race.
///
/// - Min delay: 5ms
/// - Max delay: 50ms
/// - Max attempts: 1 retry
/// - Jitter enabled
pub fn conflict_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(5))
        .with_max_delay(Duration::from_millis(50))
        .with_max_times(CONFLICT_RETRIES)
        .with_jitter()
}

/// Determines if a catalog error is retryable (ETag conflict only).
///
/// Not found, validation and dependency failures will never succeed on a
/// blind retry and are returned to the caller.
pub fn is_retryable(err: &CatalogError) -> bool {
    err.is_conflict()
}
