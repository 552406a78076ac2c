//! Content-hash ETags for optimistic concurrency.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Selector that disables the ETag precondition on a write.
pub const ANY_ETAG: &str = "*";

/// Hex SHA-256 of the document's JSON encoding.
pub fn content_hash<T: Serialize>(document: &T) -> Result<String> {
    let bytes = serde_json::to_vec(document)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Whether a stored ETag satisfies the caller's selector.
pub fn matches(selector: &str, stored: &str) -> bool {
    selector == ANY_ETAG || selector == stored
}
