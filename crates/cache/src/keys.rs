//! Key derivation for callers with unbounded input

use sha2::{Digest, Sha256};

/// Stable 64-character hex key for an arbitrary string
///
/// Useful when the natural key is long or contains characters the caller does
/// not want to store verbatim. Unrelated to how store names map to files.
pub fn generate_cache_key(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
