//! SHA-256 checksum utilities
//!
//! Single canonical checksum format (`sha256:<hex>`) used to verify backup
//! integrity before a revert entry is replayed.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::Result;

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of in-memory content.
pub fn compute_content_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    let content = crate::io::read(path)?;
    Ok(compute_content_checksum(&content))
}

/// Check whether a string looks like a checksum produced here.
pub fn is_valid_checksum(value: &str) -> bool {
    value
        .strip_prefix(PREFIX)
        .is_some_and(|hex| hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
