//! Deterministic identifiers for resources and assignments.
//!
//! Re-running a stage with the same logical inputs must address the same cloud
//! object, so every derived name goes through [`derive`].

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the parts, concatenated in order.
pub fn derive<S: AsRef<str>>(parts: &[S]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// `<prefix>-<first len hex chars of derive(parts)>`
pub fn short_name<S: AsRef<str>>(prefix: &str, parts: &[S], len: usize) -> String {
    let digest = derive(parts);
    format!("{}-{}", prefix, &digest[..len.min(digest.len())])
}

/// Reshape the first 32 hex characters of `derive(parts)` into 8-4-4-4-12 groups.
pub fn guid<S: AsRef<str>>(parts: &[S]) -> String {
    let digest = derive(parts);
    format!(
        "{}-{}-{}-{}-{}",
        &digest[0..8],
        &digest[8..12],
        &digest[12..16],
        &digest[16..20],
        &digest[20..32]
    )
}
