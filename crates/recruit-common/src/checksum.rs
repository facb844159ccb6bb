//! Checksum utilities for exported payloads

use crate::error::{RecruitError, Result};
use sha2::{Digest, Sha256};

/// Compute the hex-encoded SHA-256 digest of a payload
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Verify a payload against an expected hex-encoded SHA-256 digest
pub fn verify_sha256(data: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(data);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(RecruitError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
