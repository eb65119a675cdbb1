use sha2::{Digest, Sha256};

use super::ArtifactError;

/// SHA-256 of `bytes`.
pub fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn hex_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Check `bytes` against an expected hex digest (case-insensitive).
pub fn verify_digest(bytes: &[u8], expected_hex: &str) -> Result<(), ArtifactError> {
    let actual = hex_digest(bytes);
    if actual.eq_ignore_ascii_case(expected_hex.trim()) {
        Ok(())
    } else {
        Err(ArtifactError::Integrity {
            expected: expected_hex.to_string(),
            actual,
        })
    }
}
