//! SHA-256 helpers via `ring::digest`.

use ring::digest::{digest, SHA256};

/// Compute SHA-256 of raw bytes (certificate DER, DN strings).
///
/// Returns lowercase hex-encoded digest.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256_raw(data))
}

/// Compute SHA-256 of raw bytes, returning the 32 digest bytes.
#[must_use]
pub fn sha256_raw(data: &[u8]) -> [u8; 32] {
    let d = digest(&SHA256, data);
    let mut out = [0u8; 32];
    out.copy_from_slice(d.as_ref());
    out
}
