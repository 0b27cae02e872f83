//! Request signature: SHA-1 over the lexicographically sorted parameters.

use sha1::{Digest, Sha1};

/// Sort `parts` as strings, join them without a separator and return the
/// lowercase hex SHA-1 digest.
pub fn make_signature(parts: &[&str]) -> String {
    let mut sorted = parts.to_vec();
    sorted.sort_unstable();

    let mut hasher = Sha1::new();
    for part in &sorted {
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Check the plain `signature` query parameter (token, timestamp, nonce).
///
/// An empty signature never validates.
pub fn is_valid(timestamp: &str, nonce: &str, signature: &str, token: &str) -> bool {
    if signature.is_empty() {
        return false;
    }
    make_signature(&[token, timestamp, nonce]) == signature
}

/// Check the `msg_signature` of an encrypted request, which also covers the
/// ciphertext.
pub fn is_valid_msg_signature(
    timestamp: &str,
    nonce: &str,
    encrypt: &str,
    signature: &str,
    token: &str,
) -> bool {
    if signature.is_empty() {
        return false;
    }
    make_signature(&[token, timestamp, nonce, encrypt]) == signature
}
