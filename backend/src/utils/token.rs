//! Opaque reset token generation and one-way hashing.
//!
//! The raw token is high-entropy, shown once to the requester, and never
//! persisted or logged; only its SHA-256 hash is stored.

use rand::RngCore;
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// Generates a new opaque token (64 hex characters).
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Computes the stable one-way hash stored in place of the raw token.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
