//! Credential hashing for staff and customer accounts.
//!
//! Argon2id with per-hash random salts. Reset tokens are hashed elsewhere
//! (see `utils::token`); this module only deals with passwords.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Hashes a plaintext password into a PHC-format string suitable for storage.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;

    Ok(hash.to_string())
}

/// Checks a plaintext password against a stored hash.
///
/// A mismatched password is `Ok(false)`; only malformed hashes or hasher
/// failures surface as errors.
pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("stored hash is malformed: {e}"))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("password verification failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_matching_and_rejects_wrong_password() {
        let hash = hash_password("Dealer#2026").expect("hash");
        assert!(verify_password("Dealer#2026", &hash).unwrap());
        assert!(!verify_password("dealer#2026", &hash).unwrap());
    }

    #[test]
    fn salts_make_repeat_hashes_distinct() {
        let first = hash_password("Dealer#2026").expect("hash");
        let second = hash_password("Dealer#2026").expect("hash");
        assert_ne!(first, second);
        assert!(verify_password("Dealer#2026", &second).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error_not_a_mismatch() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
