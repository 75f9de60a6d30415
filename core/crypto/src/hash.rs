//! Salted secret hashing.
//!
//! Login passwords and recovery answers are verified by comparing salted
//! SHA-256 digests. Hashing is deliberately deterministic for a given
//! (secret, salt) pair so stored digests can be checked by recomputation;
//! verification compares in constant time.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use sable_common::{Error, Result};

/// Salt length in bytes, before base64 encoding.
pub const SALT_LENGTH: usize = 16;

/// Generate a cryptographically random salt, base64-encoded.
///
/// A salt is generated once at registration and fixed for the agent's
/// lifetime; both the password digest and the recovery-answer digest reuse
/// it.
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    BASE64.encode(salt)
}

/// Hash a secret with a base64-encoded salt.
///
/// Computes SHA-256 over `salt_bytes || utf8(secret)` and returns the
/// digest base64-encoded. The same `(secret, salt)` pair always yields the
/// same output.
///
/// # Errors
/// - Returns error if the salt is not valid base64
pub fn hash_secret(secret: &str, salt: &str) -> Result<String> {
    let salt_bytes = BASE64
        .decode(salt)
        .map_err(|e| Error::Crypto(format!("Invalid salt encoding: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(&salt_bytes);
    hasher.update(secret.as_bytes());

    Ok(BASE64.encode(hasher.finalize()))
}

/// Compare a candidate secret against a stored digest.
///
/// # Security
/// - The digest comparison runs in constant time
pub fn verify_secret(secret: &str, salt: &str, expected: &str) -> Result<bool> {
    let candidate = hash_secret(secret, salt)?;
    Ok(candidate.as_bytes().ct_eq(expected.as_bytes()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_deterministic() {
        let salt = generate_salt();

        let h1 = hash_secret("open-sesame", &salt).unwrap();
        let h2 = hash_secret("open-sesame", &salt).unwrap();

        assert_eq!(h1, h2);
    }

    #[test]
    fn test_hash_differs_by_salt() {
        let h1 = hash_secret("open-sesame", &generate_salt()).unwrap();
        let h2 = hash_secret("open-sesame", &generate_salt()).unwrap();

        assert_ne!(h1, h2);
    }

    #[test]
    fn test_hash_differs_by_secret() {
        let salt = generate_salt();

        let h1 = hash_secret("open-sesame", &salt).unwrap();
        let h2 = hash_secret("open-sesame!", &salt).unwrap();

        assert_ne!(h1, h2);
    }

    #[test]
    fn test_invalid_salt_rejected() {
        assert!(hash_secret("secret", "not valid base64!!").is_err());
    }

    #[test]
    fn test_verify_secret() {
        let salt = generate_salt();
        let digest = hash_secret("correct horse", &salt).unwrap();

        assert!(verify_secret("correct horse", &salt, &digest).unwrap());
        assert!(!verify_secret("wrong horse", &salt, &digest).unwrap());
    }

    #[test]
    fn test_generate_salt_length() {
        let salt = BASE64.decode(generate_salt()).unwrap();
        assert_eq!(salt.len(), SALT_LENGTH);
    }

    proptest! {
        #[test]
        fn prop_hash_stable(secret in ".{0,64}") {
            let salt = generate_salt();
            let h1 = hash_secret(&secret, &salt).unwrap();
            let h2 = hash_secret(&secret, &salt).unwrap();
            prop_assert_eq!(&h1, &h2);
            prop_assert!(verify_secret(&secret, &salt, &h1).unwrap());
        }
    }
}
