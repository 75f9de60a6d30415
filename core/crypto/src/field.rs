//! Field-level credential encryption.
//!
//! Individual sensitive fields are encrypted immediately before they cross
//! the persistence boundary and decrypted immediately after they come back,
//! so persistence only ever sees opaque ciphertext. The AEAD output is
//! base64-encoded for transport-safe storage.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::warn;

use crate::keyvault::KeyVault;

/// Encrypts and decrypts individual record fields under a key vault.
#[derive(Clone)]
pub struct FieldCipher {
    vault: Arc<dyn KeyVault>,
}

impl FieldCipher {
    pub fn new(vault: Arc<dyn KeyVault>) -> Self {
        Self { vault }
    }

    /// Encrypt a single field for storage.
    ///
    /// Absent and empty values pass through unchanged; they are never
    /// encrypted. On failure returns `None` rather than an error, since
    /// failures must not propagate past the persistence boundary; callers
    /// decide how to treat a missing result.
    pub fn encrypt_field(&self, plain: Option<&str>) -> Option<String> {
        let plain = plain?;
        if plain.is_empty() {
            return Some(String::new());
        }

        match self.vault.encrypt(plain.as_bytes()) {
            Ok(blob) => Some(BASE64.encode(blob)),
            Err(err) => {
                warn!(error = %err, "field encryption failed");
                None
            }
        }
    }

    /// Decrypt a single field read from storage.
    ///
    /// Symmetric inverse of `encrypt_field`. Returns `None` when the value
    /// is not valid base64, fails authentication, or does not decode to
    /// UTF-8; callers treat a `None` result for a mandatory field as a
    /// corrupt record.
    pub fn decrypt_field(&self, cipher: Option<&str>) -> Option<String> {
        let cipher = cipher?;
        if cipher.is_empty() {
            return Some(String::new());
        }

        let blob = match BASE64.decode(cipher) {
            Ok(blob) => blob,
            Err(err) => {
                warn!(error = %err, "stored field is not valid base64");
                return None;
            }
        };

        match self.vault.decrypt(&blob) {
            Ok(plain) => match String::from_utf8(plain) {
                Ok(text) => Some(text),
                Err(_) => {
                    warn!("decrypted field is not valid UTF-8");
                    None
                }
            },
            Err(err) => {
                warn!(error = %err, "field decryption failed");
                None
            }
        }
    }
}
