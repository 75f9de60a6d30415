//! Key vault implementations with secure memory handling.
//!
//! The key vault owns the symmetric key under which credential fields are
//! enveloped. It is a capability trait so the core never hardcodes one
//! vendor's key-store API: production builds supply a platform-backed
//! implementation, tests an in-memory one. Implementations are the only
//! components permitted to touch raw key bytes.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::aead;
use sable_common::{Error, Result};

/// Length of the vault key in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Fixed plaintext round-tripped by the self-test.
const SELF_TEST_PLAINTEXT: &[u8] = b"SABLE_KEYVAULT_SELF_TEST";

/// Symmetric vault key.
///
/// The key zeroizes its memory on drop to prevent sensitive data from
/// persisting after use.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    key: [u8; KEY_LENGTH],
}

impl VaultKey {
    /// Create a vault key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Generate a random vault key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LENGTH];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VaultKey([REDACTED])")
    }
}

/// Capability interface over hardware-backed key storage.
///
/// `encrypt`/`decrypt` operate on opaque byte strings in the
/// `nonce || ciphertext || tag` format. Key material has process-wide
/// lifetime: provisioned lazily on first use, never rotated.
pub trait KeyVault: Send + Sync {
    /// Encrypt plaintext under the vault key.
    ///
    /// # Errors
    /// - Key provisioning or retrieval failure
    /// - Encryption failure
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt a blob produced by `encrypt`.
    ///
    /// # Errors
    /// - Blob shorter than nonce + tag
    /// - Authentication tag verification failure
    fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>>;

    /// Round-trip a fixed known string to detect an unusable key store.
    ///
    /// The first call may provision persistent key material as a side
    /// effect.
    fn self_test(&self) -> bool {
        match self.encrypt(SELF_TEST_PLAINTEXT) {
            Ok(blob) => matches!(self.decrypt(&blob), Ok(plain) if plain == SELF_TEST_PLAINTEXT),
            Err(_) => false,
        }
    }
}

/// File-backed key vault.
///
/// Stand-in for platform secure-enclave storage on host builds: a 256-bit
/// key is provisioned lazily on first use, persisted with owner-only
/// permissions, and reloaded on subsequent constructions against the same
/// path.
pub struct FileKeyVault {
    path: PathBuf,
    key: Mutex<Option<VaultKey>>,
}

impl FileKeyVault {
    /// Create a vault over the given key file path.
    ///
    /// No I/O happens until the first encrypt/decrypt call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key: Mutex::new(None),
        }
    }

    /// Load the key, provisioning it on first use.
    ///
    /// # Postconditions
    /// - Idempotent: every call observes the same key
    fn get_or_create_key(&self) -> Result<VaultKey> {
        let mut cached = self.key.lock().unwrap();
        if let Some(key) = cached.as_ref() {
            return Ok(key.clone());
        }

        let key = if self.path.exists() {
            self.load_key()?
        } else {
            self.provision_key()?
        };

        *cached = Some(key.clone());
        Ok(key)
    }

    fn load_key(&self) -> Result<VaultKey> {
        let bytes = fs::read(&self.path)?;
        let raw: [u8; KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| Error::Crypto("Key file is malformed".to_string()))?;
        Ok(VaultKey::from_bytes(raw))
    }

    fn provision_key(&self) -> Result<VaultKey> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let key = VaultKey::generate();
        fs::write(&self.path, key.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!(path = %self.path.display(), "vault key provisioned");
        Ok(key)
    }
}

impl KeyVault for FileKeyVault {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let key = self.get_or_create_key()?;
        aead::encrypt(key.as_bytes(), plaintext)
    }

    fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        let key = self.get_or_create_key()?;
        aead::decrypt(key.as_bytes(), blob)
    }
}

/// In-memory key vault for tests.
///
/// The key lives only as long as the vault instance.
pub struct MemoryKeyVault {
    key: VaultKey,
}

impl MemoryKeyVault {
    /// Create a vault with a freshly generated key.
    pub fn new() -> Self {
        Self {
            key: VaultKey::generate(),
        }
    }

    /// Create a vault with a caller-supplied key.
    pub fn with_key(key: VaultKey) -> Self {
        Self { key }
    }
}

impl Default for MemoryKeyVault {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyVault for MemoryKeyVault {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        aead::encrypt(self.key.as_bytes(), plaintext)
    }

    fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        aead::decrypt(self.key.as_bytes(), blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_vault_roundtrip() {
        let vault = MemoryKeyVault::new();
        let blob = vault.encrypt(b"classified").unwrap();
        assert_eq!(vault.decrypt(&blob).unwrap(), b"classified");
    }

    #[test]
    fn test_memory_vault_self_test() {
        assert!(MemoryKeyVault::new().self_test());
    }

    #[test]
    fn test_vault_key_generate_distinct() {
        let key1 = VaultKey::generate();
        let key2 = VaultKey::generate();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_vault_key_debug_redacted() {
        let key = VaultKey::generate();
        assert_eq!(format!("{:?}", key), "VaultKey([REDACTED])");
    }

    #[test]
    fn test_file_vault_provisions_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.key");

        let vault = FileKeyVault::new(&path);
        assert!(!path.exists());

        let blob = vault.encrypt(b"first use").unwrap();
        assert!(path.exists());
        assert_eq!(vault.decrypt(&blob).unwrap(), b"first use");
    }

    #[test]
    fn test_file_vault_reuses_provisioned_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.key");

        let blob = FileKeyVault::new(&path).encrypt(b"persisted").unwrap();

        // A second vault over the same path must retrieve the same key.
        let reopened = FileKeyVault::new(&path);
        assert_eq!(reopened.decrypt(&blob).unwrap(), b"persisted");
    }

    #[test]
    fn test_file_vault_rejects_malformed_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.key");
        fs::write(&path, b"short").unwrap();

        let vault = FileKeyVault::new(&path);
        assert!(vault.encrypt(b"data").is_err());
        assert!(!vault.self_test());
    }

    #[test]
    fn test_file_vault_self_test() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FileKeyVault::new(dir.path().join("vault.key"));
        assert!(vault.self_test());
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.key");
        FileKeyVault::new(&path).encrypt(b"x").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
