//! Cryptographic primitives for Sable.
//!
//! This module provides:
//! - Authenticated encryption using AES-256-GCM
//! - A key vault capability trait over hardware-backed key storage,
//!   with file-backed and in-memory implementations
//! - Field-level encryption for credentials crossing the persistence boundary
//! - Salted secret hashing for password and recovery-answer verification
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext secrets or key material are ever logged
//! - Constant-time operations for sensitive comparisons

pub mod aead;
pub mod field;
pub mod hash;
pub mod keyvault;

pub use aead::{decrypt, encrypt, NONCE_SIZE, TAG_SIZE};
pub use field::FieldCipher;
pub use hash::{generate_salt, hash_secret, verify_secret, SALT_LENGTH};
pub use keyvault::{FileKeyVault, KeyVault, MemoryKeyVault, VaultKey, KEY_LENGTH};
