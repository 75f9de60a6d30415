//! Lost-credentials recovery.

use std::sync::Arc;

use tracing::{info, warn};

use sable_common::Result;
use sable_crypto::{hash, FieldCipher};
use sable_store::AgentStore;

use crate::sealed::{seal_record, unseal_record};

/// Verifies a security answer and authorizes a password reset.
pub struct RecoveryService {
    store: Arc<dyn AgentStore>,
    cipher: FieldCipher,
}

impl RecoveryService {
    pub fn new(store: Arc<dyn AgentStore>, cipher: FieldCipher) -> Self {
        Self { store, cipher }
    }

    /// Verify a security answer and release the stored question.
    ///
    /// Returns the decrypted question on a correct answer; `None` for a
    /// wrong answer or an unknown codename. Lockout counters are never
    /// touched by recovery.
    pub fn initiate_recovery(
        &self,
        codename: &str,
        security_answer: &str,
    ) -> Result<Option<String>> {
        let Some(stored) = self.store.find_by_codename(codename)? else {
            warn!(codename, "recovery rejected: unknown codename");
            return Ok(None);
        };
        let record = unseal_record(&self.cipher, stored)?;

        if hash::verify_secret(
            security_answer.trim(),
            &record.salt,
            &record.security_answer_hash,
        )? {
            info!(codename, "recovery answer verified");
            Ok(Some(record.security_question))
        } else {
            warn!(codename, "recovery rejected: wrong security answer");
            Ok(None)
        }
    }

    /// Re-hash a new password with the agent's existing salt and persist it.
    ///
    /// The salt is never rotated on reset, and lockout counters are left
    /// as-is; unlocking is the next login attempt's concern.
    ///
    /// # Returns
    /// `false` when the codename is unknown or the update affected no rows.
    pub fn reset_password(&self, codename: &str, new_password: &str) -> Result<bool> {
        let Some(stored) = self.store.find_by_codename(codename)? else {
            warn!(codename, "password reset rejected: unknown codename");
            return Ok(false);
        };

        let mut record = unseal_record(&self.cipher, stored)?;
        record.password_hash = hash::hash_secret(new_password, &record.salt)?;

        let rows = self.store.update(&seal_record(&self.cipher, &record)?)?;
        if rows > 0 {
            info!(codename, "password reset");
        } else {
            warn!(codename, "password reset affected no rows");
        }
        Ok(rows > 0)
    }
}
