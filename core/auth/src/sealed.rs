//! Record encryption boundary.
//!
//! Sensitive fields are encrypted immediately before a record crosses into
//! persistence ("sealed") and decrypted immediately after one comes back
//! ("unsealed"). Store implementations only ever see sealed records.

use sable_common::{Error, Result};
use sable_crypto::FieldCipher;
use sable_store::AgentRecord;

/// Encrypt the sensitive fields of a record for storage.
pub(crate) fn seal_record(cipher: &FieldCipher, record: &AgentRecord) -> Result<AgentRecord> {
    let mut sealed = record.clone();
    sealed.password_hash = seal_field(cipher, &record.password_hash, "password_hash")?;
    sealed.salt = seal_field(cipher, &record.salt, "salt")?;
    sealed.security_question = seal_field(cipher, &record.security_question, "security_question")?;
    sealed.security_answer_hash =
        seal_field(cipher, &record.security_answer_hash, "security_answer_hash")?;
    Ok(sealed)
}

/// Decrypt the sensitive fields of a stored record.
///
/// All four fields are mandatory; a failed decryption means the record
/// cannot be used for any authentication decision.
pub(crate) fn unseal_record(cipher: &FieldCipher, record: AgentRecord) -> Result<AgentRecord> {
    let mut unsealed = record;
    unsealed.password_hash = unseal_field(cipher, &unsealed.password_hash, "password_hash")?;
    unsealed.salt = unseal_field(cipher, &unsealed.salt, "salt")?;
    unsealed.security_question =
        unseal_field(cipher, &unsealed.security_question, "security_question")?;
    unsealed.security_answer_hash =
        unseal_field(cipher, &unsealed.security_answer_hash, "security_answer_hash")?;
    Ok(unsealed)
}

fn seal_field(cipher: &FieldCipher, plain: &str, field: &str) -> Result<String> {
    cipher
        .encrypt_field(Some(plain))
        .ok_or_else(|| Error::Crypto(format!("Field encryption failed: {}", field)))
}

fn unseal_field(cipher: &FieldCipher, ciphertext: &str, field: &str) -> Result<String> {
    cipher
        .decrypt_field(Some(ciphertext))
        .ok_or_else(|| Error::CorruptRecord(format!("Field failed decryption: {}", field)))
}
