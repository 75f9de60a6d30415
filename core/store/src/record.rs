//! Agent record model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use sable_common::{AgentId, ClearanceLevel};

/// A stored operative record.
///
/// The core only ever holds transient copies; the record of truth lives in
/// an [`AgentStore`](crate::AgentStore). The four credential fields
/// (`password_hash`, `salt`, `security_question`, `security_answer_hash`)
/// are plaintext inside the core and ciphertext on the persistence side of
/// the boundary: a record handed to a store implementation never contains
/// plaintext secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Unique, immutable identifier.
    pub agent_id: AgentId,
    /// Unique, case-sensitive login identifier; set at registration only.
    pub codename: String,
    /// Salted digest of the cipher key.
    pub password_hash: String,
    /// Per-agent salt, generated once at registration and never rotated.
    pub salt: String,
    /// Recovery question released after a verified answer.
    pub security_question: String,
    /// Salted digest of the recovery answer, under the same salt as the
    /// password.
    pub security_answer_hash: String,
    /// Access level; BETA for new agents.
    pub clearance: ClearanceLevel,
    /// Preference only; never bypasses password verification.
    pub biometric_enabled: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub failed_attempts: u32,
    pub last_failed_login: Option<DateTime<Utc>>,
    pub locked: bool,
}

impl AgentRecord {
    /// Build a fresh record with default clearance and zeroed security
    /// counters.
    pub fn new(
        agent_id: AgentId,
        codename: String,
        password_hash: String,
        salt: String,
        security_question: String,
        security_answer_hash: String,
        biometric_enabled: bool,
    ) -> Self {
        Self {
            agent_id,
            codename,
            password_hash,
            salt,
            security_question,
            security_answer_hash,
            clearance: ClearanceLevel::default(),
            biometric_enabled,
            last_login: None,
            failed_attempts: 0,
            last_failed_login: None,
            locked: false,
        }
    }

    /// Whether the lockout cool-down window is still active.
    ///
    /// A locked account whose window has elapsed is only implicitly locked:
    /// the next login attempt clears the flag before verifying credentials.
    pub fn is_temporarily_locked(&self, cooldown: Duration) -> bool {
        if !self.locked {
            return false;
        }
        match self.last_failed_login {
            Some(last_failure) => Utc::now() - last_failure < cooldown,
            None => false,
        }
    }
}
