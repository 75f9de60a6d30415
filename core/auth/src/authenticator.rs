//! Authentication and brute-force lockout state machine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use tracing::{info, warn};

use sable_common::{Error, Result};
use sable_crypto::{hash, FieldCipher};
use sable_store::{AgentRecord, AgentStore, SessionStore};

use crate::sealed::{seal_record, unseal_record};

/// Brute-force lockout policy.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    /// Failed attempts at which the account locks.
    pub max_failed_attempts: u32,
    /// Window during which a locked account rejects all attempts.
    pub cooldown: Duration,
}

impl Default for LockoutPolicy {
    /// The contract values: lock after 5 failures, cool down for 10 minutes.
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            cooldown: Duration::minutes(10),
        }
    }
}

/// Outcome of a login attempt.
///
/// Unknown codenames and wrong passwords produce the same outcome, so the
/// caller learns nothing about which it was; the distinction exists only in
/// internal logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credentials verified. The decrypted record is returned and the
    /// session attributes have been written.
    Success(AgentRecord),
    /// Codename unknown or password mismatch.
    InvalidCredentials,
    /// The account is locked and the cool-down window is still active.
    Locked,
}

/// Authenticates agents against credential persistence.
///
/// Counter mutations for a codename are serialized behind a per-codename
/// mutex, so concurrent attempts cannot undercount failures.
pub struct Authenticator {
    store: Arc<dyn AgentStore>,
    session: Arc<dyn SessionStore>,
    cipher: FieldCipher,
    policy: LockoutPolicy,
    guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn AgentStore>,
        session: Arc<dyn SessionStore>,
        cipher: FieldCipher,
        policy: LockoutPolicy,
    ) -> Self {
        Self {
            store,
            session,
            cipher,
            policy,
            guards: Mutex::new(HashMap::new()),
        }
    }

    fn guard_for(&self, codename: &str) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().unwrap();
        guards.entry(codename.to_string()).or_default().clone()
    }

    /// Attempt to authenticate an agent.
    ///
    /// # Postconditions
    /// - On success: `failed_attempts` is 0, `last_login` is stamped, the
    ///   lock flag is cleared, and session attributes are saved
    /// - On mismatch: `failed_attempts` is incremented and the account locks
    ///   once the policy threshold is reached
    /// - A locked account whose cool-down has elapsed is unlocked in place
    ///   and the attempt proceeds
    ///
    /// # Errors
    /// - `CorruptRecord` if any mandatory credential field fails decryption
    /// - `Crypto` if hashing fails
    /// - Persistence failures propagate
    pub fn login(&self, codename: &str, password: &str) -> Result<AuthOutcome> {
        let guard = self.guard_for(codename);
        let _held = guard.lock().unwrap();

        let Some(stored) = self.store.find_by_codename(codename)? else {
            warn!(codename, "login rejected: unknown codename");
            return Ok(AuthOutcome::InvalidCredentials);
        };
        let mut record = unseal_record(&self.cipher, stored)?;

        if record.locked {
            if record.is_temporarily_locked(self.policy.cooldown) {
                warn!(codename, "login rejected: account locked");
                return Ok(AuthOutcome::Locked);
            }

            // Cool-down elapsed: clear the flag, then re-fetch before
            // verifying anything against the record.
            record.locked = false;
            self.store.update(&seal_record(&self.cipher, &record)?)?;
            info!(codename, "lockout expired, account unlocked");

            let Some(stored) = self.store.find_by_codename(codename)? else {
                return Ok(AuthOutcome::InvalidCredentials);
            };
            record = unseal_record(&self.cipher, stored)?;
        }

        if hash::verify_secret(password, &record.salt, &record.password_hash)? {
            record.failed_attempts = 0;
            record.last_login = Some(Utc::now());
            record.locked = false;
            self.store.update(&seal_record(&self.cipher, &record)?)?;

            self.session.save(
                &record.agent_id,
                &record.codename,
                record.clearance,
                record.biometric_enabled,
            )?;

            info!(codename, agent_id = %record.agent_id, "login successful");
            Ok(AuthOutcome::Success(record))
        } else {
            record.failed_attempts += 1;
            record.last_failed_login = Some(Utc::now());
            if record.failed_attempts >= self.policy.max_failed_attempts {
                record.locked = true;
                warn!(
                    codename,
                    attempts = record.failed_attempts,
                    "account locked after repeated failures"
                );
            } else {
                warn!(
                    codename,
                    attempts = record.failed_attempts,
                    "login rejected: invalid credentials"
                );
            }
            self.store.update(&seal_record(&self.cipher, &record)?)?;
            Ok(AuthOutcome::InvalidCredentials)
        }
    }

    /// Fetch a decrypted record without authentication checks.
    ///
    /// Used by the external biometric-unlock flow, which resolves to a
    /// codename lookup; it never bypasses password verification here.
    pub fn lookup(&self, codename: &str) -> Result<Option<AgentRecord>> {
        match self.store.find_by_codename(codename)? {
            Some(stored) => Ok(Some(unseal_record(&self.cipher, stored)?)),
            None => Ok(None),
        }
    }

    /// Persist the biometric preference for an agent.
    ///
    /// # Errors
    /// - `NotFound` for an unknown codename
    pub fn set_biometric_enabled(&self, codename: &str, enabled: bool) -> Result<()> {
        let guard = self.guard_for(codename);
        let _held = guard.lock().unwrap();

        let Some(stored) = self.store.find_by_codename(codename)? else {
            return Err(Error::NotFound(format!("No agent with codename: {}", codename)));
        };

        let mut record = unseal_record(&self.cipher, stored)?;
        record.biometric_enabled = enabled;
        self.store.update(&seal_record(&self.cipher, &record)?)?;
        Ok(())
    }

    /// Clear the session surface.
    pub fn logout(&self) -> Result<()> {
        info!("session cleared on logout");
        self.session.clear()
    }
}
