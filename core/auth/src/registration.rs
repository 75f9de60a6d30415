//! Agent registration.

use std::sync::Arc;

use tracing::{error, info};

use sable_common::{AgentId, Error, Result, ValidationReason};
use sable_crypto::{hash, FieldCipher};
use sable_store::{AgentRecord, AgentStore};

use crate::sealed::seal_record;

const MIN_CODENAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 8;
const MIN_QUESTION_LEN: usize = 10;
const MIN_ANSWER_LEN: usize = 3;

/// A successfully registered agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub agent_id: AgentId,
    pub codename: String,
}

/// Validates and creates new agent records.
pub struct RegistrationService {
    store: Arc<dyn AgentStore>,
    cipher: FieldCipher,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn AgentStore>, cipher: FieldCipher) -> Self {
        Self { store, cipher }
    }

    /// Validate inputs and create a new agent record.
    ///
    /// Validation short-circuits on the first failing rule; codename,
    /// question, and answer are trimmed before validation and storage.
    ///
    /// # Postconditions
    /// - The new record has BETA clearance, zeroed counters, and is unlocked
    /// - One salt is generated and shared by the password and answer digests
    ///
    /// # Errors
    /// - `Validation` with a reason code for each rejected input
    /// - `Persistence` when the insert fails
    pub fn register(
        &self,
        codename: &str,
        password: &str,
        security_question: &str,
        security_answer: &str,
        biometric_enabled: bool,
    ) -> Result<Registration> {
        let codename = codename.trim();
        let question = security_question.trim();
        let answer = security_answer.trim();

        if codename.is_empty() {
            return Err(Error::Validation(ValidationReason::CodenameEmpty));
        }
        if codename.chars().count() < MIN_CODENAME_LEN {
            return Err(Error::Validation(ValidationReason::CodenameTooShort));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(ValidationReason::PasswordTooShort));
        }
        if question.is_empty() {
            return Err(Error::Validation(ValidationReason::QuestionEmpty));
        }
        if question.chars().count() < MIN_QUESTION_LEN {
            return Err(Error::Validation(ValidationReason::QuestionTooShort));
        }
        if answer.is_empty() {
            return Err(Error::Validation(ValidationReason::AnswerEmpty));
        }
        if answer.chars().count() < MIN_ANSWER_LEN {
            return Err(Error::Validation(ValidationReason::AnswerTooShort));
        }
        if self.store.exists(codename)? {
            return Err(Error::Validation(ValidationReason::CodenameTaken));
        }

        let agent_id = AgentId::from_number(self.store.max_numeric_suffix()? + 1);

        // One salt per agent, shared by the password and recovery-answer
        // digests for the agent's lifetime.
        let salt = hash::generate_salt();
        let password_hash = hash::hash_secret(password, &salt)?;
        let answer_hash = hash::hash_secret(answer, &salt)?;

        let record = AgentRecord::new(
            agent_id.clone(),
            codename.to_string(),
            password_hash,
            salt,
            question.to_string(),
            answer_hash,
            biometric_enabled,
        );

        self.store
            .insert(&seal_record(&self.cipher, &record)?)
            .map_err(|err| {
                error!(codename, error = %err, "registration insert failed");
                err
            })?;

        info!(codename, agent_id = %agent_id, "agent registered");
        Ok(Registration {
            agent_id,
            codename: codename.to_string(),
        })
    }
}
