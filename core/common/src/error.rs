//! Common error types for Sable.

use thiserror::Error;

/// Reason codes for rejected registration input.
///
/// Reason codes are surfaced verbatim to the caller; mapping them to
/// user-facing copy is a UI concern, so no locale-dependent message strings
/// cross this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationReason {
    /// Codename missing or whitespace-only.
    #[error("codename cannot be empty")]
    CodenameEmpty,

    /// Codename below the minimum length.
    #[error("codename must be at least 3 characters")]
    CodenameTooShort,

    /// Cipher key below the minimum length.
    #[error("cipher key must be at least 8 characters")]
    PasswordTooShort,

    /// Security question missing or whitespace-only.
    #[error("security question cannot be empty")]
    QuestionEmpty,

    /// Security question below the minimum length.
    #[error("security question must be more specific")]
    QuestionTooShort,

    /// Security answer missing or whitespace-only.
    #[error("security answer cannot be empty")]
    AnswerEmpty,

    /// Security answer below the minimum length.
    #[error("security answer too short")]
    AnswerTooShort,

    /// Another agent already holds this codename.
    #[error("codename already taken")]
    CodenameTaken,
}

/// Top-level error type for Sable operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// A stored record failed field decryption and cannot be used.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Persistence operation failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Registration or recovery input rejected.
    #[error("Validation failed: {0}")]
    Validation(ValidationReason),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The validation reason code, when this is a validation failure.
    pub fn validation_reason(&self) -> Option<ValidationReason> {
        match self {
            Error::Validation(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
