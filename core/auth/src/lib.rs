//! Identity and credential-protection core for Sable.
//!
//! This module provides:
//! - The authentication and brute-force lockout state machine
//! - Agent registration with id allocation and default clearance
//! - Lost-credentials recovery and password reset
//! - Runtime environment trust assessment with breach response
//!
//! # Architecture
//! The environment trust check runs first at process start and gates all
//! further activity. On pass, the authenticator, registration, and recovery
//! services operate against credential persistence, hashing secrets for
//! comparison and encrypting sensitive fields immediately before they cross
//! the persistence boundary. Successful authentication writes the session
//! attributes through the session surface.

pub mod authenticator;
pub mod manager;
pub mod recovery;
pub mod registration;
mod sealed;
pub mod trust;

pub use authenticator::{AuthOutcome, Authenticator, LockoutPolicy};
pub use manager::AuthManager;
pub use recovery::RecoveryService;
pub use registration::{Registration, RegistrationService};
pub use trust::{
    BuildInfo, DeviceEnvironment, HostEnvironment, StubEnvironment, ThreatVerdict, TrustChecker,
};
