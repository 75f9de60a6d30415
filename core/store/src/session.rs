//! Session surface.
//!
//! Process-wide session attributes produced on successful authentication
//! and consumed by the UI layer. The attributes live from login until
//! logout or a security-breach wipe, whichever comes first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sable_common::{AgentId, ClearanceLevel, Result};

/// Attributes held for the lifetime of a login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAttributes {
    pub agent_id: AgentId,
    pub codename: String,
    pub clearance: ClearanceLevel,
    pub biometric_enabled: bool,
    pub logged_in: bool,
    pub last_login: DateTime<Utc>,
}

/// Session surface consumed by the UI layer.
///
/// `save` creates the attributes; `clear` destroys all of them at once.
/// There is no partial teardown.
pub trait SessionStore: Send + Sync {
    /// Store session attributes upon successful login.
    ///
    /// # Postconditions
    /// - `is_logged_in` returns true
    /// - `last_login` is stamped with the current time
    fn save(
        &self,
        agent_id: &AgentId,
        codename: &str,
        clearance: ClearanceLevel,
        biometric_enabled: bool,
    ) -> Result<()>;

    /// Destroy every session attribute.
    fn clear(&self) -> Result<()>;

    /// Whether an agent is currently logged in.
    fn is_logged_in(&self) -> bool;

    /// The logged-in agent's id.
    fn agent_id(&self) -> Option<AgentId>;

    /// The logged-in agent's codename.
    fn codename(&self) -> Option<String>;

    /// The logged-in agent's clearance.
    fn clearance(&self) -> Option<ClearanceLevel>;

    /// Whether biometric unlock is enabled for the current session.
    fn biometric_enabled(&self) -> bool;

    /// Toggle the biometric preference for the current session.
    ///
    /// No-op when no session exists.
    fn set_biometric_enabled(&self, enabled: bool) -> Result<()>;

    /// Timestamp of the login that created the session.
    fn last_login(&self) -> Option<DateTime<Utc>>;
}
