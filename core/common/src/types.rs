//! Common types used throughout Sable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an agent, in the fixed `AGENT-###` format.
///
/// Ids are allocated at registration from the largest existing numeric
/// suffix and are immutable for the life of the record. Numbering is
/// monotonic but not gap-free after deletions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    /// Parse an identifier in the `AGENT-###` format.
    ///
    /// # Errors
    /// - Returns error if the prefix is missing or the suffix is not numeric
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        match id.strip_prefix("AGENT-") {
            Some(suffix) if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) => {
                Ok(Self(id))
            }
            _ => Err(crate::Error::InvalidInput(format!(
                "Malformed agent id: {}",
                id
            ))),
        }
    }

    /// Allocate an id from a numeric suffix, zero-padded to three digits.
    pub fn from_number(number: u32) -> Self {
        Self(format!("AGENT-{:03}", number))
    }

    /// The numeric suffix of the id.
    pub fn number(&self) -> u32 {
        self.0[6..].parse().unwrap_or(0)
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An agent's access level.
///
/// Reference data: the four rows are seeded into persistence at
/// initialization and are read-only at runtime. This core only stores and
/// returns the code; no ordering between levels is defined or interpreted
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClearanceLevel {
    Beta,
    Alpha,
    Omega,
    Shadow,
}

impl ClearanceLevel {
    /// All defined levels, in seeding order.
    pub const ALL: [ClearanceLevel; 4] = [
        ClearanceLevel::Beta,
        ClearanceLevel::Alpha,
        ClearanceLevel::Omega,
        ClearanceLevel::Shadow,
    ];

    /// The stored clearance code.
    pub fn code(&self) -> &'static str {
        match self {
            ClearanceLevel::Beta => "BETA",
            ClearanceLevel::Alpha => "ALPHA",
            ClearanceLevel::Omega => "OMEGA",
            ClearanceLevel::Shadow => "SHADOW",
        }
    }

    /// Human-readable level name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ClearanceLevel::Beta => "Field Agent",
            ClearanceLevel::Alpha => "Senior Operative",
            ClearanceLevel::Omega => "Command Authority",
            ClearanceLevel::Shadow => "Rogue Operative",
        }
    }

    /// Description of what the level grants.
    pub fn description(&self) -> &'static str {
        match self {
            ClearanceLevel::Beta => "Regular ops, basic missions",
            ClearanceLevel::Alpha => "Advanced dossiers, encrypted channels",
            ClearanceLevel::Omega => "Full app access, manage agents, override",
            ClearanceLevel::Shadow => "Special conditions, monitored access",
        }
    }

    /// Look up a level from its stored code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "BETA" => Some(ClearanceLevel::Beta),
            "ALPHA" => Some(ClearanceLevel::Alpha),
            "OMEGA" => Some(ClearanceLevel::Omega),
            "SHADOW" => Some(ClearanceLevel::Shadow),
            _ => None,
        }
    }
}

impl Default for ClearanceLevel {
    /// New agents start at BETA.
    fn default() -> Self {
        ClearanceLevel::Beta
    }
}

impl fmt::Display for ClearanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_from_number() {
        let id = AgentId::from_number(7);
        assert_eq!(id.as_str(), "AGENT-007");
        assert_eq!(id.number(), 7);
    }

    #[test]
    fn test_agent_id_wide_suffix() {
        // Padding is a minimum, not a cap.
        let id = AgentId::from_number(1234);
        assert_eq!(id.as_str(), "AGENT-1234");
        assert_eq!(id.number(), 1234);
    }

    #[test]
    fn test_agent_id_parse() {
        let id = AgentId::new("AGENT-042").unwrap();
        assert_eq!(id.number(), 42);

        assert!(AgentId::new("agent-042").is_err());
        assert!(AgentId::new("AGENT-").is_err());
        assert!(AgentId::new("AGENT-04X").is_err());
        assert!(AgentId::new("").is_err());
    }

    #[test]
    fn test_clearance_level_codes() {
        for level in ClearanceLevel::ALL {
            assert_eq!(ClearanceLevel::from_code(level.code()), Some(level));
        }
        assert_eq!(ClearanceLevel::from_code("GAMMA"), None);
        // Codes are case-sensitive.
        assert_eq!(ClearanceLevel::from_code("beta"), None);
    }

    #[test]
    fn test_clearance_default_is_beta() {
        assert_eq!(ClearanceLevel::default(), ClearanceLevel::Beta);
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = AgentId::from_number(12);
        let json = serde_json::to_string(&id).unwrap();
        let restored: AgentId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, id);

        let json = serde_json::to_string(&ClearanceLevel::Shadow).unwrap();
        let restored: ClearanceLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, ClearanceLevel::Shadow);
    }
}
