//! In-memory stores for testing.

use std::sync::RwLock;

use chrono::{DateTime, Utc};

use sable_common::{AgentId, ClearanceLevel, Error, Result};

use crate::agents::{AgentStore, RowId};
use crate::record::AgentRecord;
use crate::session::{SessionAttributes, SessionStore};

/// In-memory agent store.
///
/// Useful for testing and development. All data is stored in memory and
/// lost on drop.
pub struct MemoryAgentStore {
    agents: RwLock<Vec<AgentRecord>>,
}

impl MemoryAgentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryAgentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentStore for MemoryAgentStore {
    fn find_by_codename(&self, codename: &str) -> Result<Option<AgentRecord>> {
        let agents = self.agents.read().unwrap();
        Ok(agents.iter().find(|r| r.codename == codename).cloned())
    }

    fn find_by_id(&self, agent_id: &AgentId) -> Result<Option<AgentRecord>> {
        let agents = self.agents.read().unwrap();
        Ok(agents.iter().find(|r| &r.agent_id == agent_id).cloned())
    }

    fn exists(&self, codename: &str) -> Result<bool> {
        let agents = self.agents.read().unwrap();
        Ok(agents.iter().any(|r| r.codename == codename))
    }

    fn max_numeric_suffix(&self) -> Result<u32> {
        let agents = self.agents.read().unwrap();
        Ok(agents.iter().map(|r| r.agent_id.number()).max().unwrap_or(0))
    }

    fn insert(&self, record: &AgentRecord) -> Result<RowId> {
        let mut agents = self.agents.write().unwrap();

        if agents
            .iter()
            .any(|r| r.codename == record.codename || r.agent_id == record.agent_id)
        {
            return Err(Error::Persistence(format!(
                "Duplicate agent record: {}",
                record.agent_id
            )));
        }

        agents.push(record.clone());
        Ok(agents.len() as RowId)
    }

    fn update(&self, record: &AgentRecord) -> Result<usize> {
        let mut agents = self.agents.write().unwrap();

        match agents.iter_mut().find(|r| r.agent_id == record.agent_id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn clearance_levels(&self) -> Result<Vec<ClearanceLevel>> {
        Ok(ClearanceLevel::ALL.to_vec())
    }
}

/// In-memory session store.
///
/// Holds at most one set of session attributes, the process-wide session.
pub struct MemorySessionStore {
    session: RwLock<Option<SessionAttributes>>,
}

impl MemorySessionStore {
    /// Create a new store with no active session.
    pub fn new() -> Self {
        Self {
            session: RwLock::new(None),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(
        &self,
        agent_id: &AgentId,
        codename: &str,
        clearance: ClearanceLevel,
        biometric_enabled: bool,
    ) -> Result<()> {
        let mut session = self.session.write().unwrap();
        *session = Some(SessionAttributes {
            agent_id: agent_id.clone(),
            codename: codename.to_string(),
            clearance,
            biometric_enabled,
            logged_in: true,
            last_login: Utc::now(),
        });
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.session.write().unwrap() = None;
        Ok(())
    }

    fn is_logged_in(&self) -> bool {
        self.session
            .read()
            .unwrap()
            .as_ref()
            .map(|s| s.logged_in)
            .unwrap_or(false)
    }

    fn agent_id(&self) -> Option<AgentId> {
        self.session.read().unwrap().as_ref().map(|s| s.agent_id.clone())
    }

    fn codename(&self) -> Option<String> {
        self.session.read().unwrap().as_ref().map(|s| s.codename.clone())
    }

    fn clearance(&self) -> Option<ClearanceLevel> {
        self.session.read().unwrap().as_ref().map(|s| s.clearance)
    }

    fn biometric_enabled(&self) -> bool {
        self.session
            .read()
            .unwrap()
            .as_ref()
            .map(|s| s.biometric_enabled)
            .unwrap_or(false)
    }

    fn set_biometric_enabled(&self, enabled: bool) -> Result<()> {
        if let Some(session) = self.session.write().unwrap().as_mut() {
            session.biometric_enabled = enabled;
        }
        Ok(())
    }

    fn last_login(&self) -> Option<DateTime<Utc>> {
        self.session.read().unwrap().as_ref().map(|s| s.last_login)
    }
}
