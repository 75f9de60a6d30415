//! Encrypted file-backed session store.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use sable_common::{AgentId, ClearanceLevel, Error, Result};
use sable_crypto::KeyVault;

use crate::session::{SessionAttributes, SessionStore};

/// Production session surface.
///
/// Session attributes are serialized to JSON and stored under the key
/// vault, so session state at rest is ciphertext. A file that is missing,
/// unreadable, or fails authentication reads as "no session"; a tampered
/// session never yields attributes.
pub struct FileSessionStore {
    path: PathBuf,
    vault: Arc<dyn KeyVault>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>, vault: Arc<dyn KeyVault>) -> Self {
        Self {
            path: path.into(),
            vault,
        }
    }

    fn load(&self) -> Option<SessionAttributes> {
        let blob = fs::read(&self.path).ok()?;
        let plain = match self.vault.decrypt(&blob) {
            Ok(plain) => plain,
            Err(err) => {
                warn!(error = %err, "session state failed decryption, treating as absent");
                return None;
            }
        };
        serde_json::from_slice(&plain).ok()
    }

    fn persist(&self, attributes: &SessionAttributes) -> Result<()> {
        let plain = serde_json::to_vec(attributes)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let blob = self.vault.encrypt(&plain)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, blob)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn save(
        &self,
        agent_id: &AgentId,
        codename: &str,
        clearance: ClearanceLevel,
        biometric_enabled: bool,
    ) -> Result<()> {
        self.persist(&SessionAttributes {
            agent_id: agent_id.clone(),
            codename: codename.to_string(),
            clearance,
            biometric_enabled,
            logged_in: true,
            last_login: Utc::now(),
        })
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn is_logged_in(&self) -> bool {
        self.load().map(|s| s.logged_in).unwrap_or(false)
    }

    fn agent_id(&self) -> Option<AgentId> {
        self.load().map(|s| s.agent_id)
    }

    fn codename(&self) -> Option<String> {
        self.load().map(|s| s.codename)
    }

    fn clearance(&self) -> Option<ClearanceLevel> {
        self.load().map(|s| s.clearance)
    }

    fn biometric_enabled(&self) -> bool {
        self.load().map(|s| s.biometric_enabled).unwrap_or(false)
    }

    fn set_biometric_enabled(&self, enabled: bool) -> Result<()> {
        if let Some(mut attributes) = self.load() {
            attributes.biometric_enabled = enabled;
            self.persist(&attributes)?;
        }
        Ok(())
    }

    fn last_login(&self) -> Option<DateTime<Utc>> {
        self.load().map(|s| s.last_login)
    }
}
