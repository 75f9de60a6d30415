//! Core wiring and start-up checks.

use std::sync::Arc;

use tracing::{error, info};

use sable_common::{Error, Result};
use sable_crypto::{FieldCipher, KeyVault};
use sable_store::{AgentStore, SessionStore};

use crate::authenticator::{Authenticator, LockoutPolicy};
use crate::recovery::RecoveryService;
use crate::registration::RegistrationService;
use crate::trust::{DeviceEnvironment, TrustChecker};

/// Explicitly wired authentication core.
///
/// Collaborators are constructed once at process start and passed in;
/// there is no ambient global state. Bootstrapping runs the key-vault
/// self-test and refuses to operate when the key store is unusable; the
/// core never falls back to plaintext credential storage.
pub struct AuthManager {
    authenticator: Authenticator,
    registration: RegistrationService,
    recovery: RecoveryService,
    trust: TrustChecker,
    session: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager").finish_non_exhaustive()
    }
}

impl AuthManager {
    /// Wire the core services over the given collaborators.
    ///
    /// # Errors
    /// - `Crypto` when the key-vault self-test fails; the authentication
    ///   subsystem must not operate without a working key store
    pub fn bootstrap(
        store: Arc<dyn AgentStore>,
        session: Arc<dyn SessionStore>,
        vault: Arc<dyn KeyVault>,
        env: Arc<dyn DeviceEnvironment>,
        policy: LockoutPolicy,
    ) -> Result<Self> {
        if !vault.self_test() {
            error!("key vault self-test failed; refusing to operate");
            return Err(Error::Crypto("Key vault self-test failed".to_string()));
        }

        let cipher = FieldCipher::new(vault);
        let manager = Self {
            authenticator: Authenticator::new(
                store.clone(),
                session.clone(),
                cipher.clone(),
                policy,
            ),
            registration: RegistrationService::new(store.clone(), cipher.clone()),
            recovery: RecoveryService::new(store, cipher),
            trust: TrustChecker::new(env),
            session,
        };

        info!("authentication core ready");
        Ok(manager)
    }

    /// Run the environment gate.
    ///
    /// Start-up sequencing is the caller's concern; on a threat verdict the
    /// session surface has already been wiped and `false` is returned.
    pub fn verify_environment(&self) -> bool {
        self.trust.perform_check(self.session.as_ref())
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn registration(&self) -> &RegistrationService {
        &self.registration
    }

    pub fn recovery(&self) -> &RecoveryService {
        &self.recovery
    }

    pub fn trust(&self) -> &TrustChecker {
        &self.trust
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authenticator::AuthOutcome;
    use crate::trust::StubEnvironment;
    use sable_crypto::MemoryKeyVault;
    use sable_store::{MemoryAgentStore, MemorySessionStore};

    /// A vault whose key store is unusable.
    struct BrokenVault;

    impl KeyVault for BrokenVault {
        fn encrypt(&self, _plaintext: &[u8]) -> Result<Vec<u8>> {
            Err(Error::Crypto("key store unavailable".to_string()))
        }

        fn decrypt(&self, _blob: &[u8]) -> Result<Vec<u8>> {
            Err(Error::Crypto("key store unavailable".to_string()))
        }
    }

    fn bootstrap(env: StubEnvironment) -> AuthManager {
        AuthManager::bootstrap(
            Arc::new(MemoryAgentStore::new()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryKeyVault::new()),
            Arc::new(env),
            LockoutPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_bootstrap_refuses_broken_key_store() {
        let result = AuthManager::bootstrap(
            Arc::new(MemoryAgentStore::new()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(BrokenVault),
            Arc::new(StubEnvironment::trusted()),
            LockoutPolicy::default(),
        );

        assert!(matches!(result.unwrap_err(), Error::Crypto(_)));
    }

    #[test]
    fn test_full_flow_through_manager() {
        let manager = bootstrap(StubEnvironment::trusted());
        assert!(manager.verify_environment());

        manager
            .registration()
            .register(
                "NIGHTJAR",
                "correct-horse",
                "name of your first safehouse?",
                "the mill",
                true,
            )
            .unwrap();

        let outcome = manager
            .authenticator()
            .login("NIGHTJAR", "correct-horse")
            .unwrap();
        assert!(matches!(outcome, AuthOutcome::Success(_)));

        let question = manager
            .recovery()
            .initiate_recovery("NIGHTJAR", "the mill")
            .unwrap();
        assert!(question.is_some());
    }

    #[test]
    fn test_production_wiring_end_to_end() {
        use sable_crypto::FileKeyVault;
        use sable_store::{FileSessionStore, SqliteAgentStore};

        let dir = tempfile::tempdir().unwrap();
        let vault: Arc<dyn KeyVault> = Arc::new(FileKeyVault::new(dir.path().join("vault.key")));

        let manager = AuthManager::bootstrap(
            Arc::new(SqliteAgentStore::open(dir.path().join("agents.db")).unwrap()),
            Arc::new(FileSessionStore::new(
                dir.path().join("session.bin"),
                vault.clone(),
            )),
            vault,
            Arc::new(StubEnvironment::trusted()),
            LockoutPolicy::default(),
        )
        .unwrap();

        assert!(manager.verify_environment());

        manager
            .registration()
            .register(
                "KESTREL",
                "correct-horse",
                "name of your first safehouse?",
                "the mill",
                false,
            )
            .unwrap();

        let outcome = manager
            .authenticator()
            .login("KESTREL", "correct-horse")
            .unwrap();
        assert!(matches!(outcome, AuthOutcome::Success(_)));
        assert!(manager.session.is_logged_in());

        manager.authenticator().logout().unwrap();
        assert!(!manager.session.is_logged_in());
    }

    #[test]
    fn test_environment_gate_wipes_session_on_threat() {
        let mut env = StubEnvironment::trusted();
        env.present_paths.insert("/sbin/su".to_string());

        let manager = bootstrap(env);
        manager
            .registration()
            .register(
                "NIGHTJAR",
                "correct-horse",
                "name of your first safehouse?",
                "the mill",
                false,
            )
            .unwrap();
        manager
            .authenticator()
            .login("NIGHTJAR", "correct-horse")
            .unwrap();

        assert!(!manager.verify_environment());
        assert!(!manager.session.is_logged_in());
    }
}
