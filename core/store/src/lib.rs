//! Persistence boundary for Sable.
//!
//! This module provides trait-based interfaces for credential persistence
//! and the session surface, with in-memory implementations for tests and
//! production implementations backed by SQLite and the key vault.
//!
//! # Design Principles
//! - Store isolation: no hashing or auth logic inside store implementations
//! - Opaque secrets: sensitive fields arrive already encrypted and are
//!   stored verbatim; persistence never sees plaintext credentials
//! - Unified error semantics: persistence failures propagate, never retried

pub mod agents;
pub mod local;
pub mod memory;
pub mod record;
pub mod session;
pub mod sqlite;

pub use agents::{AgentStore, RowId};
pub use local::FileSessionStore;
pub use memory::{MemoryAgentStore, MemorySessionStore};
pub use record::AgentRecord;
pub use session::{SessionAttributes, SessionStore};
pub use sqlite::SqliteAgentStore;
