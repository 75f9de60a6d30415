//! Credential persistence trait definition.

use sable_common::{AgentId, ClearanceLevel, Result};

use crate::record::AgentRecord;

/// Row identifier returned by `insert`.
pub type RowId = i64;

/// Credential persistence boundary.
///
/// Sensitive record fields are opaque ciphertext at this boundary;
/// encryption happens in the core immediately before a record is handed
/// over and decryption immediately after one comes back. Implementations
/// enforce codename and agent-id uniqueness. Errors are propagated opaquely
/// and never retried internally; retry policy belongs to the caller.
pub trait AgentStore: Send + Sync {
    /// Fetch a record by codename (case-sensitive).
    fn find_by_codename(&self, codename: &str) -> Result<Option<AgentRecord>>;

    /// Fetch a record by agent id.
    fn find_by_id(&self, agent_id: &AgentId) -> Result<Option<AgentRecord>>;

    /// Whether a record exists for the codename.
    fn exists(&self, codename: &str) -> Result<bool>;

    /// Largest numeric suffix among allocated agent ids, 0 when none exist.
    ///
    /// Used for id allocation; monotonic but not gap-free after deletions.
    fn max_numeric_suffix(&self) -> Result<u32>;

    /// Insert a new record.
    ///
    /// # Errors
    /// - Uniqueness violation on codename or agent id
    /// - Backend failure
    fn insert(&self, record: &AgentRecord) -> Result<RowId>;

    /// Replace the full record keyed by agent id.
    ///
    /// # Returns
    /// Number of rows affected (0 when the agent id is unknown).
    fn update(&self, record: &AgentRecord) -> Result<usize>;

    /// The seeded clearance-level reference rows.
    fn clearance_levels(&self) -> Result<Vec<ClearanceLevel>>;
}
