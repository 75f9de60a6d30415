//! SQLite-backed agent store.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use sable_common::{AgentId, ClearanceLevel, Error, Result};

use crate::agents::{AgentStore, RowId};
use crate::record::AgentRecord;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS clearance_levels (
    clearance_code TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    description    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS agents (
    agent_id             TEXT PRIMARY KEY,
    codename             TEXT NOT NULL UNIQUE,
    password_hash        TEXT NOT NULL,
    salt                 TEXT NOT NULL,
    security_question    TEXT NOT NULL,
    security_answer_hash TEXT NOT NULL,
    clearance_code       TEXT NOT NULL DEFAULT 'BETA'
                         REFERENCES clearance_levels(clearance_code),
    biometric_enabled    INTEGER NOT NULL DEFAULT 0,
    last_login_ms        INTEGER,
    failed_attempts      INTEGER NOT NULL DEFAULT 0,
    last_failed_ms       INTEGER,
    account_locked       INTEGER NOT NULL DEFAULT 0
);
";

/// SQLite-backed credential persistence.
///
/// Opening the store creates the schema, enables foreign-key enforcement,
/// and seeds the clearance-level reference table. Sensitive columns hold
/// whatever ciphertext the core hands over; nothing here can read them.
/// Connection access is serialized behind a mutex.
pub struct SqliteAgentStore {
    conn: Mutex<Connection>,
}

impl SqliteAgentStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize(conn)
    }

    /// Open a transient in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true).map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;

        // Seed the read-only reference rows; repeat opens are no-ops.
        for level in ClearanceLevel::ALL {
            conn.execute(
                "INSERT OR IGNORE INTO clearance_levels (clearance_code, name, description)
                 VALUES (?1, ?2, ?3)",
                params![level.code(), level.display_name(), level.description()],
            )
            .map_err(db_err)?;
        }

        info!("credential store initialized");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<AgentRecord> {
        let agent_id: String = row.get("agent_id")?;
        let agent_id = AgentId::new(agent_id)
            .map_err(|e| conversion_err(0, e.to_string()))?;

        let clearance_code: String = row.get("clearance_code")?;
        let clearance = ClearanceLevel::from_code(&clearance_code).ok_or_else(|| {
            conversion_err(6, format!("Unknown clearance code: {}", clearance_code))
        })?;

        Ok(AgentRecord {
            agent_id,
            codename: row.get("codename")?,
            password_hash: row.get("password_hash")?,
            salt: row.get("salt")?,
            security_question: row.get("security_question")?,
            security_answer_hash: row.get("security_answer_hash")?,
            clearance,
            biometric_enabled: row.get::<_, i64>("biometric_enabled")? != 0,
            last_login: millis_to_datetime(row.get("last_login_ms")?),
            failed_attempts: row.get::<_, i64>("failed_attempts")? as u32,
            last_failed_login: millis_to_datetime(row.get("last_failed_ms")?),
            locked: row.get::<_, i64>("account_locked")? != 0,
        })
    }
}

impl AgentStore for SqliteAgentStore {
    fn find_by_codename(&self, codename: &str) -> Result<Option<AgentRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM agents WHERE codename = ?1",
            params![codename],
            Self::row_to_record,
        )
        .optional()
        .map_err(db_err)
    }

    fn find_by_id(&self, agent_id: &AgentId) -> Result<Option<AgentRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM agents WHERE agent_id = ?1",
            params![agent_id.as_str()],
            Self::row_to_record,
        )
        .optional()
        .map_err(db_err)
    }

    fn exists(&self, codename: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM agents WHERE codename = ?1",
                params![codename],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(count > 0)
    }

    fn max_numeric_suffix(&self) -> Result<u32> {
        let conn = self.conn.lock().unwrap();
        let max: Option<i64> = conn
            .query_row(
                "SELECT MAX(CAST(substr(agent_id, 7) AS INTEGER)) FROM agents",
                [],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(max.unwrap_or(0) as u32)
    }

    fn insert(&self, record: &AgentRecord) -> Result<RowId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO agents (
                agent_id, codename, password_hash, salt,
                security_question, security_answer_hash, clearance_code,
                biometric_enabled, last_login_ms, failed_attempts,
                last_failed_ms, account_locked
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.agent_id.as_str(),
                record.codename,
                record.password_hash,
                record.salt,
                record.security_question,
                record.security_answer_hash,
                record.clearance.code(),
                record.biometric_enabled as i64,
                datetime_to_millis(record.last_login),
                record.failed_attempts as i64,
                datetime_to_millis(record.last_failed_login),
                record.locked as i64,
            ],
        )
        .map_err(db_err)?;

        Ok(conn.last_insert_rowid())
    }

    fn update(&self, record: &AgentRecord) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE agents SET
                codename = ?2, password_hash = ?3, salt = ?4,
                security_question = ?5, security_answer_hash = ?6,
                clearance_code = ?7, biometric_enabled = ?8,
                last_login_ms = ?9, failed_attempts = ?10,
                last_failed_ms = ?11, account_locked = ?12
             WHERE agent_id = ?1",
            params![
                record.agent_id.as_str(),
                record.codename,
                record.password_hash,
                record.salt,
                record.security_question,
                record.security_answer_hash,
                record.clearance.code(),
                record.biometric_enabled as i64,
                datetime_to_millis(record.last_login),
                record.failed_attempts as i64,
                datetime_to_millis(record.last_failed_login),
                record.locked as i64,
            ],
        )
        .map_err(db_err)
    }

    fn clearance_levels(&self) -> Result<Vec<ClearanceLevel>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT clearance_code FROM clearance_levels")
            .map_err(db_err)?;

        let codes = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(db_err)?;

        Ok(codes
            .iter()
            .filter_map(|code| ClearanceLevel::from_code(code))
            .collect())
    }
}

fn db_err(err: rusqlite::Error) -> Error {
    Error::Persistence(err.to_string())
}

fn conversion_err(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

fn millis_to_datetime(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis.and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

fn datetime_to_millis(timestamp: Option<DateTime<Utc>>) -> Option<i64> {
    timestamp.map(|ts| ts.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(number: u32, codename: &str) -> AgentRecord {
        AgentRecord::new(
            AgentId::from_number(number),
            codename.to_string(),
            "opaque-hash".to_string(),
            "opaque-salt".to_string(),
            "opaque-question".to_string(),
            "opaque-answer-hash".to_string(),
            true,
        )
    }

    #[test]
    fn test_schema_and_seed() {
        let store = SqliteAgentStore::open_in_memory().unwrap();
        let levels = store.clearance_levels().unwrap();
        assert_eq!(levels, ClearanceLevel::ALL.to_vec());
    }

    #[test]
    fn test_insert_find_roundtrip() {
        let store = SqliteAgentStore::open_in_memory().unwrap();

        let mut stored = record(1, "NIGHTJAR");
        stored.last_failed_login = Some(Utc::now() - Duration::minutes(3));
        stored.failed_attempts = 2;
        store.insert(&stored).unwrap();

        let found = store.find_by_codename("NIGHTJAR").unwrap().unwrap();
        assert_eq!(found.agent_id, stored.agent_id);
        assert_eq!(found.password_hash, "opaque-hash");
        assert_eq!(found.failed_attempts, 2);
        assert_eq!(
            datetime_to_millis(found.last_failed_login),
            datetime_to_millis(stored.last_failed_login)
        );
        assert!(found.biometric_enabled);

        let by_id = store.find_by_id(&AgentId::from_number(1)).unwrap().unwrap();
        assert_eq!(by_id.codename, "NIGHTJAR");
    }

    #[test]
    fn test_exists_and_uniqueness() {
        let store = SqliteAgentStore::open_in_memory().unwrap();
        assert!(!store.exists("NIGHTJAR").unwrap());

        store.insert(&record(1, "NIGHTJAR")).unwrap();
        assert!(store.exists("NIGHTJAR").unwrap());

        // Codename uniqueness is enforced by the schema.
        assert!(store.insert(&record(2, "NIGHTJAR")).is_err());
    }

    #[test]
    fn test_max_numeric_suffix() {
        let store = SqliteAgentStore::open_in_memory().unwrap();
        assert_eq!(store.max_numeric_suffix().unwrap(), 0);

        store.insert(&record(4, "NIGHTJAR")).unwrap();
        store.insert(&record(11, "KESTREL")).unwrap();
        assert_eq!(store.max_numeric_suffix().unwrap(), 11);
    }

    #[test]
    fn test_update() {
        let store = SqliteAgentStore::open_in_memory().unwrap();
        store.insert(&record(1, "NIGHTJAR")).unwrap();

        let mut updated = record(1, "NIGHTJAR");
        updated.locked = true;
        updated.failed_attempts = 5;
        assert_eq!(store.update(&updated).unwrap(), 1);

        let found = store.find_by_codename("NIGHTJAR").unwrap().unwrap();
        assert!(found.locked);
        assert_eq!(found.failed_attempts, 5);

        assert_eq!(store.update(&record(9, "GHOST")).unwrap(), 0);
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.db");

        {
            let store = SqliteAgentStore::open(&path).unwrap();
            store.insert(&record(1, "NIGHTJAR")).unwrap();
        }

        let reopened = SqliteAgentStore::open(&path).unwrap();
        assert!(reopened.exists("NIGHTJAR").unwrap());
    }
}
