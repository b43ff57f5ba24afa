//! Device identity persistence
//!
//! The agent tags every telemetry envelope with a stable per-device
//! identifier. The identifier is generated once per installation and kept
//! in a small SQLite prefs store; any failure to read or write it is
//! fatal, since the agent cannot self-identify without it.

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

/// Fixed key the device identifier is stored under
const DEVICE_ID_KEY: &str = "device_id";

/// SQLite-backed key-value store holding the device identity
pub struct IdentityStore {
    conn: Mutex<Connection>,
}

impl IdentityStore {
    /// Open (or create) the identity store at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("identity store lock poisoned");
        conn.execute(
            "CREATE TABLE IF NOT EXISTS prefs (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Return the persisted device identifier, creating it on first use
    ///
    /// The identifier is a random v4 UUID, generated at most once per
    /// installation: the store is checked before generation on every
    /// call, so repeated calls within a process and across restarts
    /// return the identical value.
    pub fn get_or_create_device_id(&self) -> Result<String> {
        if let Some(existing) = self.get(DEVICE_ID_KEY)? {
            return Ok(existing);
        }

        let id = Uuid::new_v4().to_string();
        self.put(DEVICE_ID_KEY, &id)?;

        // A concurrent first run may have won the insert; the stored
        // value is authoritative either way
        let id = self.get(DEVICE_ID_KEY)?.unwrap_or(id);
        tracing::info!(device_id = %id, "Generated new device identity");
        Ok(id)
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("identity store lock poisoned");
        let value = conn
            .query_row(
                "SELECT value FROM prefs WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().expect("identity store lock poisoned");
        // INSERT OR IGNORE keeps the first writer's value if two agents
        // race on a fresh store
        conn.execute(
            "INSERT OR IGNORE INTO prefs (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}
