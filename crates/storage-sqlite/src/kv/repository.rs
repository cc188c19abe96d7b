//! SQLite repository implementing the durable store contract.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use seatplan_core::store::DurableStore;
use seatplan_core::{Error, Result};

use crate::errors::StorageError;

/// Durable store over one `kv_entries` table. Documents are stored as
/// JSON text; `updated_at` is informational only and never consulted by
/// the synchronization layer.
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
}

impl SqliteKvStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(StorageError::from)?;
        Self::initialize(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(StorageError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::storage("connection lock is poisoned"))
    }
}

impl DurableStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.connection()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StorageError::from)?;
        match raw {
            Some(text) => match serde_json::from_str(&text) {
                Ok(value) => Ok(Some(value)),
                Err(err) => {
                    warn!("stored document under '{key}' is not valid JSON, treating as absent: {err}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let text = serde_json::to_string(value).map_err(StorageError::from)?;
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, text, Utc::now().to_rfc3339()],
        )
        .map_err(StorageError::from)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])
            .map_err(StorageError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_get_remove_round_trip() {
        let store = SqliteKvStore::open_in_memory().unwrap();
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("roster", &json!([{"id": "1", "name": "Ana"}])).unwrap();
        assert_eq!(
            store.get("roster").unwrap(),
            Some(json!([{"id": "1", "name": "Ana"}]))
        );

        store.remove("roster").unwrap();
        assert_eq!(store.get("roster").unwrap(), None);
    }

    #[test]
    fn overwrite_replaces_the_document() {
        let store = SqliteKvStore::open_in_memory().unwrap();
        store.set("k", &json!({"v": 1})).unwrap();
        store.set("k", &json!({"v": 2})).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!({"v": 2})));
    }

    #[test]
    fn malformed_stored_text_reads_as_absent() {
        let store = SqliteKvStore::open_in_memory().unwrap();
        {
            let conn = store.connection().unwrap();
            conn.execute(
                "INSERT INTO kv_entries (key, value, updated_at) VALUES ('bad', '{not json', '')",
                [],
            )
            .unwrap();
        }
        assert_eq!(store.get("bad").unwrap(), None);
    }

    #[test]
    fn removing_a_missing_key_is_a_no_op() {
        let store = SqliteKvStore::open_in_memory().unwrap();
        store.remove("missing").unwrap();
    }
}
