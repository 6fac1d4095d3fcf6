//! SQLite preference store
//!
//! All partitions share one database at `<dir>/preferences.db`.
//!
//! Schema:
//! - preferences table: (partition, key) primary key, exactly one of
//!   text_value / int_value set per row
//!
//! Each commit runs in a single transaction, so a batch of changes is
//! applied entirely or not at all.

use super::{validate_partition_name, PrefValue, PreferenceStore};
use crate::error::{CoreError, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DB_FILE_NAME: &str = "preferences.db";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS preferences (
        partition TEXT NOT NULL,
        key TEXT NOT NULL,
        text_value TEXT,
        int_value INTEGER,
        PRIMARY KEY (partition, key),
        CHECK ((text_value IS NULL) <> (int_value IS NULL))
    );
"#;

/// SQLite-backed store (thread-safe)
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Create or open the database under `dir`
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|source| CoreError::FileWrite {
            path: dir.to_path_buf(),
            source,
        })?;

        let db_path = dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path).map_err(|e| {
            CoreError::database(format!("failed to open {}", db_path.display()), e)
        })?;

        // WAL lets readers proceed while a commit is in flight
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| CoreError::database("failed to enable WAL mode", e))?;

        let store = Self::init(conn, Some(db_path))?;
        debug!(path = ?store.db_path, "Preference database initialized");
        Ok(store)
    }

    /// Database that lives only as long as this value
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::database("failed to open in-memory database", e))?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| CoreError::database("failed to create schema", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }
}

impl PreferenceStore for SqliteStore {
    fn get(&self, partition: &str, key: &str) -> Result<Option<PrefValue>> {
        validate_partition_name(partition)?;
        let conn = self.conn.lock();

        let row: Option<(Option<String>, Option<i32>)> = conn
            .query_row(
                "SELECT text_value, int_value FROM preferences WHERE partition = ? AND key = ?",
                params![partition, key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| CoreError::database("failed to query preference", e))?;

        Ok(row.and_then(|(text, int)| match (text, int) {
            (Some(text), _) => Some(PrefValue::Text(text)),
            (None, Some(int)) => Some(PrefValue::Int(int)),
            (None, None) => None,
        }))
    }

    fn commit(&self, partition: &str, changes: &[(String, PrefValue)]) -> Result<()> {
        validate_partition_name(partition)?;
        let mut conn = self.conn.lock();

        let tx = conn
            .transaction()
            .map_err(|e| CoreError::database("failed to begin transaction", e))?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR REPLACE INTO preferences (partition, key, text_value, int_value)
                     VALUES (?, ?, ?, ?)",
                )
                .map_err(|e| CoreError::database("failed to prepare insert", e))?;

            for (key, value) in changes {
                let (text, int) = match value {
                    PrefValue::Text(s) => (Some(s.as_str()), None),
                    PrefValue::Int(i) => (None, Some(*i)),
                };
                stmt.execute(params![partition, key, text, int])
                    .map_err(|e| CoreError::database("failed to write preference", e))?;
            }
        }
        tx.commit()
            .map_err(|e| CoreError::database("failed to commit transaction", e))?;

        debug!(partition, changes = changes.len(), "Preferences stored");
        Ok(())
    }

    fn keys(&self, partition: &str) -> Result<Vec<String>> {
        validate_partition_name(partition)?;
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT key FROM preferences WHERE partition = ? ORDER BY key")
            .map_err(|e| CoreError::database("failed to prepare query", e))?;

        let rows = stmt
            .query_map(params![partition], |row| row.get::<_, String>(0))
            .map_err(|e| CoreError::database("failed to list keys", e))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row.map_err(|e| CoreError::database("failed to read row", e))?);
        }
        Ok(keys)
    }

    fn location(&self) -> Option<PathBuf> {
        self.db_path.clone()
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        if self.db_path.is_none() {
            return;
        }
        // Flush the WAL into the main file so it does not grow across restarts
        let conn = self.conn.get_mut();
        if let Err(e) = conn.pragma_update(None, "wal_checkpoint", "TRUNCATE") {
            warn!("Failed to checkpoint WAL on SqliteStore drop: {}", e);
        } else {
            debug!("WAL checkpoint completed on SqliteStore drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_store_creation() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path()).unwrap();

        assert_eq!(store.location(), Some(dir.path().join(DB_FILE_NAME)));
        assert!(store.keys("p").unwrap().is_empty());
    }

    #[test]
    fn test_put_get_both_kinds() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .commit(
                "p",
                &[
                    ("title".into(), PrefValue::Text("Alert".into())),
                    ("displayFlag".into(), PrefValue::Int(2)),
                ],
            )
            .unwrap();

        assert_eq!(
            store.get("p", "title").unwrap(),
            Some(PrefValue::Text("Alert".into()))
        );
        assert_eq!(store.get("p", "displayFlag").unwrap(), Some(PrefValue::Int(2)));
        assert_eq!(store.keys("p").unwrap(), vec!["displayFlag", "title"]);
    }

    #[test]
    fn test_overwrite_changes_kind() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.commit("p", &[("k".into(), PrefValue::Int(1))]).unwrap();
        store
            .commit("p", &[("k".into(), PrefValue::Text("one".into()))])
            .unwrap();

        assert_eq!(store.get("p", "k").unwrap(), Some(PrefValue::Text("one".into())));
    }

    #[test]
    fn test_empty_text_is_not_absent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .commit("p", &[("title".into(), PrefValue::Text(String::new()))])
            .unwrap();

        assert_eq!(store.get("p", "title").unwrap(), Some(PrefValue::Text(String::new())));
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = SqliteStore::new(dir.path()).unwrap();
            store
                .commit("p", &[("displayFlag".into(), PrefValue::Int(1))])
                .unwrap();
        }

        let store = SqliteStore::new(dir.path()).unwrap();
        assert_eq!(store.get("p", "displayFlag").unwrap(), Some(PrefValue::Int(1)));
    }

    #[test]
    fn test_partitions_are_isolated() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.commit("a", &[("k".into(), PrefValue::Int(1))]).unwrap();

        assert_eq!(store.get("b", "k").unwrap(), None);
    }
}
