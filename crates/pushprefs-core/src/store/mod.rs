//! Persistent key-value store for preferences
//!
//! A store holds named partitions, each a flat map from key to a text or
//! integer value. Writes go through an [`Editor`] and become visible and
//! durable together on [`Editor::commit`].
//!
//! Backends:
//! - [`MemoryStore`]: process-local, nothing persisted (tests)
//! - [`JsonFileStore`]: one JSON document per partition
//! - [`SqliteStore`]: a single SQLite database for all partitions

pub mod json_file;
pub mod memory;
pub mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::{BackendKind, PrefsConfig};
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// A single stored preference value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Int(i32),
    Text(String),
}

impl PrefValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PrefValue::Text(s) => Some(s),
            PrefValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            PrefValue::Int(i) => Some(*i),
            PrefValue::Text(_) => None,
        }
    }
}

/// Storage abstraction shared by all backends
///
/// Implementations serialize commits internally, so concurrent callers see
/// last-writer-wins per key.
pub trait PreferenceStore: Send + Sync {
    /// Read a single value, `None` if the key was never written
    fn get(&self, partition: &str, key: &str) -> Result<Option<PrefValue>>;

    /// Apply all changes as one atomic commit
    fn commit(&self, partition: &str, changes: &[(String, PrefValue)]) -> Result<()>;

    /// Sorted list of keys present in a partition
    fn keys(&self, partition: &str) -> Result<Vec<String>>;

    /// Where the store persists its data, if anywhere
    fn location(&self) -> Option<PathBuf>;
}

/// Reject partition names that cannot double as a file stem.
pub fn validate_partition_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.starts_with('.') {
        Some("name starts with '.'")
    } else if name.contains(['/', '\\']) {
        Some("name contains a path separator")
    } else if name.contains('\0') {
        Some("name contains NUL")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CoreError::InvalidPartition {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Named view over a shared store
pub struct Partition<S: PreferenceStore + ?Sized = dyn PreferenceStore> {
    store: Arc<S>,
    name: String,
}

impl<S: PreferenceStore + ?Sized> Clone for Partition<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: self.name.clone(),
        }
    }
}

impl<S: PreferenceStore + ?Sized> Partition<S> {
    pub fn new(store: Arc<S>, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_partition_name(&name)?;
        Ok(Self { store, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.store.get(&self.name, key)?.is_some())
    }

    /// Text value for `key`, or `default` when absent
    pub fn get_string(&self, key: &str, default: &str) -> Result<String> {
        match self.store.get(&self.name, key)? {
            None => Ok(default.to_string()),
            Some(PrefValue::Text(s)) => Ok(s),
            Some(PrefValue::Int(_)) => Err(self.mismatch(key, "text")),
        }
    }

    /// Integer value for `key`, or `default` when absent
    pub fn get_int(&self, key: &str, default: i32) -> Result<i32> {
        match self.store.get(&self.name, key)? {
            None => Ok(default),
            Some(PrefValue::Int(i)) => Ok(i),
            Some(PrefValue::Text(_)) => Err(self.mismatch(key, "integer")),
        }
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.store.keys(&self.name)
    }

    pub fn edit(&self) -> Editor<'_, S> {
        Editor {
            partition: self,
            pending: Vec::new(),
        }
    }

    fn mismatch(&self, key: &str, expected: &'static str) -> CoreError {
        CoreError::TypeMismatch {
            partition: self.name.clone(),
            key: key.to_string(),
            expected,
        }
    }
}

/// Batch of pending writes against one partition
///
/// Nothing is visible until [`Editor::commit`]. Dropping an editor
/// discards its changes.
#[must_use = "changes are discarded unless commit() is called"]
pub struct Editor<'a, S: PreferenceStore + ?Sized> {
    partition: &'a Partition<S>,
    pending: Vec<(String, PrefValue)>,
}

impl<S: PreferenceStore + ?Sized> Editor<'_, S> {
    pub fn put_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pending.push((key.into(), PrefValue::Text(value.into())));
        self
    }

    pub fn put_int(mut self, key: impl Into<String>, value: i32) -> Self {
        self.pending.push((key.into(), PrefValue::Int(value)));
        self
    }

    pub fn commit(self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let partition = self.partition.name();
        self.partition.store.commit(partition, &self.pending)?;
        debug!(partition, changes = self.pending.len(), "Preferences committed");
        Ok(())
    }
}

/// Open the backend selected by `config`
pub fn open_store(config: &PrefsConfig) -> Result<Arc<dyn PreferenceStore>> {
    let store: Arc<dyn PreferenceStore> = match config.backend {
        BackendKind::Memory => Arc::new(MemoryStore::new()),
        BackendKind::Json => Arc::new(JsonFileStore::new(config.effective_data_dir()?)),
        BackendKind::Sqlite => Arc::new(SqliteStore::new(&config.effective_data_dir()?)?),
    };
    debug!(backend = ?config.backend, location = ?store.location(), "Preference store opened");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition() -> Partition<MemoryStore> {
        Partition::new(Arc::new(MemoryStore::new()), "test.partition").unwrap()
    }

    #[test]
    fn test_partition_name_validation() {
        assert!(validate_partition_name("com.mosync.internal.android.notifications").is_ok());

        for bad in ["", ".hidden", "a/b", "a\\b", "a\0b"] {
            let err = validate_partition_name(bad).unwrap_err();
            assert!(matches!(err, CoreError::InvalidPartition { .. }), "{bad:?}");
        }
    }

    #[test]
    fn test_defaults_when_absent() {
        let prefs = partition();
        assert_eq!(prefs.get_string("missing", "fallback").unwrap(), "fallback");
        assert_eq!(prefs.get_int("missing", 7).unwrap(), 7);
        assert!(!prefs.contains("missing").unwrap());
    }

    #[test]
    fn test_editor_commit_applies_batch() {
        let prefs = partition();
        prefs
            .edit()
            .put_string("name", "value")
            .put_int("count", 3)
            .commit()
            .unwrap();

        assert_eq!(prefs.get_string("name", "").unwrap(), "value");
        assert_eq!(prefs.get_int("count", 0).unwrap(), 3);
        assert_eq!(prefs.keys().unwrap(), vec!["count", "name"]);
    }

    #[test]
    fn test_dropped_editor_discards_changes() {
        let prefs = partition();
        let _ = prefs.edit().put_string("name", "lost");
        assert!(!prefs.contains("name").unwrap());
    }

    #[test]
    fn test_later_put_in_same_batch_wins() {
        let prefs = partition();
        prefs
            .edit()
            .put_string("name", "first")
            .put_string("name", "second")
            .commit()
            .unwrap();
        assert_eq!(prefs.get_string("name", "").unwrap(), "second");
    }

    #[test]
    fn test_type_mismatch() {
        let prefs = partition();
        prefs.edit().put_int("count", 1).commit().unwrap();

        let err = prefs.get_string("count", "").unwrap_err();
        assert!(matches!(err, CoreError::TypeMismatch { expected: "text", .. }));
    }

    #[test]
    fn test_pref_value_json_shape() {
        let text: PrefValue = serde_json::from_str("\"hello\"").unwrap();
        let int: PrefValue = serde_json::from_str("42").unwrap();
        assert_eq!(text.as_text(), Some("hello"));
        assert_eq!(int.as_int(), Some(42));
        assert_eq!(serde_json::to_string(&PrefValue::Int(5)).unwrap(), "5");
    }
}
