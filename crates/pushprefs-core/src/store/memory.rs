//! In-memory preference store
//!
//! Nothing is persisted; used as the test double and by the `memory` backend.

use super::{validate_partition_name, PrefValue, PreferenceStore};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Process-local store (thread-safe)
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<HashMap<String, BTreeMap<String, PrefValue>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, partition: &str, key: &str) -> Result<Option<PrefValue>> {
        validate_partition_name(partition)?;
        Ok(self
            .partitions
            .read()
            .get(partition)
            .and_then(|entries| entries.get(key).cloned()))
    }

    fn commit(&self, partition: &str, changes: &[(String, PrefValue)]) -> Result<()> {
        validate_partition_name(partition)?;
        let mut partitions = self.partitions.write();
        let entries = partitions.entry(partition.to_string()).or_default();
        for (key, value) in changes {
            entries.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn keys(&self, partition: &str) -> Result<Vec<String>> {
        validate_partition_name(partition)?;
        Ok(self
            .partitions
            .read()
            .get(partition)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn location(&self) -> Option<PathBuf> {
        None
    }
}
