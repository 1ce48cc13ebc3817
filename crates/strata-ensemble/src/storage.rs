//! Ensemble storage driver interface.
//!
//! Node values are persisted as opaque native records keyed by node key
//! plus [`NodeId`]. The real driver lives outside this crate;
//! [`MemoryStorage`] is a reference implementation.

use std::collections::HashMap;

use parking_lot::RwLock;
use strata_core::NodeId;

use crate::error::StorageError;

/// Persistent store for serialized node values.
///
/// Implementations must be safe to share between the threads that
/// initialize different ensemble members.
pub trait EnsembleStorage: Send + Sync {
    /// Whether a value is stored for `key` at `id`.
    fn has_node(&self, key: &str, id: NodeId) -> Result<bool, StorageError>;

    /// Store a record, replacing any previous one.
    fn write_node(&self, key: &str, id: NodeId, record: &[u8]) -> Result<(), StorageError>;

    /// Fetch a stored record.
    fn read_node(&self, key: &str, id: NodeId) -> Result<Vec<u8>, StorageError>;
}

/// In-memory [`EnsembleStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<(String, NodeId), Vec<u8>>>,
}

impl MemoryStorage {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Keys with a record for member `iens`, sorted.
    pub fn keys_for_member(&self, iens: usize) -> Vec<String> {
        let mut keys: Vec<String> = self
            .records
            .read()
            .keys()
            .filter(|(_, id)| id.iens == iens)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}

impl EnsembleStorage for MemoryStorage {
    fn has_node(&self, key: &str, id: NodeId) -> Result<bool, StorageError> {
        Ok(self.records.read().contains_key(&(key.to_string(), id)))
    }

    fn write_node(&self, key: &str, id: NodeId, record: &[u8]) -> Result<(), StorageError> {
        self.records
            .write()
            .insert((key.to_string(), id), record.to_vec());
        Ok(())
    }

    fn read_node(&self, key: &str, id: NodeId) -> Result<Vec<u8>, StorageError> {
        self.records
            .read()
            .get(&(key.to_string(), id))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
                id,
            })
    }
}
