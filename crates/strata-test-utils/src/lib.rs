//! Test utilities and mock collaborators for Strata development.
//!
//! Provides mock implementations of the ensemble's external seams
//! ([`SummaryRefcase`], [`EnsembleStorage`]) and grid/field
//! [`fixtures`] shared by the integration tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};

use strata_core::NodeId;
use strata_ensemble::{EnsembleStorage, MemoryStorage, StorageError, SummaryRefcase};

/// Mock implementation of [`SummaryRefcase`] over a fixed key list.
pub struct MockRefcase {
    keys: Vec<String>,
}

impl MockRefcase {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl SummaryRefcase for MockRefcase {
    fn keys(&self) -> Vec<String> {
        self.keys.clone()
    }
}

/// Storage that accepts `budget` writes and fails every later one with
/// [`StorageError::Backend`]. Reads and lookups go to an inner
/// [`MemoryStorage`].
pub struct FailingStorage {
    inner: MemoryStorage,
    budget: usize,
    writes: AtomicUsize,
}

impl FailingStorage {
    pub fn new(budget: usize) -> Self {
        Self {
            inner: MemoryStorage::new(),
            budget,
            writes: AtomicUsize::new(0),
        }
    }

    /// Writes attempted so far, failed ones included.
    pub fn write_attempts(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl EnsembleStorage for FailingStorage {
    fn has_node(&self, key: &str, id: NodeId) -> Result<bool, StorageError> {
        self.inner.has_node(key, id)
    }

    fn write_node(&self, key: &str, id: NodeId, record: &[u8]) -> Result<(), StorageError> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst);
        if n >= self.budget {
            return Err(StorageError::Backend {
                reason: format!("write {n} of {key} rejected (budget {})", self.budget),
            });
        }
        self.inner.write_node(key, id, record)
    }

    fn read_node(&self, key: &str, id: NodeId) -> Result<Vec<u8>, StorageError> {
        self.inner.read_node(key, id)
    }
}
