//! In-memory store backend for testing.

use crate::backend::StoreBackend;
use crate::error::StorageResult;
use std::cell::Cell;
use std::collections::HashMap;

/// An in-memory store backend.
///
/// Holds the meta object and all segment payloads in a `HashMap`. Suitable
/// for unit tests, integration tests and ephemeral maps that do not need
/// persistence.
///
/// The store counts successful payload reads and payload writes so that
/// tests can assert lazy-load and write-avoidance behavior.
///
/// # Example
///
/// ```
/// use arcmap_storage::{MemoryStore, StoreBackend};
///
/// let mut store = MemoryStore::new();
/// store.write(7, b"data").unwrap();
/// assert_eq!(store.read(7).unwrap().as_deref(), Some(&b"data"[..]));
/// assert_eq!(store.reads(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    meta: Option<Vec<u8>>,
    segments: HashMap<u64, Vec<u8>>,
    reads: Cell<usize>,
    writes: usize,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `read` calls that found a payload.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// Number of `write` calls for segment payloads.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Resets the read and write counters.
    pub fn reset_counters(&mut self) {
        self.reads.set(0);
        self.writes = 0;
    }

    /// Addresses currently holding a payload, in ascending order.
    #[must_use]
    pub fn addresses(&self) -> Vec<u64> {
        let mut addrs: Vec<_> = self.segments.keys().copied().collect();
        addrs.sort_unstable();
        addrs
    }
}

impl StoreBackend for MemoryStore {
    fn read_meta(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.meta.clone())
    }

    fn write_meta(&mut self, data: &[u8]) -> StorageResult<()> {
        self.meta = Some(data.to_vec());
        Ok(())
    }

    fn read(&self, addr: u64) -> StorageResult<Option<Vec<u8>>> {
        let payload = self.segments.get(&addr).cloned();
        if payload.is_some() {
            self.reads.set(self.reads.get() + 1);
        }
        Ok(payload)
    }

    fn write(&mut self, addr: u64, data: &[u8]) -> StorageResult<()> {
        self.writes += 1;
        self.segments.insert(addr, data.to_vec());
        Ok(())
    }
}
