//! Store backend trait definition.

use crate::error::StorageResult;
use std::cell::RefCell;
use std::rc::Rc;

/// A low-level store for segment payloads and the topology descriptor.
///
/// Store backends are **opaque byte stores**. They hold one small meta object
/// plus one object per segment, addressed by the segment's high endpoint.
/// The engine owns all format interpretation - backends do not understand
/// topology descriptors or pair payloads.
///
/// # Invariants
///
/// - Absence of the meta object or of a segment object is **not** an error:
///   `read_meta` and `read` return `Ok(None)` for it.
/// - `write_meta` and `write` are total replaces of the addressed object.
/// - `read(addr)` returns exactly the bytes last written at `addr`.
///
/// # Implementors
///
/// - [`super::MemoryStore`] - for testing
/// - [`super::FileStore`] - for persistent storage
pub trait StoreBackend {
    /// Reads the topology descriptor, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn read_meta(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the topology descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn write_meta(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Reads the payload stored at `addr`, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn read(&self, addr: u64) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the payload stored at `addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn write(&mut self, addr: u64, data: &[u8]) -> StorageResult<()>;
}

/// Shared single-threaded handle to a backend.
///
/// The engine takes its reader and writer as two separate objects; a shared
/// handle lets both sides address one backend instance. Backend methods
/// never re-enter the backend, so the `RefCell` borrows are always local.
impl<B: StoreBackend> StoreBackend for Rc<RefCell<B>> {
    fn read_meta(&self) -> StorageResult<Option<Vec<u8>>> {
        self.borrow().read_meta()
    }

    fn write_meta(&mut self, data: &[u8]) -> StorageResult<()> {
        self.borrow_mut().write_meta(data)
    }

    fn read(&self, addr: u64) -> StorageResult<Option<Vec<u8>>> {
        self.borrow().read(addr)
    }

    fn write(&mut self, addr: u64, data: &[u8]) -> StorageResult<()> {
        self.borrow_mut().write(addr, data)
    }
}
