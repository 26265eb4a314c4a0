//! # arcmap storage
//!
//! Store backend trait and implementations for arcmap.
//!
//! This crate provides the lowest-level storage abstraction for the
//! segmented map. A store holds one small **meta object** (the topology
//! descriptor) plus one **payload object per segment**, addressed by the
//! segment's high endpoint. Backends are opaque byte stores - they do not
//! interpret the data they hold.
//!
//! ## Design Principles
//!
//! - Backends move bytes; the engine owns all format interpretation
//! - Absence of an object is `Ok(None)`, never an error: an empty directory
//!   and a never-synced map are indistinguishable
//! - Writes are total replaces of the addressed object
//!
//! ## Available Backends
//!
//! - [`MemoryStore`] - instrumented, for testing and ephemeral maps
//! - [`FileStore`] - one file per object in a directory
//!
//! ## Example
//!
//! ```rust
//! use arcmap_storage::{MemoryStore, StoreBackend};
//!
//! let mut store = MemoryStore::new();
//! store.write(0x7f, b"payload").unwrap();
//! assert_eq!(store.read(0x7f).unwrap().as_deref(), Some(&b"payload"[..]));
//! assert!(store.read(0x80).unwrap().is_none());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StoreBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
