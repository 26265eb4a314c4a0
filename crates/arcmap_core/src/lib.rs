//! # arcmap core
//!
//! A segmented, disk-backed ordered key-value map.
//!
//! The map presents the conventional sorted-map contract - point insert,
//! point lookup, successor scan, point delete - but stores its contents in
//! fixed-capacity segments that move between memory and a backing store on
//! demand. Maps larger than memory keep logarithmic access, in-order
//! traversal across segment boundaries, and per-segment persistence
//! granularity: one store object per segment plus one small topology
//! object.
//!
//! ## How it fits together
//!
//! - [`Topology`] partitions the key domain into contiguous intervals, one
//!   per segment, addressable by their high endpoint. Intervals are only
//!   ever halved, so the partition stays gap-free by construction and
//!   refines itself around the keys actually written.
//! - [`Segment`] owns one interval's pairs and their lifecycle: swapped
//!   until first touched, loaded lazily, marked dirty by mutation, flushed
//!   by sync.
//! - [`SegmentedMap`] routes operations through the topology, splits
//!   segments that outgrow the capacity, and stitches per-segment iteration
//!   into one ordered stream.
//! - [`CodecStore`] adapts any byte store ([`arcmap_storage`]) and wire
//!   format ([`arcmap_codec`]) into the typed reader/writer seam the engine
//!   consumes.
//!
//! The engine is single-writer and not internally synchronized.
//!
//! ## Example
//!
//! ```no_run
//! use arcmap_core::{MapConfig, SegmentedMap};
//! use std::path::Path;
//!
//! let mut map: SegmentedMap<u8, String> =
//!     SegmentedMap::open_json_dir(MapConfig::new().capacity(64), Path::new("data"))?;
//!
//! map.put(0x10, "sixteen".to_string())?;
//! for item in map.successors(0x10) {
//!     let (key, value) = item?;
//!     println!("{key}: {value}");
//! }
//! map.sync()?;
//! # Ok::<(), arcmap_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod key;
mod map;
mod pairs;
mod segment;
mod store;
mod topology;

pub use config::MapConfig;
pub use error::{CoreError, CoreResult};
pub use key::MapKey;
pub use map::{SegmentedMap, Values};
pub use pairs::PairSet;
pub use segment::{Segment, SegmentState};
pub use store::{CodecStore, SegmentSink, SegmentSource};
pub use topology::{Interval, Topology};
