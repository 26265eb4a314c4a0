//! # arcmap codec
//!
//! Wire formats for arcmap: the translation between the engine's topology
//! descriptor / segment payloads and byte streams.
//!
//! Two formats are provided behind one [`Codec`] trait:
//!
//! - [`JsonCodec`] - the human-readable reference format used by the
//!   file-store layout (`meta.json` plus one `<addr>.json` per segment)
//! - [`BinaryCodec`] - a compact length-prefixed big-endian stream
//!
//! The wire records are deliberately dumb: [`ArcRecord`] is one topology
//! entry `(rank, lo, hi)` and [`PairRecord`] one `(key, value)` pair. The
//! engine converts between these and its own types; codecs never see engine
//! state.
//!
//! ## Example
//!
//! ```
//! use arcmap_codec::{Codec, JsonCodec, PairRecord};
//!
//! let codec = JsonCodec::new();
//! let pairs = vec![PairRecord { key: 16u8, value: "16".to_string() }];
//! let bytes = codec.encode_pairs(&pairs).unwrap();
//! let decoded: Vec<PairRecord<u8, String>> = codec.decode_pairs(&bytes).unwrap();
//! assert_eq!(decoded, pairs);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod binary;
mod error;
mod json;

use serde::{Deserialize, Serialize};

pub use binary::{BinaryCodec, Field};
pub use error::{CodecError, CodecResult};
pub use json::JsonCodec;

/// One topology entry on the wire: a contiguous interval of the key domain
/// and the halving depth that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcRecord<K> {
    /// Halving depth at which the interval was produced.
    #[serde(rename = "r")]
    pub rank: u32,
    /// Low endpoint, inclusive.
    #[serde(rename = "l")]
    pub lo: K,
    /// High endpoint, inclusive. Doubles as the segment address.
    #[serde(rename = "h")]
    pub hi: K,
}

/// One key-value pair on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRecord<K, V> {
    /// The key.
    #[serde(rename = "k")]
    pub key: K,
    /// The value.
    #[serde(rename = "v")]
    pub value: V,
}

/// Encoding and decoding of the two object kinds a store holds.
///
/// Implementations must be pure: identical input produces identical bytes,
/// and decoding is the exact inverse of encoding.
pub trait Codec<K, V> {
    /// Encodes a topology descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be represented in the format.
    fn encode_topology(&self, arcs: &[ArcRecord<K>]) -> CodecResult<Vec<u8>>;

    /// Decodes a topology descriptor.
    ///
    /// An empty sequence is valid and denotes the initial single-interval
    /// state, interchangeable with an absent meta object.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid descriptor.
    fn decode_topology(&self, bytes: &[u8]) -> CodecResult<Vec<ArcRecord<K>>>;

    /// Encodes a segment payload, pairs in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be represented in the format.
    fn encode_pairs(&self, pairs: &[PairRecord<K, V>]) -> CodecResult<Vec<u8>>;

    /// Decodes a segment payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid payload.
    fn decode_pairs(&self, bytes: &[u8]) -> CodecResult<Vec<PairRecord<K, V>>>;
}
