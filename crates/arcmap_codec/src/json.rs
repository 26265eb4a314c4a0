//! JSON wire format.
//!
//! The reference store layout keeps both objects human-readable:
//!
//! - topology: a JSON array of `{"r": rank, "l": lo, "h": hi}` objects
//! - payload: a JSON array of `{"k": key, "v": value}` objects in
//!   ascending key order
//!
//! An empty array is accepted on read and is equivalent to an absent
//! object.

use crate::error::CodecResult;
use crate::{ArcRecord, Codec, PairRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Codec producing the JSON reference format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Creates the JSON codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<K, V> Codec<K, V> for JsonCodec
where
    K: Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    fn encode_topology(&self, arcs: &[ArcRecord<K>]) -> CodecResult<Vec<u8>> {
        Ok(serde_json::to_vec(arcs)?)
    }

    fn decode_topology(&self, bytes: &[u8]) -> CodecResult<Vec<ArcRecord<K>>> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn encode_pairs(&self, pairs: &[PairRecord<K, V>]) -> CodecResult<Vec<u8>> {
        Ok(serde_json::to_vec(pairs)?)
    }

    fn decode_pairs(&self, bytes: &[u8]) -> CodecResult<Vec<PairRecord<K, V>>> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
