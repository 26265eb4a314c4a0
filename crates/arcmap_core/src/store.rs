//! Typed store seam: reading and writing engine values through a byte
//! store and a codec.
//!
//! The engine consumes [`SegmentSource`] and [`SegmentSink`]; the provided
//! [`CodecStore`] implements both by composing any
//! [`arcmap_storage::StoreBackend`] with any [`arcmap_codec::Codec`]. The
//! backend moves bytes, the codec owns the wire shape, and this module owns
//! the conversion to engine types - backends never see topology or pair
//! state.

use crate::error::CoreResult;
use crate::key::MapKey;
use crate::pairs::PairSet;
use crate::topology::{Interval, Topology};
use arcmap_codec::{ArcRecord, Codec, PairRecord};
use arcmap_storage::StoreBackend;

/// Read side of a segment store.
pub trait SegmentSource<K: MapKey, V> {
    /// Reads the persisted topology.
    ///
    /// `None` when no meta object exists or it decodes to an empty
    /// descriptor - both denote the initial single-interval state.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, decode failure, or an invalid
    /// persisted partition.
    fn read_meta(&self) -> CoreResult<Option<Topology<K>>>;

    /// Reads the payload of the segment addressed by `addr`.
    ///
    /// `None` when the segment was never written; the caller substitutes an
    /// empty payload.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or decode failure.
    fn read(&self, addr: K) -> CoreResult<Option<PairSet<K, V>>>;
}

/// Write side of a segment store.
pub trait SegmentSink<K: MapKey, V> {
    /// Replaces the persisted topology.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or encode failure.
    fn write_meta(&mut self, topology: &Topology<K>) -> CoreResult<()>;

    /// Replaces the payload of the segment addressed by `addr`.
    ///
    /// Never invoked with an empty payload; the engine skips those.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or encode failure.
    fn write(&mut self, addr: K, pairs: &PairSet<K, V>) -> CoreResult<()>;
}

/// A byte store and a codec composed into a typed segment store.
///
/// # Example
///
/// ```
/// use arcmap_core::CodecStore;
/// use arcmap_codec::JsonCodec;
/// use arcmap_storage::MemoryStore;
///
/// let store: CodecStore<MemoryStore, JsonCodec> =
///     CodecStore::new(MemoryStore::new(), JsonCodec::new());
/// # let _ = store;
/// ```
#[derive(Debug)]
pub struct CodecStore<B, C> {
    backend: B,
    codec: C,
}

impl<B, C> CodecStore<B, C> {
    /// Composes a backend and a codec.
    pub fn new(backend: B, codec: C) -> Self {
        Self { backend, codec }
    }

    /// Borrows the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<K, V, B, C> SegmentSource<K, V> for CodecStore<B, C>
where
    K: MapKey,
    V: Clone,
    B: StoreBackend,
    C: Codec<K, V>,
{
    fn read_meta(&self) -> CoreResult<Option<Topology<K>>> {
        let Some(bytes) = self.backend.read_meta()? else {
            return Ok(None);
        };

        let records = self.codec.decode_topology(&bytes)?;
        if records.is_empty() {
            return Ok(None);
        }

        let intervals = records
            .into_iter()
            .map(|rec| Interval {
                rank: rec.rank,
                lo: rec.lo,
                hi: rec.hi,
            })
            .collect();
        Topology::from_intervals(intervals).map(Some)
    }

    fn read(&self, addr: K) -> CoreResult<Option<PairSet<K, V>>> {
        let Some(bytes) = self.backend.read(addr.to_addr())? else {
            return Ok(None);
        };

        let records = self.codec.decode_pairs(&bytes)?;
        Ok(Some(
            records
                .into_iter()
                .map(|rec| (rec.key, rec.value))
                .collect(),
        ))
    }
}

impl<K, V, B, C> SegmentSink<K, V> for CodecStore<B, C>
where
    K: MapKey,
    V: Clone,
    B: StoreBackend,
    C: Codec<K, V>,
{
    fn write_meta(&mut self, topology: &Topology<K>) -> CoreResult<()> {
        let records: Vec<ArcRecord<K>> = topology
            .iter()
            .map(|iv| ArcRecord {
                rank: iv.rank,
                lo: iv.lo,
                hi: iv.hi,
            })
            .collect();

        let bytes = self.codec.encode_topology(&records)?;
        self.backend.write_meta(&bytes)?;
        Ok(())
    }

    fn write(&mut self, addr: K, pairs: &PairSet<K, V>) -> CoreResult<()> {
        let records: Vec<PairRecord<K, V>> = pairs
            .iter()
            .map(|(key, value)| PairRecord {
                key: *key,
                value: value.clone(),
            })
            .collect();

        let bytes = self.codec.encode_pairs(&records)?;
        self.backend.write(addr.to_addr(), &bytes)?;
        Ok(())
    }
}
