//! The segmented map: routing, splitting, iteration and sync.

use crate::config::MapConfig;
use crate::error::{CoreError, CoreResult};
use crate::key::MapKey;
use crate::segment::Segment;
use crate::store::{CodecStore, SegmentSink, SegmentSource};
use crate::topology::Topology;
use arcmap_codec::JsonCodec;
use arcmap_storage::FileStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

fn missing_segment<K: MapKey>(addr: K) -> CoreError {
    CoreError::corrupt_topology(format!("no segment for interval address {addr}"))
}

/// An ordered key-value map stored in fixed-capacity segments.
///
/// The map routes every operation through its [`Topology`]: the interval
/// covering the key names the responsible [`Segment`], segments materialize
/// their payload from the reader on first touch, and a segment that
/// outgrows the configured capacity is halved until every half fits (or its
/// interval shrinks to a single key). [`SegmentedMap::sync`] flushes dirty
/// segments and then the topology, meta last.
///
/// The map is not internally synchronized; mutating operations take
/// `&mut self` and callers serialize access.
///
/// # Example
///
/// ```
/// use arcmap_core::{MapConfig, SegmentedMap};
///
/// let mut map: SegmentedMap<u8, String> =
///     SegmentedMap::open(MapConfig::new().capacity(4), None, None).unwrap();
///
/// map.put(0x10, "16".to_string()).unwrap();
/// assert_eq!(map.get(0x10).unwrap(), "16");
/// assert!(map.get(0x11).unwrap_err().is_not_found());
/// ```
pub struct SegmentedMap<K: MapKey, V> {
    topology: Topology<K>,
    segments: BTreeMap<K, Segment<K, V>>,
    capacity: usize,
    source: Option<Box<dyn SegmentSource<K, V>>>,
    sink: Option<Box<dyn SegmentSink<K, V>>>,
}

impl<K: MapKey, V> SegmentedMap<K, V> {
    /// Opens a map over the given reader and writer.
    ///
    /// With a reader, the persisted topology is recovered and one swapped
    /// segment is instantiated per interval; no payload is touched. Without
    /// one the map starts from a single full-domain interval. A map opened
    /// without a writer serves reads and in-memory writes but cannot
    /// [`SegmentedMap::sync`].
    ///
    /// # Errors
    ///
    /// Returns an error on a failed meta read or an invalid persisted
    /// partition.
    pub fn open(
        config: MapConfig,
        source: Option<Box<dyn SegmentSource<K, V>>>,
        sink: Option<Box<dyn SegmentSink<K, V>>>,
    ) -> CoreResult<Self> {
        let topology = match &source {
            Some(source) => source.read_meta()?.unwrap_or_default(),
            None => Topology::new(),
        };

        let segments = topology
            .iter()
            .map(|iv| (iv.hi, Segment::new(*iv)))
            .collect();

        Ok(Self {
            topology,
            segments,
            capacity: config.capacity,
            source,
            sink,
        })
    }

    /// Inserts or overwrites a pair.
    ///
    /// Returns `true` iff the key was new. May split the receiving segment
    /// (repeatedly) when it outgrows the capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment cannot be loaded or the topology is
    /// corrupt.
    pub fn put(&mut self, key: K, value: V) -> CoreResult<bool> {
        let addr = self.addr_of(key)?;
        let segment = self
            .segments
            .get_mut(&addr)
            .ok_or_else(|| missing_segment(addr))?;

        let created = segment.put(key, value, self.source.as_deref())?;

        if segment.len() > self.capacity && !segment.interval().is_minimal() {
            self.split(key)?;
        }

        Ok(created)
    }

    /// Returns the value stored for `key`.
    ///
    /// # Errors
    ///
    /// [`CoreError::KeyNotFound`] if the key is absent; I/O and decode
    /// errors if the segment cannot be loaded.
    pub fn get(&mut self, key: K) -> CoreResult<&V> {
        let addr = self.addr_of(key)?;
        let segment = self
            .segments
            .get_mut(&addr)
            .ok_or_else(|| missing_segment(addr))?;

        segment
            .get(key, self.source.as_deref())?
            .ok_or_else(|| CoreError::key_not_found(key))
    }

    /// Removes the pair stored for `key` and returns its value.
    ///
    /// # Errors
    ///
    /// [`CoreError::KeyNotFound`] if the key is absent; I/O and decode
    /// errors if the segment cannot be loaded.
    pub fn cut(&mut self, key: K) -> CoreResult<V> {
        let addr = self.addr_of(key)?;
        let segment = self
            .segments
            .get_mut(&addr)
            .ok_or_else(|| missing_segment(addr))?;

        segment
            .cut(key, self.source.as_deref())?
            .ok_or_else(|| CoreError::key_not_found(key))
    }

    /// All pairs in ascending key order.
    ///
    /// Segments are loaded one at a time, each when the iteration first
    /// reaches its interval; load and decode failures surface as `Err`
    /// items and end the iteration.
    pub fn values(&mut self) -> Values<'_, K, V> {
        let addrs: Vec<K> = self.topology.iter().map(|iv| iv.hi).collect();
        Values::new(self, addrs, None)
    }

    /// Pairs with keys `>= key`, in ascending key order.
    ///
    /// Same loading behavior as [`SegmentedMap::values`], starting at the
    /// interval covering `key`.
    pub fn successors(&mut self, key: K) -> Values<'_, K, V> {
        let addrs: Vec<K> = self.topology.successors(key).map(|iv| iv.hi).collect();
        Values::new(self, addrs, Some(key))
    }

    /// Flushes every dirty segment, then the topology.
    ///
    /// Clean segments and empty payloads issue no writes, so a second sync
    /// with no mutations in between only rewrites meta. A segment whose
    /// write failed stays dirty and is retried by the next sync.
    ///
    /// # Errors
    ///
    /// [`CoreError::MissingWriter`] if the map was opened without a writer;
    /// otherwise the first write failure.
    pub fn sync(&mut self) -> CoreResult<()> {
        let sink = self.sink.as_deref_mut().ok_or(CoreError::MissingWriter)?;

        for segment in self.segments.values_mut() {
            segment.write(sink)?;
        }
        sink.write_meta(&self.topology)?;

        debug!(segments = self.segments.len(), "map synced");
        Ok(())
    }

    /// The current topology.
    pub fn topology(&self) -> &Topology<K> {
        &self.topology
    }

    /// The segments in interval order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment<K, V>> {
        self.segments.values()
    }

    /// Number of segments (equals the number of intervals).
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Whether any segment holds unflushed mutations.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.segments.values().any(Segment::is_dirty)
    }

    /// Checks the engine invariants.
    ///
    /// Verifies that the intervals form a gap-free partition, that topology
    /// and segment map agree in both directions, and that every
    /// materialized payload is contained in its interval and within
    /// capacity (minimal intervals exempt). Swapped segments are not
    /// loaded.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptTopology`] describing the first
    /// violation found.
    pub fn verify(&self) -> CoreResult<()> {
        Topology::from_intervals(self.topology.iter().copied().collect::<Vec<_>>())?;

        for iv in self.topology.iter() {
            let segment = self.segments.get(&iv.hi).ok_or_else(|| missing_segment(iv.hi))?;
            if segment.interval() != iv {
                return Err(CoreError::corrupt_topology(format!(
                    "segment at {} owns [{}, {}], topology says [{}, {}]",
                    iv.hi,
                    segment.interval().lo,
                    segment.interval().hi,
                    iv.lo,
                    iv.hi
                )));
            }
        }

        for (addr, segment) in &self.segments {
            let covering = self.topology.locate(segment.interval().lo);
            if covering.map(|iv| iv.hi) != Some(*addr) {
                return Err(CoreError::corrupt_topology(format!(
                    "segment address {addr} is not an interval endpoint"
                )));
            }

            let Some(pairs) = segment.payload() else {
                continue;
            };
            for boundary in [pairs.first_key(), pairs.last_key()].into_iter().flatten() {
                if !segment.interval().contains(*boundary) {
                    return Err(CoreError::corrupt_topology(format!(
                        "key {boundary} outside segment interval [{}, {}]",
                        segment.interval().lo,
                        segment.interval().hi
                    )));
                }
            }
            if pairs.len() > self.capacity && !segment.interval().is_minimal() {
                return Err(CoreError::corrupt_topology(format!(
                    "segment at {addr} holds {} pairs over capacity {}",
                    pairs.len(),
                    self.capacity
                )));
            }
        }

        Ok(())
    }

    fn addr_of(&self, key: K) -> CoreResult<K> {
        self.topology
            .locate(key)
            .map(|iv| iv.hi)
            .ok_or_else(|| CoreError::corrupt_topology(format!("no interval covers key {key}")))
    }

    /// Halves the interval containing `key` until both halves fit the
    /// capacity or the interval is minimal.
    fn split(&mut self, key: K) -> CoreResult<()> {
        loop {
            let (low, high) = self.topology.halve(key)?;
            if low == high {
                // Minimal interval: the segment stays overloaded.
                debug!(key = %key, "split abandoned on minimal interval");
                return Ok(());
            }

            let tail = self
                .segments
                .get_mut(&high.hi)
                .ok_or_else(|| missing_segment(high.hi))?;
            let head = tail.split(low, high)?;
            let (head_len, tail_len) = (head.len(), tail.len());

            debug!(
                lo = %low.lo,
                mid = %low.hi,
                hi = %high.hi,
                head = head_len,
                tail = tail_len,
                "segment split"
            );
            self.segments.insert(low.hi, head);

            if head_len <= self.capacity && tail_len <= self.capacity {
                return Ok(());
            }
        }
    }
}

impl<K, V> SegmentedMap<K, V>
where
    K: MapKey + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned + 'static,
{
    /// Opens a map over the JSON reference layout: a directory holding
    /// `meta.json` plus one `<addr>.json` per segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the persisted
    /// meta is invalid.
    pub fn open_json_dir(config: MapConfig, dir: &Path) -> CoreResult<Self> {
        let source = CodecStore::new(FileStore::open(dir)?, JsonCodec::new());
        let sink = CodecStore::new(FileStore::open(dir)?, JsonCodec::new());
        Self::open(config, Some(Box::new(source)), Some(Box::new(sink)))
    }
}

/// Ordered iterator over a map's pairs.
///
/// Yields `Ok((key, value))` items; a failed segment load yields one `Err`
/// and fuses the iterator. Each segment is loaded when the iteration first
/// reaches its interval, one load per segment traversed.
pub struct Values<'a, K: MapKey, V> {
    map: &'a mut SegmentedMap<K, V>,
    addrs: std::vec::IntoIter<K>,
    current: std::vec::IntoIter<(K, V)>,
    start: Option<K>,
    done: bool,
}

impl<'a, K: MapKey, V> Values<'a, K, V> {
    fn new(map: &'a mut SegmentedMap<K, V>, addrs: Vec<K>, start: Option<K>) -> Self {
        Self {
            map,
            addrs: addrs.into_iter(),
            current: Vec::new().into_iter(),
            start,
            done: false,
        }
    }
}

impl<K: MapKey, V: Clone> Iterator for Values<'_, K, V> {
    type Item = CoreResult<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(pair) = self.current.next() {
                return Some(Ok(pair));
            }

            let Some(addr) = self.addrs.next() else {
                self.done = true;
                return None;
            };

            let map = &mut *self.map;
            let Some(segment) = map.segments.get_mut(&addr) else {
                self.done = true;
                return Some(Err(missing_segment(addr)));
            };

            let pairs = match segment.pairs(map.source.as_deref()) {
                Ok(pairs) => pairs,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            };

            let cloned: Vec<(K, V)> = match &self.start {
                Some(start) => pairs
                    .iter_from(start)
                    .map(|(key, value)| (*key, value.clone()))
                    .collect(),
                None => pairs
                    .iter()
                    .map(|(key, value)| (*key, value.clone()))
                    .collect(),
            };
            self.current = cloned.into_iter();
        }
    }
}
