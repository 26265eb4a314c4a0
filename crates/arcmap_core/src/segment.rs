//! Segment: one interval's pairs plus their load/flush lifecycle.

use crate::error::{CoreError, CoreResult};
use crate::key::MapKey;
use crate::pairs::PairSet;
use crate::store::{SegmentSink, SegmentSource};
use crate::topology::Interval;
use tracing::debug;

/// Lifecycle of a segment's in-memory payload.
///
/// The payload travels with the state, so a dirty segment without a payload
/// is unrepresentable.
#[derive(Debug, Clone)]
pub enum SegmentState<K, V> {
    /// Not materialized: never loaded, or (in a future eviction path)
    /// dropped after flush.
    Swapped,
    /// Materialized and clean: matches the store.
    Present(PairSet<K, V>),
    /// Materialized with at least one unflushed mutation.
    Dirty(PairSet<K, V>),
}

/// A stateful container of one interval's pairs.
///
/// Segments are created swapped and materialize their payload on first
/// access: through the reader when one is configured, as an empty container
/// otherwise (a missing store object means a never-written segment, not an
/// error). Mutations mark the segment dirty; [`Segment::write`] flushes
/// dirty payloads and a failed flush stays dirty so the next sync retries.
#[derive(Debug)]
pub struct Segment<K, V> {
    interval: Interval<K>,
    state: SegmentState<K, V>,
}

impl<K: MapKey, V> Segment<K, V> {
    /// Creates a swapped segment owning `interval`.
    pub fn new(interval: Interval<K>) -> Self {
        Self {
            interval,
            state: SegmentState::Swapped,
        }
    }

    /// The interval this segment is responsible for.
    pub fn interval(&self) -> &Interval<K> {
        &self.interval
    }

    /// Whether the payload is not materialized.
    pub fn is_swapped(&self) -> bool {
        matches!(self.state, SegmentState::Swapped)
    }

    /// Whether the payload holds unflushed mutations.
    pub fn is_dirty(&self) -> bool {
        matches!(self.state, SegmentState::Dirty(_))
    }

    /// Number of pairs in the payload; zero while swapped.
    pub fn len(&self) -> usize {
        self.payload().map_or(0, PairSet::len)
    }

    /// Borrows the payload if it is materialized.
    pub fn payload(&self) -> Option<&PairSet<K, V>> {
        match &self.state {
            SegmentState::Swapped => None,
            SegmentState::Present(pairs) | SegmentState::Dirty(pairs) => Some(pairs),
        }
    }

    /// Materializes the payload if it is swapped.
    ///
    /// With a reader, the store payload is decoded (absent object: empty);
    /// without one, an empty payload is installed. Present and dirty
    /// segments are untouched.
    ///
    /// # Errors
    ///
    /// Propagates reader failures; the segment stays swapped.
    pub fn load<S>(&mut self, source: Option<&S>) -> CoreResult<()>
    where
        S: SegmentSource<K, V> + ?Sized,
    {
        if !self.is_swapped() {
            return Ok(());
        }

        let pairs = match source {
            Some(source) => {
                let pairs = source.read(self.interval.hi)?.unwrap_or_default();
                debug!(addr = %self.interval.hi, pairs = pairs.len(), "segment loaded");
                pairs
            }
            None => PairSet::new(),
        };

        self.state = SegmentState::Present(pairs);
        Ok(())
    }

    /// Inserts or overwrites a pair, loading the payload on demand.
    ///
    /// Returns `true` iff the key was new. Both insert and overwrite leave
    /// the segment dirty.
    ///
    /// # Errors
    ///
    /// Propagates load failures; nothing is inserted then.
    pub fn put<S>(&mut self, key: K, value: V, source: Option<&S>) -> CoreResult<bool>
    where
        S: SegmentSource<K, V> + ?Sized,
    {
        self.load(source)?;

        match std::mem::replace(&mut self.state, SegmentState::Swapped) {
            SegmentState::Present(mut pairs) | SegmentState::Dirty(mut pairs) => {
                let created = pairs.put(key, value);
                self.state = SegmentState::Dirty(pairs);
                Ok(created)
            }
            SegmentState::Swapped => unreachable!("payload materialized by load"),
        }
    }

    /// Looks up a key, loading the payload on demand.
    ///
    /// Lookup does not change a materialized state: a dirty segment stays
    /// dirty, a present one stays present.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub fn get<S>(&mut self, key: K, source: Option<&S>) -> CoreResult<Option<&V>>
    where
        S: SegmentSource<K, V> + ?Sized,
    {
        self.load(source)?;
        Ok(self.payload().and_then(|pairs| pairs.get(&key)))
    }

    /// Removes a key, loading the payload on demand.
    ///
    /// The segment becomes dirty only if a pair was actually removed.
    ///
    /// # Errors
    ///
    /// Propagates load failures; nothing is removed then.
    pub fn cut<S>(&mut self, key: K, source: Option<&S>) -> CoreResult<Option<V>>
    where
        S: SegmentSource<K, V> + ?Sized,
    {
        self.load(source)?;

        match std::mem::replace(&mut self.state, SegmentState::Swapped) {
            SegmentState::Present(mut pairs) => {
                let removed = pairs.cut(&key);
                self.state = if removed.is_some() {
                    SegmentState::Dirty(pairs)
                } else {
                    SegmentState::Present(pairs)
                };
                Ok(removed)
            }
            SegmentState::Dirty(mut pairs) => {
                let removed = pairs.cut(&key);
                self.state = SegmentState::Dirty(pairs);
                Ok(removed)
            }
            SegmentState::Swapped => unreachable!("payload materialized by load"),
        }
    }

    /// Borrows the payload, loading it on demand.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub fn pairs<S>(&mut self, source: Option<&S>) -> CoreResult<&PairSet<K, V>>
    where
        S: SegmentSource<K, V> + ?Sized,
    {
        self.load(source)?;
        match &self.state {
            SegmentState::Present(pairs) | SegmentState::Dirty(pairs) => Ok(pairs),
            SegmentState::Swapped => unreachable!("payload materialized by load"),
        }
    }

    /// Divides this segment between two child intervals.
    ///
    /// The payload is split at `high.lo`: this segment keeps the high half
    /// and adopts `high`; the returned segment owns the low half under
    /// `low`. Both come out dirty.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptTopology`] if the payload is swapped -
    /// the engine only splits segments it has just mutated.
    pub fn split(&mut self, low: Interval<K>, high: Interval<K>) -> CoreResult<Segment<K, V>> {
        match std::mem::replace(&mut self.state, SegmentState::Swapped) {
            SegmentState::Present(mut pairs) | SegmentState::Dirty(mut pairs) => {
                let low_pairs = pairs.split(&high.lo);
                self.interval = high;
                self.state = SegmentState::Dirty(pairs);

                Ok(Segment {
                    interval: low,
                    state: SegmentState::Dirty(low_pairs),
                })
            }
            SegmentState::Swapped => Err(CoreError::corrupt_topology(format!(
                "segment [{}, {}] split while swapped",
                self.interval.lo, self.interval.hi
            ))),
        }
    }

    /// Flushes the payload if it is dirty.
    ///
    /// Empty payloads are not written - a segment that never held pairs (or
    /// lost them all) leaves no store object. A failed write keeps the
    /// segment dirty.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn write<S>(&mut self, sink: &mut S) -> CoreResult<()>
    where
        S: SegmentSink<K, V> + ?Sized,
    {
        match std::mem::replace(&mut self.state, SegmentState::Swapped) {
            SegmentState::Dirty(pairs) => {
                if pairs.is_empty() {
                    self.state = SegmentState::Present(pairs);
                    return Ok(());
                }

                match sink.write(self.interval.hi, &pairs) {
                    Ok(()) => {
                        self.state = SegmentState::Present(pairs);
                        Ok(())
                    }
                    Err(err) => {
                        self.state = SegmentState::Dirty(pairs);
                        Err(err)
                    }
                }
            }
            other => {
                self.state = other;
                Ok(())
            }
        }
    }
}
