//! Key-space topology: the partition of the domain into intervals.

use crate::error::{CoreError, CoreResult};
use crate::key::MapKey;
use std::collections::BTreeMap;
use std::ops::Bound;

/// A contiguous closed interval `[lo, hi]` of the key domain.
///
/// Each interval identifies exactly one segment; the `hi` endpoint is the
/// segment's stable store address. `rank` records the halving depth at
/// which the interval was produced. It is informational - routing uses the
/// endpoints alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval<K> {
    /// Halving depth at which this interval was produced.
    pub rank: u32,
    /// Low endpoint, inclusive.
    pub lo: K,
    /// High endpoint, inclusive.
    pub hi: K,
}

impl<K: MapKey> Interval<K> {
    /// The interval covering the whole key domain.
    #[must_use]
    pub fn full() -> Self {
        Self {
            rank: 0,
            lo: K::MIN,
            hi: K::MAX,
        }
    }

    /// Whether `key` lies within this interval.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.lo <= key && key <= self.hi
    }

    /// Whether this interval has shrunk to a single key and cannot be
    /// halved further.
    #[must_use]
    pub fn is_minimal(&self) -> bool {
        self.lo == self.hi
    }

    /// The midpoint this interval halves around.
    #[must_use]
    pub fn midpoint(&self) -> K {
        K::midpoint(self.lo, self.hi)
    }
}

/// The set of intervals partitioning the key domain.
///
/// Always a gap-free, overlap-free cover of `[K::MIN, K::MAX]`, addressable
/// by `hi`. Starts as a single full-domain interval; [`Topology::halve`] is
/// the only mutation and preserves the partition by construction.
#[derive(Debug, Clone)]
pub struct Topology<K: MapKey> {
    /// Intervals keyed by their `hi` endpoint.
    arcs: BTreeMap<K, Interval<K>>,
}

impl<K: MapKey> Default for Topology<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: MapKey> Topology<K> {
    /// Creates the initial topology: one full-domain interval.
    #[must_use]
    pub fn new() -> Self {
        let full = Interval::full();
        Self {
            arcs: BTreeMap::from([(full.hi, full)]),
        }
    }

    /// Rebuilds a topology from decoded intervals.
    ///
    /// An empty sequence denotes the initial state. Anything else must form
    /// a gap-free cover of the full domain.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptTopology`] if the intervals overlap,
    /// leave a gap, or fail to reach the domain endpoints.
    pub fn from_intervals(intervals: Vec<Interval<K>>) -> CoreResult<Self> {
        if intervals.is_empty() {
            return Ok(Self::new());
        }

        let mut sorted = intervals;
        sorted.sort_by_key(|iv| iv.lo);

        let first = sorted[0];
        if first.lo != K::MIN {
            return Err(CoreError::corrupt_topology(format!(
                "partition starts at {} instead of the domain minimum",
                first.lo
            )));
        }

        let mut arcs = BTreeMap::new();
        let mut prev: Option<Interval<K>> = None;
        for iv in sorted {
            if iv.hi < iv.lo {
                return Err(CoreError::corrupt_topology(format!(
                    "interval [{}, {}] is inverted",
                    iv.lo, iv.hi
                )));
            }
            if let Some(prev) = prev {
                if prev.hi == K::MAX || iv.lo != prev.hi.next() {
                    return Err(CoreError::corrupt_topology(format!(
                        "gap or overlap between [{}, {}] and [{}, {}]",
                        prev.lo, prev.hi, iv.lo, iv.hi
                    )));
                }
            }
            arcs.insert(iv.hi, iv);
            prev = Some(iv);
        }

        if prev.map_or(true, |iv| iv.hi != K::MAX) {
            return Err(CoreError::corrupt_topology(
                "partition does not reach the domain maximum",
            ));
        }

        Ok(Self { arcs })
    }

    /// Returns the interval covering `key`.
    ///
    /// `None` only if the partition is corrupt.
    #[must_use]
    pub fn locate(&self, key: K) -> Option<&Interval<K>> {
        self.arcs
            .range((Bound::Included(key), Bound::Unbounded))
            .map(|(_, iv)| iv)
            .next()
            .filter(|iv| iv.contains(key))
    }

    /// Halves the interval covering `key` around its midpoint.
    ///
    /// Replaces `[lo, hi]` at rank `r` with `[lo, m]` and `[m + 1, hi]` at
    /// rank `r + 1` and returns `(low, high)`. A minimal interval cannot be
    /// halved: the call is a no-op returning the interval twice.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptTopology`] if no interval covers `key`.
    pub fn halve(&mut self, key: K) -> CoreResult<(Interval<K>, Interval<K>)> {
        let parent = *self.locate(key).ok_or_else(|| {
            CoreError::corrupt_topology(format!("no interval covers key {key}"))
        })?;

        if parent.is_minimal() {
            return Ok((parent, parent));
        }

        let mid = parent.midpoint();
        let low = Interval {
            rank: parent.rank + 1,
            lo: parent.lo,
            hi: mid,
        };
        let high = Interval {
            rank: parent.rank + 1,
            lo: mid.next(),
            hi: parent.hi,
        };

        self.arcs.insert(high.hi, high);
        self.arcs.insert(low.hi, low);

        Ok((low, high))
    }

    /// Intervals whose `hi` endpoint is `>= key`, in ascending order.
    pub fn successors(&self, key: K) -> impl Iterator<Item = &Interval<K>> {
        self.arcs
            .range((Bound::Included(key), Bound::Unbounded))
            .map(|(_, iv)| iv)
    }

    /// All intervals in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Interval<K>> {
        self.arcs.values()
    }

    /// Number of intervals in the partition.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Whether the topology is still the single full-domain interval.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.arcs.len() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intervals(topology: &Topology<u8>) -> Vec<(u8, u8)> {
        topology.iter().map(|iv| (iv.lo, iv.hi)).collect()
    }

    #[test]
    fn initial_state_covers_domain() {
        let topology = Topology::<u8>::new();
        assert_eq!(intervals(&topology), vec![(0x00, 0xff)]);
        assert_eq!(topology.locate(0x00).unwrap().hi, 0xff);
        assert_eq!(topology.locate(0xff).unwrap().lo, 0x00);
    }

    #[test]
    fn halve_splits_around_midpoint() {
        let mut topology = Topology::<u8>::new();
        let (low, high) = topology.halve(0x50).unwrap();

        assert_eq!((low.lo, low.hi, low.rank), (0x00, 0x7f, 1));
        assert_eq!((high.lo, high.hi, high.rank), (0x80, 0xff, 1));
        assert_eq!(intervals(&topology), vec![(0x00, 0x7f), (0x80, 0xff)]);
    }

    #[test]
    fn halve_is_deterministic_in_the_interval() {
        // Same interval, different trigger keys: same midpoint.
        let mut a = Topology::<u8>::new();
        let mut b = Topology::<u8>::new();
        assert_eq!(a.halve(0x01).unwrap(), b.halve(0xfe).unwrap());
    }

    #[test]
    fn repeated_halving_stays_gap_free() {
        let mut topology = Topology::<u8>::new();
        for _ in 0..8 {
            topology.halve(0x00).unwrap();
        }

        let ivs = intervals(&topology);
        assert_eq!(ivs[0], (0x00, 0x00));
        let mut expected_lo = 0x00u16;
        for &(lo, hi) in &ivs {
            assert_eq!(u16::from(lo), expected_lo);
            assert!(lo <= hi);
            expected_lo = u16::from(hi) + 1;
        }
        assert_eq!(expected_lo, 0x100);
    }

    #[test]
    fn halve_of_minimal_interval_is_noop() {
        let mut topology = Topology::<u8>::new();
        for _ in 0..8 {
            topology.halve(0x42).unwrap();
        }

        let before = topology.len();
        let (low, high) = topology.halve(0x42).unwrap();
        assert_eq!(low, high);
        assert!(low.is_minimal());
        assert_eq!(low.lo, 0x42);
        assert_eq!(topology.len(), before);
    }

    #[test]
    fn locate_routes_to_covering_interval() {
        let mut topology = Topology::<u8>::new();
        topology.halve(0x00).unwrap();

        assert_eq!(topology.locate(0x7f).unwrap().hi, 0x7f);
        assert_eq!(topology.locate(0x80).unwrap().hi, 0xff);
    }

    #[test]
    fn successors_start_at_covering_interval() {
        let mut topology = Topology::<u8>::new();
        topology.halve(0x00).unwrap();
        topology.halve(0x00).unwrap();

        let his: Vec<u8> = topology.successors(0x45).map(|iv| iv.hi).collect();
        assert_eq!(his, vec![0x7f, 0xff]);

        let all: Vec<u8> = topology.successors(0x00).map(|iv| iv.hi).collect();
        assert_eq!(all, vec![0x3f, 0x7f, 0xff]);
    }

    #[test]
    fn from_intervals_roundtrip() {
        let mut topology = Topology::<u8>::new();
        topology.halve(0x10).unwrap();
        topology.halve(0x10).unwrap();
        topology.halve(0xd0).unwrap();

        let rebuilt =
            Topology::from_intervals(topology.iter().copied().collect()).unwrap();
        assert_eq!(intervals(&rebuilt), intervals(&topology));
    }

    #[test]
    fn from_intervals_accepts_empty() {
        let topology = Topology::<u8>::from_intervals(Vec::new()).unwrap();
        assert!(topology.is_initial());
    }

    #[test]
    fn from_intervals_rejects_gap() {
        let result = Topology::<u8>::from_intervals(vec![
            Interval { rank: 1, lo: 0x00, hi: 0x7f },
            Interval { rank: 1, lo: 0x81, hi: 0xff },
        ]);
        assert!(matches!(result, Err(CoreError::CorruptTopology { .. })));
    }

    #[test]
    fn from_intervals_rejects_partial_cover() {
        let result = Topology::<u8>::from_intervals(vec![Interval {
            rank: 1,
            lo: 0x00,
            hi: 0x7f,
        }]);
        assert!(matches!(result, Err(CoreError::CorruptTopology { .. })));

        let result = Topology::<u8>::from_intervals(vec![Interval {
            rank: 1,
            lo: 0x01,
            hi: 0xff,
        }]);
        assert!(matches!(result, Err(CoreError::CorruptTopology { .. })));
    }

    #[test]
    fn from_intervals_rejects_overlap() {
        let result = Topology::<u8>::from_intervals(vec![
            Interval { rank: 1, lo: 0x00, hi: 0x80 },
            Interval { rank: 1, lo: 0x80, hi: 0xff },
        ]);
        assert!(matches!(result, Err(CoreError::CorruptTopology { .. })));
    }
}
