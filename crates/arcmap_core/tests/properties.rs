//! Property-based checks of the engine invariants.

use arcmap_codec::JsonCodec;
use arcmap_core::{CodecStore, MapConfig, SegmentedMap};
use arcmap_storage::MemoryStore;
use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

type TestMap = SegmentedMap<u8, String>;

fn in_memory(capacity: usize) -> TestMap {
    SegmentedMap::open(MapConfig::new().capacity(capacity), None, None).unwrap()
}

/// An insert or removal, as generated operation input.
#[derive(Debug, Clone)]
enum Op {
    Put(u8),
    Cut(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u8>().prop_map(Op::Put),
        1 => any::<u8>().prop_map(Op::Cut),
    ]
}

proptest! {
    /// The map agrees with a plain ordered-map model under arbitrary
    /// operation sequences, and the engine invariants hold after each
    /// operation.
    #[test]
    fn matches_model_and_keeps_invariants(
        ops in prop::collection::vec(op_strategy(), 1..200),
        capacity in 1usize..8,
    ) {
        let mut map = in_memory(capacity);
        let mut model: BTreeMap<u8, String> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Put(key) => {
                    let created = map.put(key, key.to_string()).unwrap();
                    prop_assert_eq!(created, model.insert(key, key.to_string()).is_none());
                }
                Op::Cut(key) => match model.remove(&key) {
                    Some(value) => prop_assert_eq!(map.cut(key).unwrap(), value),
                    None => prop_assert!(map.cut(key).unwrap_err().is_not_found()),
                },
            }
            map.verify().unwrap();
        }

        let got: Vec<(u8, String)> = map.values().map(Result::unwrap).collect();
        let want: Vec<(u8, String)> = model.into_iter().collect();
        prop_assert_eq!(got, want);
    }

    /// Every key lives in exactly one segment, and that segment's interval
    /// contains it.
    #[test]
    fn keys_are_exclusive_to_their_segment(
        keys in prop::collection::btree_set(any::<u8>(), 1..64),
    ) {
        let mut map = in_memory(3);
        for &key in &keys {
            map.put(key, key.to_string()).unwrap();
        }

        let mut seen: BTreeSet<u8> = BTreeSet::new();
        for segment in map.segments() {
            let pairs = segment.payload().expect("fresh map holds no swapped segments");
            for (&key, _) in pairs.iter() {
                prop_assert!(segment.interval().contains(key));
                prop_assert!(seen.insert(key), "key {} held by two segments", key);
            }
        }
        prop_assert_eq!(seen, keys);
    }

    /// Successor scans agree with the model's range queries at arbitrary
    /// split points.
    #[test]
    fn successors_match_model_ranges(
        keys in prop::collection::btree_set(any::<u8>(), 0..64),
        from in any::<u8>(),
    ) {
        let mut map = in_memory(4);
        for &key in &keys {
            map.put(key, key.to_string()).unwrap();
        }

        let got: Vec<u8> = map.successors(from).map(|item| item.unwrap().0).collect();
        let want: Vec<u8> = keys.range(from..).copied().collect();
        prop_assert_eq!(got, want);
    }

    /// Sync and reopen preserve the ordered pair sequence exactly.
    #[test]
    fn sync_then_reopen_preserves_pairs(
        keys in prop::collection::btree_set(any::<u8>(), 1..64),
        capacity in 1usize..8,
    ) {
        let backend = Rc::new(RefCell::new(MemoryStore::new()));

        {
            let source = CodecStore::new(Rc::clone(&backend), JsonCodec::new());
            let sink = CodecStore::new(Rc::clone(&backend), JsonCodec::new());
            let mut map: TestMap = SegmentedMap::open(
                MapConfig::new().capacity(capacity),
                Some(Box::new(source)),
                Some(Box::new(sink)),
            )
            .unwrap();

            for &key in &keys {
                map.put(key, key.to_string()).unwrap();
            }
            map.sync().unwrap();
        }

        let source = CodecStore::new(Rc::clone(&backend), JsonCodec::new());
        let mut reopened: TestMap = SegmentedMap::open(
            MapConfig::new().capacity(capacity),
            Some(Box::new(source)),
            None,
        )
        .unwrap();

        let got: Vec<(u8, String)> = reopened.values().map(Result::unwrap).collect();
        let want: Vec<(u8, String)> = keys.iter().map(|&k| (k, k.to_string())).collect();
        prop_assert_eq!(got, want);
        reopened.verify().unwrap();
    }
}
