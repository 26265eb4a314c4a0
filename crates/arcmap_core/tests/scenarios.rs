//! End-to-end scenarios over the reference store layouts.

use arcmap_codec::{BinaryCodec, JsonCodec};
use arcmap_core::{
    CodecStore, CoreError, CoreResult, MapConfig, PairSet, SegmentSink, SegmentedMap, Topology,
};
use arcmap_storage::{FileStore, MemoryStore, StorageError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tempfile::tempdir;

type TestMap = SegmentedMap<u8, String>;

fn open_dir(dir: &Path, capacity: usize) -> TestMap {
    SegmentedMap::open_json_dir(MapConfig::new().capacity(capacity), dir).unwrap()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

fn collect_pairs(map: &mut TestMap) -> Vec<(u8, String)> {
    map.values().map(Result::unwrap).collect()
}

#[test]
fn trivial_put_and_lookup() {
    let dir = tempdir().unwrap();
    let mut map = open_dir(dir.path(), 4);

    map.put(0x10, "16".to_string()).unwrap();
    assert_eq!(map.get(0x10).unwrap(), "16");

    let missing = map.get(0x11).unwrap_err();
    assert!(missing.is_not_found());
    assert!(missing.to_string().contains("17"));
}

#[test]
fn four_keys_stay_in_one_segment() {
    let dir = tempdir().unwrap();
    let mut map = open_dir(dir.path(), 4);

    for key in [0x10u8, 0x20, 0x30, 0x40] {
        map.put(key, key.to_string()).unwrap();
    }

    assert!(map.topology().is_initial());
    map.sync().unwrap();

    // One segment file plus meta.
    assert_eq!(file_names(dir.path()), vec!["000000ff.json", "meta.json"]);
}

#[test]
fn fifth_key_splits_until_halves_fit() {
    let dir = tempdir().unwrap();
    let mut map = open_dir(dir.path(), 4);

    for key in [0x10u8, 0x20, 0x30, 0x40, 0x50] {
        map.put(key, key.to_string()).unwrap();
    }

    // The first halving moves nothing (all five keys are below 0x80), so
    // the low half is halved again before both sides fit.
    let intervals: Vec<(u8, u8)> = map.topology().iter().map(|iv| (iv.lo, iv.hi)).collect();
    assert_eq!(intervals, vec![(0x00, 0x3f), (0x40, 0x7f), (0x80, 0xff)]);

    map.sync().unwrap();

    // The empty high segment leaves no file.
    assert_eq!(
        file_names(dir.path()),
        vec!["0000003f.json", "0000007f.json", "meta.json"]
    );
}

#[test]
fn dense_inserts_keep_capacity_bound() {
    let dir = tempdir().unwrap();
    let mut map = open_dir(dir.path(), 4);

    for key in 0x00u8..=0x0f {
        map.put(key, key.to_string()).unwrap();
        map.verify().unwrap();

        for segment in map.segments() {
            assert!(
                segment.len() <= 4 || segment.interval().is_minimal(),
                "segment [{}, {}] holds {} pairs",
                segment.interval().lo,
                segment.interval().hi,
                segment.len()
            );
        }
    }

    let keys: Vec<u8> = collect_pairs(&mut map).into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, (0x00..=0x0f).collect::<Vec<u8>>());
}

#[test]
fn random_keys_survive_reopen() {
    let dir = tempdir().unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let mut model: BTreeMap<u8, String> = BTreeMap::new();

    {
        let mut map = open_dir(dir.path(), 4);
        for _ in 0..100 {
            let key: u8 = rng.gen();
            map.put(key, key.to_string()).unwrap();
            model.insert(key, key.to_string());
        }
        map.sync().unwrap();
    }

    let mut reopened = open_dir(dir.path(), 4);
    let expected: Vec<(u8, String)> = model.into_iter().collect();
    assert_eq!(collect_pairs(&mut reopened), expected);
    reopened.verify().unwrap();
}

#[test]
fn empty_directory_reads_as_empty_map() {
    let dir = tempdir().unwrap();
    let mut map = open_dir(dir.path(), 4);

    assert!(map.topology().is_initial());
    assert_eq!(collect_pairs(&mut map), Vec::new());

    // Nothing was created on disk by opening and iterating.
    assert_eq!(file_names(dir.path()), Vec::<String>::new());
}

#[test]
fn json_objects_use_the_reference_shape() {
    let dir = tempdir().unwrap();
    let mut map = open_dir(dir.path(), 4);
    map.put(0x10, "16".to_string()).unwrap();
    map.sync().unwrap();

    let meta: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.path().join("meta.json")).unwrap()).unwrap();
    assert_eq!(meta, serde_json::json!([{"r": 0, "l": 0, "h": 255}]));

    let segment: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.path().join("000000ff.json")).unwrap()).unwrap();
    assert_eq!(segment, serde_json::json!([{"k": 16, "v": "16"}]));
}

#[test]
fn binary_layout_round_trips() {
    let dir = tempdir().unwrap();

    let open_binary = |capacity: usize| -> TestMap {
        let source = CodecStore::new(
            FileStore::open_with_extension(dir.path(), "bin").unwrap(),
            BinaryCodec::new(),
        );
        let sink = CodecStore::new(
            FileStore::open_with_extension(dir.path(), "bin").unwrap(),
            BinaryCodec::new(),
        );
        SegmentedMap::open(
            MapConfig::new().capacity(capacity),
            Some(Box::new(source)),
            Some(Box::new(sink)),
        )
        .unwrap()
    };

    let keys = [0x02u8, 0x15, 0x31, 0x44, 0x73, 0x9b, 0xd0, 0xee];
    {
        let mut map = open_binary(2);
        for key in keys {
            map.put(key, key.to_string()).unwrap();
        }
        map.sync().unwrap();
    }

    assert!(dir.path().join("meta.bin").is_file());

    let mut reopened = open_binary(2);
    let pairs = collect_pairs(&mut reopened);
    let expected: Vec<(u8, String)> = keys.iter().map(|&k| (k, k.to_string())).collect();
    assert_eq!(pairs, expected);
}

/// Sink whose payload writes can be made to fail from the outside.
struct FlakySink {
    inner: CodecStore<Rc<RefCell<MemoryStore>>, JsonCodec>,
    fail: Rc<Cell<bool>>,
}

impl SegmentSink<u8, String> for FlakySink {
    fn write_meta(&mut self, topology: &Topology<u8>) -> CoreResult<()> {
        <CodecStore<Rc<RefCell<MemoryStore>>, JsonCodec> as SegmentSink<u8, String>>::write_meta(
            &mut self.inner,
            topology,
        )
    }

    fn write(&mut self, addr: u8, pairs: &PairSet<u8, String>) -> CoreResult<()> {
        if self.fail.get() {
            return Err(CoreError::Storage(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected write failure",
            ))));
        }
        self.inner.write(addr, pairs)
    }
}

#[test]
fn failed_write_stays_dirty_and_retries() {
    let backend = Rc::new(RefCell::new(MemoryStore::new()));
    let fail = Rc::new(Cell::new(true));

    let source = CodecStore::new(Rc::clone(&backend), JsonCodec::new());
    let sink = FlakySink {
        inner: CodecStore::new(Rc::clone(&backend), JsonCodec::new()),
        fail: Rc::clone(&fail),
    };

    let mut map: TestMap = SegmentedMap::open(
        MapConfig::new().capacity(4),
        Some(Box::new(source)),
        Some(Box::new(sink)),
    )
    .unwrap();

    map.put(0x10, "16".to_string()).unwrap();

    let err = map.sync().unwrap_err();
    assert!(matches!(err, CoreError::Storage(_)));
    assert!(map.is_dirty(), "failed write must leave the segment dirty");
    assert_eq!(backend.borrow().writes(), 0);

    fail.set(false);
    map.sync().unwrap();
    assert!(!map.is_dirty());
    assert_eq!(backend.borrow().writes(), 1);

    // The retried payload is intact.
    let source = CodecStore::new(Rc::clone(&backend), JsonCodec::new());
    let mut reopened: TestMap = SegmentedMap::open(
        MapConfig::new().capacity(4),
        Some(Box::new(source)),
        None,
    )
    .unwrap();
    assert_eq!(reopened.get(0x10).unwrap(), "16");
}
