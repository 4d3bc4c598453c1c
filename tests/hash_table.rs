// HashTable integration suite.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Uniqueness: duplicate insert is rejected and leaves the table untouched.
// - Lookup faults: `at` on a missing key reports the bucket it searched.
// - Ordering: `iter()` is newest first, untouched by growth and rehash;
//   `bucket_iter()` is bucket-major.
// - Handles: stable across growth, moves and unrelated erasures; dead
//   after their own entry is erased.
// - Copy vs move: clones are deep and independent, moves keep handles.
use arena_containers::{ContainerError, HashTable, Pair, TableConfig};
use std::collections::BTreeMap;

// Test: insert three, erase one, sum the rest.
// Verifies: size bookkeeping, `exists` after erase, value iteration.
#[test]
fn abc_insert_erase_sum() {
    let mut t = HashTable::new();
    t.insert("a", 1).unwrap();
    t.insert("b", 2).unwrap();
    t.insert("c", 3).unwrap();
    assert_eq!(t.len(), 3);

    assert_eq!(t.erase("b"), Some(2));
    assert_eq!(t.len(), 2);
    assert!(!t.exists("b"));
    assert_eq!(t.count("b"), 0);
    assert_eq!(t.values().sum::<i32>(), 4);
}

// Test: unique keys policy.
// Verifies: DuplicateKey error, the stored value is unchanged.
#[test]
fn duplicate_insert_rejected() {
    let mut t = HashTable::new();
    let h = t.insert("dup".to_string(), 1).unwrap();
    assert_eq!(t.insert("dup".to_string(), 2), Err(ContainerError::DuplicateKey));
    assert_eq!(t.len(), 1);
    assert_eq!(h.value(&t), Some(&1));

    assert_eq!(t.insert_or_assign("dup".to_string(), 5), Some(1));
    assert_eq!(t["dup"], 5);
}

// Test: checked lookup of a missing key.
// Verifies: KeyNotFound carries the bucket `bucket()` reports.
#[test]
fn at_missing_key_is_a_fault() {
    let mut t: HashTable<String, i32> = HashTable::new();
    t.insert("present".into(), 1).unwrap();
    let bucket = t.bucket("missing");
    let err = t.at("missing").unwrap_err();
    assert_eq!(err, ContainerError::KeyNotFound { bucket });
    assert!(err.to_string().contains(&bucket.to_string()));
    assert_eq!(t.at("present"), Ok(&1));
    assert!(t.at_mut("missing").is_err());
}

// Test: iteration order across growth.
// Assumes: default table starts with 128 buckets and load factor 1.0.
// Verifies: many inserts grow the buckets, order stays newest first.
#[test]
fn insertion_order_survives_growth() {
    let mut t = HashTable::new();
    for i in 0..1000u32 {
        t.insert(i, i * 2).unwrap();
    }
    assert!(t.bucket_count() >= 1000);
    assert!(t.load_factor() <= t.max_load_factor());
    let keys: Vec<u32> = t.keys().copied().collect();
    let expected: Vec<u32> = (0..1000).rev().collect();
    assert_eq!(keys, expected);
    let oldest_first: Vec<u32> = t.keys().rev().copied().collect();
    assert_eq!(oldest_first, (0..1000).collect::<Vec<_>>());
}

// Test: explicit rehash.
// Verifies: bucket count follows the request but never drops below what
// the load factor needs; entries and order survive.
#[test]
fn rehash_grows_and_shrinks_buckets() {
    let mut t = HashTable::with_buckets(8);
    for i in 0..8 {
        t.insert(i, ()).unwrap();
    }
    t.rehash(64);
    assert_eq!(t.bucket_count(), 64);
    t.rehash(2);
    assert_eq!(t.bucket_count(), 8);
    t.rehash(0);
    assert_eq!(t.bucket_count(), 8);
    assert_eq!(t.keys().copied().collect::<Vec<_>>(), (0..8).rev().collect::<Vec<_>>());
    for i in 0..8 {
        assert!(t.contains_key(&i));
    }
}

// Test: configuration and load factor validation.
// Verifies: invalid factors are rejected, lowering the factor grows.
#[test]
fn config_and_load_factor() {
    assert_eq!(
        HashTable::<u8, u8>::with_config(TableConfig::default().with_max_load_factor(0.0)).err(),
        Some(ContainerError::InvalidLoadFactor(0.0))
    );
    let cfg = TableConfig::default()
        .with_initial_buckets(4)
        .with_max_load_factor(2.0);
    let mut t = HashTable::with_config(cfg).unwrap();
    for i in 0..8 {
        t.insert(i, i).unwrap();
    }
    assert_eq!(t.bucket_count(), 4);
    t.insert(8, 8).unwrap();
    assert_eq!(t.bucket_count(), 8);

    assert!(t.set_max_load_factor(f32::NAN).is_err());
    t.set_max_load_factor(0.5).unwrap();
    assert!(t.bucket_count() >= 18);
    assert_eq!(t.max_load_factor(), 0.5);
}

// Test: bucket-major iteration.
// Verifies: every entry once, bucket indexes non-decreasing, each chain
// in insertion order, and the per-bucket lengths add up.
#[test]
fn bucket_iter_is_bucket_major() {
    let mut t = HashTable::with_buckets(16);
    for i in 0..12u64 {
        t.insert(i, i).unwrap();
    }
    let seen: Vec<u64> = t.bucket_iter().map(|(k, _)| *k).collect();
    assert_eq!(seen.len(), 12);
    let buckets: Vec<usize> = seen.iter().map(|k| t.bucket(k)).collect();
    assert!(buckets.windows(2).all(|w| w[0] <= w[1]));

    let mut chains: BTreeMap<usize, Vec<u64>> = BTreeMap::new();
    for k in &seen {
        chains.entry(t.bucket(k)).or_default().push(*k);
    }
    for (b, chain) in chains {
        assert!(chain.windows(2).all(|w| w[0] < w[1]), "bucket {b} out of order");
        assert_eq!(t.bucket_len(b), Ok(chain.len()));
    }
    let total: usize = (0..t.bucket_count()).map(|b| t.bucket_len(b).unwrap()).sum();
    assert_eq!(total, 12);
    assert!(t.bucket_len(16).is_err());

    let back: Vec<u64> = t.bucket_iter().rev().map(|(k, _)| *k).collect();
    assert_eq!(back, seen.into_iter().rev().collect::<Vec<_>>());
}

// Test: handles across structural change.
// Verifies: stable through growth and move, dead after erase.
#[test]
fn handles_are_stable_until_erased() {
    let mut t = HashTable::with_buckets(1);
    let h = t.insert("keep".to_string(), 7).unwrap();
    let gone = t.insert("gone".to_string(), 8).unwrap();
    for i in 0..200 {
        t.insert(i.to_string(), i).unwrap();
    }
    assert_eq!(h.key(&t).map(String::as_str), Some("keep"));
    assert_eq!(t.remove(gone), Some(("gone".to_string(), 8)));
    assert_eq!(gone.value(&t), None);
    assert_eq!(t.remove(gone), None);

    let mut moved = t;
    *h.value_mut(&mut moved).unwrap() += 1;
    assert_eq!(moved.get("keep"), Some(&8));
}

// Test: deep copy.
// Verifies: a clone compares equal, iterates identically and is
// independent of the original.
#[test]
fn clone_is_independent() {
    let mut a: HashTable<i32, String> = (0..50).map(|i| (i, i.to_string())).collect();
    let b = a.clone();
    assert_eq!(a, b);
    assert!(a.iter().eq(b.iter()));
    a.erase(&3);
    a.get_mut(&4).unwrap().push('!');
    assert_ne!(a, b);
    assert_eq!(b[&3], "3");
    assert_eq!(b[&4], "4");
}

// Test: cursor stepping over the order list.
// Verifies: ghost position, decrement from the end, seek by offset.
#[test]
fn cursor_walks_order_list() {
    let mut t = HashTable::new();
    for k in ["x", "y", "z"] {
        t.insert(k, k.len()).unwrap();
    }
    let mut c = t.cursor_front();
    assert_eq!(c.key(), Some(&"z"));
    c.seek_forward(2);
    assert_eq!(c, t.cursor_back());
    c.move_next();
    assert!(c.is_ghost());
    assert_eq!(c, t.cursor_end());
    c.move_prev();
    assert_eq!(c.key(), Some(&"x"));
    c.seek_backward(2);
    assert_eq!(c.current(), Some((&"z", &1)));

    assert_eq!(t.cursor("y").value(), Some(&1));
    assert!(t.cursor("nope").is_ghost());
}

// Test: mutable iteration and consuming iteration.
// Verifies: values_mut updates in place; into_iter yields owned pairs.
#[test]
fn mutable_and_owned_iteration() {
    let mut t: HashTable<u8, u32> = (1..=5).map(|k| (k, u32::from(k))).collect();
    for v in t.values_mut() {
        *v *= 100;
    }
    for (_, v) in &mut t {
        *v += 1;
    }
    assert_eq!(t[&3], 301);
    let mut owned: Vec<(u8, u32)> = t.into_iter().collect();
    owned.sort();
    assert_eq!(owned, vec![(1, 101), (2, 201), (3, 301), (4, 401), (5, 501)]);
}

// Test: Pair entry insertion and lazy defaults.
// Verifies: insert_pair, get_or_insert_default, get_or_insert_with only
// builds a value for a missing key.
#[test]
fn pair_insert_and_get_or_insert() {
    let mut t: HashTable<&str, Vec<u8>> = HashTable::new();
    t.insert_pair(Pair::new("p", vec![1])).unwrap();
    t.get_or_insert_default("p").push(2);
    t.get_or_insert_default("q").push(9);
    assert_eq!(t["p"], vec![1, 2]);
    assert_eq!(t["q"], vec![9]);

    let mut built = 0;
    t.get_or_insert_with("p", || {
        built += 1;
        Vec::new()
    });
    assert_eq!(built, 0);
    assert_eq!(t.len(), 2);
}

// Test: clear keeps buckets, kills handles.
#[test]
fn clear_keeps_bucket_count() {
    let mut t = HashTable::with_buckets(32);
    let h = t.insert(1, 1).unwrap();
    t.clear();
    assert!(t.is_empty());
    assert_eq!(t.bucket_count(), 32);
    assert_eq!(h.value(&t), None);
    assert_eq!(t.iter().next(), None);
    t.insert(1, 2).unwrap();
    assert_eq!(t[&1], 2);
}

// Test: missing key through Index panics.
#[test]
#[should_panic]
fn index_missing_key_panics() {
    let t: HashTable<i32, i32> = HashTable::new();
    let _ = t[&1];
}
