#![cfg(test)]

// Property tests for HashTable kept inside the crate so every step can
// call the private structural checker.

use crate::error::ContainerError;
use crate::hash_table::{Handle, HashTable};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::rc::Rc;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking converges on earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    InsertWith(usize, i32),
    InsertOrAssign(usize, i32),
    Erase(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Rehash(usize),
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::InsertWith(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::InsertOrAssign(i, v)),
            3 => idx.clone().prop_map(Op::Erase),
            2 => idx.clone().prop_map(Op::Find),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Iterate),
            1 => (0usize..40).prop_map(Op::Rehash),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap. Alongside
// the model, `order` mirrors insertion order (newest last) so iteration
// order can be checked exactly, and every step ends with a full
// structural check of chains, order links and load factor.
fn run_state_machine<S: BuildHasher>(
    mut sut: HashTable<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut order: Vec<Key> = Vec::new();
    let mut live: HashMap<Key, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();
    let make_calls = Rc::new(Cell::new(0));

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                match sut.insert(k.clone(), v) {
                    Ok(h) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        prop_assert!(live.insert(k.clone(), h).is_none());
                        order.push(k.clone());
                        model.insert(k, v);
                    }
                    Err(e) => {
                        prop_assert_eq!(e, ContainerError::DuplicateKey);
                        prop_assert!(already, "duplicate error only when key exists");
                    }
                }
            }
            Op::InsertWith(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let counter = make_calls.clone();
                let before = counter.get();
                match sut.insert_with(k.clone(), move || {
                    counter.set(counter.get() + 1);
                    v
                }) {
                    Ok(h) => {
                        prop_assert!(!already);
                        prop_assert_eq!(make_calls.get(), before + 1, "make must run exactly once");
                        prop_assert!(live.insert(k.clone(), h).is_none());
                        order.push(k.clone());
                        model.insert(k, v);
                    }
                    Err(_) => {
                        prop_assert!(already);
                        prop_assert_eq!(make_calls.get(), before, "make must not run on duplicate");
                    }
                }
            }
            Op::InsertOrAssign(i, v) => {
                let k = key_from(&pool, i);
                let old = sut.insert_or_assign(k.clone(), v);
                let model_old = model.insert(k.clone(), v);
                prop_assert_eq!(old, model_old);
                if model_old.is_none() {
                    let h = sut.find(&k).expect("just inserted");
                    live.insert(k.clone(), h);
                    order.push(k);
                }
            }
            Op::Erase(i) => {
                let k = key_from(&pool, i);
                let got = sut.erase(&k);
                prop_assert_eq!(got, model.remove(&k));
                if let Some(h) = live.remove(&k) {
                    order.retain(|o| o != &k);
                    stale.push(h);
                }
            }
            Op::Find(i) => {
                let k = key_from(&pool, i);
                let found = sut.find(&k);
                prop_assert_eq!(found, live.get(&k).copied());
                match model.get(&k) {
                    Some(v) => prop_assert_eq!(sut.at(&k), Ok(v)),
                    None => {
                        let bucket = sut.bucket(&k);
                        prop_assert_eq!(sut.at(&k), Err(ContainerError::KeyNotFound { bucket }));
                    }
                }
            }
            Op::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
                prop_assert_eq!(sut.count(s.as_str()), usize::from(has_model));
            }
            Op::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(&h) = live.get(&k) {
                    let vr = h.value_mut(&mut sut).expect("live handle resolves");
                    *vr = vr.saturating_add(d);
                    if let Some(mv) = model.get_mut(&k) {
                        *mv = mv.saturating_add(d);
                    }
                }
            }
            Op::Iterate => {
                let newest_first: Vec<Key> = sut.keys().cloned().collect();
                let expected: Vec<Key> = order.iter().rev().cloned().collect();
                prop_assert_eq!(newest_first, expected);
                let by_bucket: BTreeSet<Key> = sut.bucket_iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<Key> = model.keys().cloned().collect();
                prop_assert_eq!(by_bucket, m_keys);
            }
            Op::Rehash(n) => {
                sut.rehash(n);
                prop_assert!(sut.bucket_count() >= n.max(1));
            }
            Op::Clear => {
                let buckets = sut.bucket_count();
                sut.clear();
                prop_assert_eq!(sut.bucket_count(), buckets);
                model.clear();
                order.clear();
                stale.extend(live.drain().map(|(_, h)| h));
            }
        }

        sut.assert_consistent();
        for h in &stale {
            prop_assert!(h.value(&sut).is_none(), "stale handle resolved");
        }
        for (k, h) in &live {
            prop_assert_eq!(h.key(&sut), Some(k));
            prop_assert_eq!(h.value(&sut), model.get(k));
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(HashTable::new(), pool, ops)?;
    }

    // A single starting bucket forces growth early and often.
    #[test]
    fn prop_state_machine_small_table((pool, ops) in arb_scenario()) {
        let sut = HashTable::with_buckets(1);
        run_state_machine(sut, pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Same invariants with every key in bucket 0: chains hold the whole table.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut = HashTable::with_hasher(ConstBuildHasher);
        run_state_machine(sut, pool, ops)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    // Clone reproduces contents and iteration order and stays independent.
    #[test]
    fn prop_clone_matches_and_detaches(keys in proptest::collection::vec(any::<u16>(), 0..200)) {
        let mut t: HashTable<u16, u32> = HashTable::with_buckets(4);
        for &k in &keys {
            t.insert_or_assign(k, u32::from(k) * 3);
        }
        let c = t.clone();
        c.assert_consistent();
        prop_assert_eq!(&c, &t);
        let a: Vec<_> = t.iter().collect();
        let b: Vec<_> = c.iter().collect();
        prop_assert_eq!(a, b);

        if let Some(&first) = keys.first() {
            t.erase(&first);
            prop_assert!(c.contains_key(&first));
            prop_assert_ne!(&c, &t);
        }
    }
}

// `Hash` is invoked once per insert or lookup and never by growth.
#[derive(Clone, PartialEq, Eq)]
struct CountingKey(u32, Rc<Cell<usize>>);
impl Hash for CountingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.1.set(self.1.get() + 1);
        self.0.hash(state);
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 16, .. ProptestConfig::default() })]
    #[test]
    fn prop_growth_never_rehashes_keys(n in 1u32..300) {
        let hashes = Rc::new(Cell::new(0));
        let mut t = HashTable::with_buckets(1);
        for i in 0..n {
            t.insert(CountingKey(i, hashes.clone()), i).expect("distinct keys");
        }
        prop_assert_eq!(hashes.get(), n as usize);
        t.rehash(1024);
        prop_assert_eq!(hashes.get(), n as usize);
        t.assert_consistent();
    }
}
