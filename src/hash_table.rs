//! HashTable: chained buckets over a handle arena, with an insertion-order
//! list threaded through the entries.
//!
//! Layout
//! - Entries live by value in a `SlotMap` arena and are addressed by
//!   generational handles, so growing any buffer never invalidates a link.
//! - `buckets` is a `Vector<Vector<DefaultKey>>`; an entry's handle sits in
//!   bucket `hash % bucket_count`, appended in insertion order.
//! - Each entry also carries `prev`/`next` handles forming a doubly linked
//!   order list, newest at `head`, oldest at `tail`. `iter()` follows it;
//!   `bucket_iter()` walks the buckets instead.
//!
//! Each entry caches its `u64` hash, so rehashing never calls `K: Hash`.
//! Keys are unique: `insert` rejects a present key, `insert_or_assign`
//! overwrites it.

use crate::error::{ContainerError, Result};
use crate::pair::Pair;
use crate::reentrancy::DebugReentrancy;
use crate::vector::Vector;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::{DefaultKey, SecondaryMap, SlotMap};

pub const DEFAULT_BUCKETS: usize = 128;
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;
/// Smallest accepted max load factor: at most 1024 buckets per entry.
pub const MIN_MAX_LOAD_FACTOR: f32 = 1.0 / 1024.0;

/// Largest bucket array the table will allocate. Keeps the power-of-two
/// capacity of the bucket `Vector`, guard slot included, within `isize::MAX` bytes.
const MAX_BUCKETS: usize = isize::MAX as usize / (4 * core::mem::size_of::<Vector<DefaultKey>>());

/// Construction parameters for a [`HashTable`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableConfig {
    /// Bucket count at construction; clamped to at least 1.
    pub initial_buckets: usize,
    /// Entries per bucket allowed before the table doubles its buckets.
    pub max_load_factor: f32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_buckets: DEFAULT_BUCKETS,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

impl TableConfig {
    pub fn with_initial_buckets(mut self, n: usize) -> Self {
        self.initial_buckets = n;
        self
    }

    pub fn with_max_load_factor(mut self, f: f32) -> Self {
        self.max_load_factor = f;
        self
    }

    fn validate(&self) -> Result<()> {
        check_load_factor(self.max_load_factor)
    }
}

fn check_load_factor(f: f32) -> Result<()> {
    if f.is_finite() && f >= MIN_MAX_LOAD_FACTOR {
        Ok(())
    } else {
        Err(ContainerError::InvalidLoadFactor(f))
    }
}

/// Fewest buckets that keep `len` entries within `max_load_factor`,
/// capped at `MAX_BUCKETS`.
fn min_buckets(len: usize, max_load_factor: f32) -> usize {
    let needed = (len as f64 / max_load_factor as f64).ceil();
    if needed >= MAX_BUCKETS as f64 {
        MAX_BUCKETS
    } else {
        (needed as usize).max(1)
    }
}

/// Stable reference to one entry. Stays valid across rehashes and moves of
/// the table; never resolves again once its entry is removed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub fn key<'a, K, V, S>(&self, table: &'a HashTable<K, V, S>) -> Option<&'a K> {
        table.handle_key(*self)
    }

    pub fn value<'a, K, V, S>(&self, table: &'a HashTable<K, V, S>) -> Option<&'a V> {
        table.handle_value(*self)
    }

    pub fn value_mut<'a, K, V, S>(&self, table: &'a mut HashTable<K, V, S>) -> Option<&'a mut V> {
        table.handle_value_mut(*self)
    }
}

#[derive(Debug)]
struct Node<K, V> {
    entry: Pair<K, V>,
    hash: u64,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

/// Arena, buckets and order list. Kept apart from the hasher and the
/// reentrancy guard so a guarded section can mutate it field-disjointly.
struct Storage<K, V> {
    slots: SlotMap<DefaultKey, Node<K, V>>,
    buckets: Vector<Vector<DefaultKey>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<K, V> Storage<K, V> {
    fn with_buckets(count: usize) -> Self {
        Self {
            slots: SlotMap::with_key(),
            buckets: empty_buckets(count),
            head: None,
            tail: None,
        }
    }

    #[inline]
    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.bucket_count() as u64) as usize
    }

    /// Scan one chain for `q`; yields the chain position and the handle.
    fn find_in_bucket<Q>(&self, bucket: usize, hash: u64, q: &Q) -> Option<(usize, DefaultKey)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.buckets[bucket]
            .iter()
            .enumerate()
            .find_map(|(pos, &k)| {
                let node = self.slots.get(k)?;
                (node.hash == hash && node.entry.first.borrow() == q).then_some((pos, k))
            })
    }

    /// Store a new entry, append it to `bucket` and make it the order-list head.
    fn link_new(&mut self, bucket: usize, hash: u64, key: K, value: V) -> DefaultKey {
        let old_head = self.head;
        let k = self.slots.insert(Node {
            entry: Pair::new(key, value),
            hash,
            prev: None,
            next: old_head,
        });
        match old_head {
            Some(h) => self.slots[h].prev = Some(k),
            None => self.tail = Some(k),
        }
        self.head = Some(k);
        self.buckets[bucket].push_back(k);
        k
    }

    /// Double the buckets if one more entry would exceed `max_load_factor`.
    fn grow_for_one(&mut self, max_load_factor: f32) {
        let count = self.bucket_count();
        let after = self.slots.len() + 1;
        if after as f64 > count as f64 * max_load_factor as f64 {
            let target = count
                .saturating_mul(2)
                .max(min_buckets(after, max_load_factor))
                .min(MAX_BUCKETS);
            if target <= count {
                return;
            }
            log::debug!("hash table grow: {count} -> {target} buckets ({after} entries)");
            self.redistribute(target);
        }
    }

    fn link_grown(&mut self, hash: u64, key: K, value: V, max_load_factor: f32) -> DefaultKey {
        self.grow_for_one(max_load_factor);
        let bucket = self.bucket_of(hash);
        self.link_new(bucket, hash, key, value)
    }

    /// Detach `k` from the order list and its chain, returning the node.
    fn unlink(&mut self, k: DefaultKey) -> Option<Node<K, V>> {
        let node = self.slots.remove(k)?;
        match node.prev {
            Some(p) => self.slots[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.slots[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        let bucket = self.bucket_of(node.hash);
        let chain = &mut self.buckets[bucket];
        if let Some(pos) = chain.find_id(&k) {
            let removed = chain.erase_range(pos, pos + 1);
            debug_assert_eq!(removed, 1);
        }
        Some(node)
    }

    /// Rebuild the bucket array with `count` buckets from the cached hashes.
    /// Walking oldest to newest keeps every chain in insertion order.
    fn redistribute(&mut self, count: usize) {
        let mut buckets = empty_buckets(count);
        let count = buckets.len() as u64;
        let mut cur = self.tail;
        while let Some(k) = cur {
            let node = &self.slots[k];
            buckets[(node.hash % count) as usize].push_back(k);
            cur = node.prev;
        }
        self.buckets = buckets;
    }

    fn clear(&mut self) {
        // SlotMap::clear bumps generations, so old handles stay dead.
        self.slots.clear();
        for chain in self.buckets.iter_mut() {
            chain.clear();
        }
        self.head = None;
        self.tail = None;
    }
}

fn empty_buckets(count: usize) -> Vector<Vector<DefaultKey>> {
    let mut buckets = Vector::new();
    buckets.resize(count.clamp(1, MAX_BUCKETS));
    buckets
}

pub struct HashTable<K, V, S = DefaultHashBuilder> {
    hasher: S,
    storage: Storage<K, V>,
    max_load_factor: f32,
    reentrancy: DebugReentrancy,
}

impl<K, V> HashTable<K, V, DefaultHashBuilder> {
    /// Empty table with [`DEFAULT_BUCKETS`] buckets.
    pub fn new() -> Self {
        Self::with_buckets_and_hasher(DEFAULT_BUCKETS, DefaultHashBuilder::default())
    }

    pub fn with_buckets(n: usize) -> Self {
        Self::with_buckets_and_hasher(n, DefaultHashBuilder::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V> Default for HashTable<K, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

// Accessors that never hash or compare keys.
impl<K, V, S> HashTable<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_buckets_and_hasher(DEFAULT_BUCKETS, hasher)
    }

    pub fn with_buckets_and_hasher(n: usize, hasher: S) -> Self {
        Self {
            hasher,
            storage: Storage::with_buckets(n),
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self> {
        config.validate()?;
        let mut table = Self::with_buckets_and_hasher(config.initial_buckets, hasher);
        table.max_load_factor = config.max_load_factor;
        Ok(table)
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.storage.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.slots.is_empty()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.storage.bucket_count()
    }

    /// Number of entries chained in bucket `i`.
    pub fn bucket_len(&self, i: usize) -> Result<usize> {
        self.storage
            .buckets
            .at(i)
            .map(|chain| chain.len())
    }

    pub fn load_factor(&self) -> f32 {
        self.len() as f32 / self.bucket_count() as f32
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Change the growth threshold; grows immediately if the current
    /// entries no longer fit under it.
    pub fn set_max_load_factor(&mut self, f: f32) -> Result<()> {
        check_load_factor(f)?;
        let _g = self.reentrancy.enter("set_max_load_factor");
        self.max_load_factor = f;
        let needed = min_buckets(self.len(), f);
        if needed > self.storage.bucket_count() {
            log::debug!(
                "hash table load factor lowered to {f}: {} -> {needed} buckets",
                self.storage.bucket_count()
            );
            self.storage.redistribute(needed);
        }
        Ok(())
    }

    /// Resize the bucket array to `max(n, len / max_load_factor)` buckets
    /// and redistribute every entry. Iteration order is unaffected.
    pub fn rehash(&mut self, n: usize) {
        let _g = self.reentrancy.enter("rehash");
        let target = n.max(min_buckets(self.len(), self.max_load_factor));
        let current = self.storage.bucket_count();
        if target != current {
            log::debug!(
                "hash table rehash: {current} -> {target} buckets ({} entries)",
                self.len()
            );
            self.storage.redistribute(target);
        }
    }

    /// Make room for `additional` more entries without further growth.
    pub fn reserve(&mut self, additional: usize) {
        let needed = min_buckets(self.len().saturating_add(additional), self.max_load_factor);
        if needed > self.bucket_count() {
            self.rehash(needed);
        }
    }

    /// Drop every entry; the bucket count is kept.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.storage.clear();
    }

    /// Remove an entry by handle. Stale handles yield `None`.
    pub fn remove(&mut self, handle: Handle) -> Option<(K, V)> {
        let _g = self.reentrancy.enter("remove");
        self.storage
            .unlink(handle.0)
            .map(|node| node.entry.into_tuple())
    }

    pub(crate) fn handle_key(&self, h: Handle) -> Option<&K> {
        let _g = self.reentrancy.enter("handle_key");
        self.storage.slots.get(h.0).map(|n| &n.entry.first)
    }

    pub(crate) fn handle_value(&self, h: Handle) -> Option<&V> {
        let _g = self.reentrancy.enter("handle_value");
        self.storage.slots.get(h.0).map(|n| &n.entry.second)
    }

    pub(crate) fn handle_value_mut(&mut self, h: Handle) -> Option<&mut V> {
        let _g = self.reentrancy.enter("handle_value_mut");
        self.storage.slots.get_mut(h.0).map(|n| &mut n.entry.second)
    }

    /// Entries newest first; iterate from the back for oldest first.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.storage.slots,
            front: self.storage.head,
            back: self.storage.tail,
            remaining: self.len(),
        }
    }

    /// Mutable counterpart of [`HashTable::iter`]. Collects one reference
    /// per entry up front, which costs an allocation proportional to `len`.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.storage.slots.len();
        let mut refs = SecondaryMap::with_capacity(remaining);
        for (k, node) in self.storage.slots.iter_mut() {
            refs.insert(k, node);
        }
        IterMut {
            refs,
            front: self.storage.head,
            back: self.storage.tail,
            remaining,
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut V> + ExactSizeIterator + '_ {
        self.iter_mut().map(|(_, v)| v)
    }

    /// Entries in bucket order: bucket 0 first, each chain oldest first.
    pub fn bucket_iter(&self) -> BucketIter<'_, K, V> {
        let buckets = &self.storage.buckets;
        let last = buckets.len() - 1;
        BucketIter {
            buckets,
            slots: &self.storage.slots,
            front: (0, 0),
            back: (last, buckets[last].len()),
            remaining: self.len(),
        }
    }

    /// Cursor on the newest entry, or on the ghost position if empty.
    pub fn cursor_front(&self) -> Cursor<'_, K, V, S> {
        Cursor {
            table: self,
            current: self.storage.head,
        }
    }

    /// Cursor on the oldest entry, or on the ghost position if empty.
    pub fn cursor_back(&self) -> Cursor<'_, K, V, S> {
        Cursor {
            table: self,
            current: self.storage.tail,
        }
    }

    /// Cursor on the ghost position, the `end()` of the order list.
    pub fn cursor_end(&self) -> Cursor<'_, K, V, S> {
        Cursor {
            table: self,
            current: None,
        }
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    #[inline]
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Bucket that `q` hashes to under the current bucket count.
    pub fn bucket<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.storage.bucket_of(self.make_hash(q))
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("find");
        let hash = self.make_hash(q);
        let bucket = self.storage.bucket_of(hash);
        self.storage
            .find_in_bucket(bucket, hash, q)
            .map(|(_, k)| Handle(k))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.count(q) == 1
    }

    /// Same as [`HashTable::contains_key`].
    pub fn exists<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.count(q) == 1
    }

    /// 0 or 1; keys are unique.
    pub fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.at(q) {
            Ok(_) => 1,
            Err(_) => 0,
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.at(q).ok()
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.at_mut(q).ok()
    }

    /// Checked lookup; [`ContainerError::KeyNotFound`] names the bucket searched.
    pub fn at<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("at");
        let hash = self.make_hash(q);
        let bucket = self.storage.bucket_of(hash);
        match self.storage.find_in_bucket(bucket, hash, q) {
            Some((_, k)) => Ok(&self.storage.slots[k].entry.second),
            None => Err(ContainerError::KeyNotFound { bucket }),
        }
    }

    pub fn at_mut<Q>(&mut self, q: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("at_mut");
        let hash = self.hasher.hash_one(q);
        let bucket = self.storage.bucket_of(hash);
        match self.storage.find_in_bucket(bucket, hash, q) {
            Some((_, k)) => Ok(&mut self.storage.slots[k].entry.second),
            None => Err(ContainerError::KeyNotFound { bucket }),
        }
    }

    /// Insert a new entry. Fails with [`ContainerError::DuplicateKey`] and
    /// leaves the table unchanged if `key` is already present.
    pub fn insert(&mut self, key: K, value: V) -> Result<Handle> {
        self.insert_with(key, || value)
    }

    /// Like [`HashTable::insert`], but `make` only runs when the key is new.
    pub fn insert_with<F>(&mut self, key: K, make: F) -> Result<Handle>
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter("insert");
        let hash = self.hasher.hash_one(&key);
        let bucket = self.storage.bucket_of(hash);
        if self.storage.find_in_bucket(bucket, hash, &key).is_some() {
            return Err(ContainerError::DuplicateKey);
        }
        let value = make();
        Ok(Handle(self.storage.link_grown(hash, key, value, self.max_load_factor)))
    }

    pub fn insert_pair(&mut self, pair: Pair<K, V>) -> Result<Handle> {
        let (key, value) = pair.into_tuple();
        self.insert(key, value)
    }

    /// Overwrite the value of a present key and return the old one, or
    /// insert a new entry. An overwrite keeps the entry's order position.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.reentrancy.enter("insert_or_assign");
        let hash = self.hasher.hash_one(&key);
        let bucket = self.storage.bucket_of(hash);
        if let Some((_, k)) = self.storage.find_in_bucket(bucket, hash, &key) {
            return Some(core::mem::replace(&mut self.storage.slots[k].entry.second, value));
        }
        self.storage.link_grown(hash, key, value, self.max_load_factor);
        None
    }

    /// Value for `key`, inserting `V::default()` first if it is missing.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter("get_or_insert");
        let hash = self.hasher.hash_one(&key);
        let bucket = self.storage.bucket_of(hash);
        let k = match self.storage.find_in_bucket(bucket, hash, &key) {
            Some((_, k)) => k,
            None => {
                let value = make();
                self.storage.link_grown(hash, key, value, self.max_load_factor)
            }
        };
        &mut self.storage.slots[k].entry.second
    }

    /// Remove `q` and return its value; absent keys are a no-op.
    pub fn erase<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("erase");
        let hash = self.hasher.hash_one(q);
        let bucket = self.storage.bucket_of(hash);
        let (_, k) = self.storage.find_in_bucket(bucket, hash, q)?;
        self.storage.unlink(k).map(|node| node.entry.into_tuple())
    }

    /// Cursor on `q`'s entry, or on the ghost position if absent.
    pub fn cursor<Q>(&self, q: &Q) -> Cursor<'_, K, V, S>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        Cursor {
            table: self,
            current: self.find(q).map(|h| h.0),
        }
    }

    /// Verify every structural invariant; panics on the first violation.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let st = &self.storage;
        assert!(st.bucket_count() >= 1);
        let mut chained = 0;
        for (b, chain) in st.buckets.iter().enumerate() {
            for &k in chain.iter() {
                let node = st.slots.get(k).expect("chain holds a live handle");
                assert_eq!(st.bucket_of(node.hash), b, "entry chained in the wrong bucket");
                chained += 1;
            }
        }
        assert_eq!(chained, self.len(), "chains and arena disagree");

        let mut walked = 0;
        let mut prev = None;
        let mut cur = st.head;
        while let Some(k) = cur {
            let node = st.slots.get(k).expect("order list holds a live handle");
            assert_eq!(node.prev, prev, "broken back link");
            prev = Some(k);
            cur = node.next;
            walked += 1;
            assert!(walked <= self.len(), "order list cycles");
        }
        assert_eq!(prev, st.tail, "tail is not the last node");
        assert_eq!(walked, self.len(), "order list and arena disagree");
        assert!(
            self.len() as f64 <= st.bucket_count() as f64 * self.max_load_factor as f64,
            "load factor exceeded"
        );
    }
}

impl<K, V, S> Clone for HashTable<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    /// Rebuilds chains and order list from scratch, oldest entry first, so
    /// the copy iterates exactly like the original.
    fn clone(&self) -> Self {
        let mut storage = Storage::with_buckets(self.storage.bucket_count());
        let mut cur = self.storage.tail;
        while let Some(k) = cur {
            let node = &self.storage.slots[k];
            let bucket = storage.bucket_of(node.hash);
            storage.link_new(
                bucket,
                node.hash,
                node.entry.first.clone(),
                node.entry.second.clone(),
            );
            cur = node.prev;
        }
        Self {
            hasher: self.hasher.clone(),
            storage,
            max_load_factor: self.max_load_factor,
            reentrancy: DebugReentrancy::new(),
        }
    }
}

impl<K, V, S> PartialEq for HashTable<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for HashTable<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for HashTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, Q, V, S> Index<&Q> for HashTable<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if the key is absent; use [`HashTable::at`] to handle that.
    fn index(&self, q: &Q) -> &V {
        match self.at(q) {
            Ok(v) => v,
            Err(e) => panic!("HashTable index: {e}"),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert_or_assign(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = HashTable::with_hasher(S::default());
        table.extend(iter);
        table
    }
}

/// Order-list iterator, newest first from the front.
pub struct Iter<'a, K, V> {
    slots: &'a SlotMap<DefaultKey, Node<K, V>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.slots[self.front?];
        self.front = node.next;
        self.remaining -= 1;
        Some((&node.entry.first, &node.entry.second))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.slots[self.back?];
        self.back = node.prev;
        self.remaining -= 1;
        Some((&node.entry.first, &node.entry.second))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Mutable order-list iterator.
pub struct IterMut<'a, K, V> {
    refs: SecondaryMap<DefaultKey, &'a mut Node<K, V>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.refs.remove(self.front?)?;
        self.front = node.next;
        self.remaining -= 1;
        Some((&node.entry.first, &mut node.entry.second))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.refs.remove(self.back?)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some((&node.entry.first, &mut node.entry.second))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator in order-list order.
pub struct IntoIter<K, V> {
    slots: SlotMap<DefaultKey, Node<K, V>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let node = self.slots.remove(self.front?)?;
        self.front = node.next;
        if self.slots.is_empty() {
            self.back = None;
        }
        Some(node.entry.into_tuple())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.slots.len(), Some(self.slots.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        let node = self.slots.remove(self.back?)?;
        self.back = node.prev;
        if self.slots.is_empty() {
            self.front = None;
        }
        Some(node.entry.into_tuple())
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for HashTable<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            front: self.storage.head,
            back: self.storage.tail,
            slots: self.storage.slots,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashTable<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

/// Bucket-major iterator: a `(bucket, slot)` position that skips empty
/// buckets. Cost per step is proportional to the run of empty buckets.
pub struct BucketIter<'a, K, V> {
    buckets: &'a Vector<Vector<DefaultKey>>,
    slots: &'a SlotMap<DefaultKey, Node<K, V>>,
    /// Next position to yield from the front.
    front: (usize, usize),
    /// One past the next position to yield from the back.
    back: (usize, usize),
    remaining: usize,
}

impl<'a, K, V> BucketIter<'a, K, V> {
    fn entry(&self, k: DefaultKey) -> (&'a K, &'a V) {
        let node = &self.slots[k];
        (&node.entry.first, &node.entry.second)
    }
}

impl<'a, K, V> Iterator for BucketIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        // `remaining > 0` guarantees an entry at or after `front`.
        loop {
            let (b, s) = self.front;
            let chain = &self.buckets[b];
            if s < chain.len() {
                self.front = (b, s + 1);
                self.remaining -= 1;
                return Some(self.entry(chain[s]));
            }
            self.front = (b + 1, 0);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for BucketIter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            let (b, s) = self.back;
            if s > 0 {
                self.back = (b, s - 1);
                self.remaining -= 1;
                return Some(self.entry(self.buckets[b][s - 1]));
            }
            self.back = (b - 1, self.buckets[b - 1].len());
        }
    }
}

impl<K, V> ExactSizeIterator for BucketIter<'_, K, V> {}
impl<K, V> FusedIterator for BucketIter<'_, K, V> {}

/// Bidirectional position in the order list.
///
/// Besides the entries there is one "ghost" position, the end. Moving next
/// from the oldest entry reaches the ghost and moving next from the ghost
/// wraps to the newest entry; moving prev from the ghost lands on the
/// oldest entry.
pub struct Cursor<'a, K, V, S> {
    table: &'a HashTable<K, V, S>,
    current: Option<DefaultKey>,
}

impl<K, V, S> Clone for Cursor<'_, K, V, S> {
    fn clone(&self) -> Self {
        Cursor {
            table: self.table,
            current: self.current,
        }
    }
}

impl<K, V, S> PartialEq for Cursor<'_, K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.table, other.table) && self.current == other.current
    }
}

impl<K, V, S> Eq for Cursor<'_, K, V, S> {}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for Cursor<'_, K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.current()).finish()
    }
}

impl<'a, K, V, S> Cursor<'a, K, V, S> {
    pub fn is_ghost(&self) -> bool {
        self.current.is_none()
    }

    pub fn handle(&self) -> Option<Handle> {
        self.current.map(Handle)
    }

    pub fn current(&self) -> Option<(&'a K, &'a V)> {
        let node = self.table.storage.slots.get(self.current?)?;
        Some((&node.entry.first, &node.entry.second))
    }

    pub fn key(&self) -> Option<&'a K> {
        self.current().map(|(k, _)| k)
    }

    pub fn value(&self) -> Option<&'a V> {
        self.current().map(|(_, v)| v)
    }

    /// Toward older entries.
    pub fn move_next(&mut self) {
        let st = &self.table.storage;
        self.current = match self.current {
            Some(k) => st.slots[k].next,
            None => st.head,
        };
    }

    /// Toward newer entries.
    pub fn move_prev(&mut self) {
        let st = &self.table.storage;
        self.current = match self.current {
            Some(k) => st.slots[k].prev,
            None => st.tail,
        };
    }

    pub fn seek_forward(&mut self, n: usize) {
        for _ in 0..n {
            self.move_next();
        }
    }

    pub fn seek_backward(&mut self, n: usize) {
        for _ in 0..n {
            self.move_prev();
        }
    }
}
