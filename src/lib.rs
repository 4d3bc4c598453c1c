//! arena-containers: a growable vector with a fixed growth policy, a
//! chained hash table that remembers insertion order, and a doubly linked
//! list, all single-threaded.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: containers whose growth, ordering and failure behavior is fixed
//!   and observable, rather than left to the allocator or the std defaults.
//! - Layers:
//!   - Vector<T>: contiguous buffer. Capacity is always a power of two and
//!     at least 64, plus one guard slot that is allocated but never
//!     initialized. Storage is the only unsafe code in the crate.
//!   - HashTable<K, V, S>: entries in a `SlotMap` arena, buckets as a
//!     `Vector<Vector<handle>>`, and a doubly linked order list threaded
//!     through the entries. Returns stable `Handle`s; includes a debug-only
//!     reentrancy guard while its links are being spliced.
//!   - List<T>: doubly linked list over the same arena idiom.
//!   - Pair<A, B>: the stored entry type of the table.
//!
//! Constraints
//! - Single-threaded: `HashTable` is `!Send`/`!Sync` through its guard.
//! - No per-entry heap allocation beyond the arena and bucket chains.
//! - Unique keys: `insert` fails with `DuplicateKey`; `insert_or_assign`
//!   overwrites.
//! - Checked accessors (`at`, `erase` by position, `bucket_len`) return
//!   [`ContainerError`] instead of panicking; `Index` panics.
//!
//! Ordering
//! - `HashTable::iter` yields newest first; the order list is spliced on
//!   insert and erase only, so rehashing and growth never reorder it.
//! - `HashTable::bucket_iter` yields bucket by bucket, each chain oldest
//!   first.
//! - Cursors over the table and the list have one extra "ghost" position
//!   past the last element, matching an `end()` sentinel.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its `u64` hash; redistribution always uses the
//!   stored hash and never invokes `K: Hash` after insertion.
//! - The table doubles its bucket count before an insert would push
//!   `len / bucket_count` above `max_load_factor`.
//!
//! Logging
//! - Buffer reallocation logs at `trace`, bucket redistribution at
//!   `debug`, through the `log` facade.

pub mod error;
pub mod hash_table;
mod hash_table_proptest;
pub mod list;
pub mod pair;
mod reentrancy;
pub mod vector;

// Public surface
pub use error::{ContainerError, Result};
pub use hash_table::{Cursor, Handle, HashTable, TableConfig};
pub use list::List;
pub use pair::Pair;
pub use vector::Vector;
