// Vector integration suite.
//
// Invariants exercised:
// - Growth: capacity is 0 or a power of two >= 64, and `len <= capacity`.
// - Ownership: clones copy exactly the live elements; moves never touch them.
// - Faults: checked access and positional edits report OutOfRange with the
//   offending index.
use arena_containers::vector::{policy_capacity, MIN_CAPACITY};
use arena_containers::{vector, ContainerError, Vector};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug)]
struct Counted {
    id: u32,
    drops: Rc<Cell<usize>>,
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

// Test: growth policy.
// Verifies: 64 floor, doubling past it, and `reserve` rounding up.
#[test]
fn capacity_follows_power_of_two_policy() {
    let mut v = Vector::new();
    assert_eq!(v.capacity(), 0);
    v.push_back(1u8);
    assert_eq!(v.capacity(), MIN_CAPACITY);
    for i in 0..64u8 {
        v.push_back(i);
    }
    assert_eq!(v.len(), 65);
    assert_eq!(v.capacity(), 128);

    let mut w: Vector<u64> = Vector::new();
    w.reserve(300);
    assert_eq!(w.capacity(), 512);
    w.reserve(10);
    assert_eq!(w.capacity(), 512);
    assert_eq!(policy_capacity(0), 64);
    assert_eq!(policy_capacity(65), 128);
}

// Test: out of range access.
// Verifies: `at(5)` on three elements reports index 5 and length 3.
#[test]
fn at_out_of_range_reports_index() {
    let v = vector![10, 20, 30];
    assert_eq!(v.at(1), Ok(&20));
    let err = v.at(5).unwrap_err();
    assert_eq!(err, ContainerError::OutOfRange { index: 5, len: 3 });
    assert_eq!(err.index(), Some(5));
    assert_eq!(err.to_string(), "index 5 out of range for length 3");
}

// Test: positional edits.
// Verifies: insert at the end is allowed, past it is a fault; erase and
// erase_range shift the tail down.
#[test]
fn insert_erase_positions() {
    let mut v: Vector<i32> = (0..5).collect();
    v.insert(5, 5).unwrap();
    v.insert(0, -1).unwrap();
    assert_eq!(v, [-1, 0, 1, 2, 3, 4, 5]);
    assert_eq!(v.insert(9, 0), Err(ContainerError::OutOfRange { index: 9, len: 7 }));

    v.erase(0).unwrap();
    assert_eq!(v.remove(2), Ok(2));
    assert_eq!(v, [0, 1, 3, 4, 5]);
    assert_eq!(v.erase_range(1, 3), 2);
    assert_eq!(v, [0, 4, 5]);
    assert_eq!(v.erase_range(2, 100), 1);
    assert_eq!(v.erase_range(5, 6), 0);
    assert_eq!(v, [0, 4]);
    assert!(v.erase(2).is_err());
}

// Test: every element is dropped exactly once across erase, truncate,
// pop and the final drop.
#[test]
fn drops_exactly_once() {
    let drops = Rc::new(Cell::new(0));
    let mut v = Vector::new();
    for id in 0..100 {
        v.push_back(Counted {
            id,
            drops: drops.clone(),
        });
    }
    v.erase_range(10, 20);
    assert_eq!(drops.get(), 10);
    assert_eq!(v[10].id, 20);
    v.truncate(50);
    assert_eq!(drops.get(), 50);
    drop(v.pop_back());
    assert_eq!(drops.get(), 51);
    drop(v);
    assert_eq!(drops.get(), 100);
}

// Test: move steals the buffer, clone copies the live elements.
#[test]
fn move_keeps_addresses_clone_does_not() {
    let mut v: Vector<String> = Vector::with_capacity(4);
    v.push_back("a".into());
    v.push_back("b".into());
    let addr = v.as_ptr();
    let moved = v;
    assert_eq!(moved.as_ptr(), addr);

    let copy = moved.clone();
    assert_ne!(copy.as_ptr(), addr);
    assert_eq!(copy, moved);
    assert_eq!(copy.len(), 2);
}

// Test: vector of vectors; inner buffers stay put when the outer grows.
#[test]
fn nested_vectors_keep_inner_buffers_on_growth() {
    let mut outer: Vector<Vector<u32>> = Vector::new();
    outer.push_back(vector![1, 2, 3]);
    let inner = outer[0].as_ptr();
    for i in 0..200 {
        outer.push_back(vector![i]);
    }
    assert!(outer.capacity() >= 201);
    assert_eq!(outer[0].as_ptr(), inner);
    assert_eq!(outer[0], [1, 2, 3]);
}

// Test: resize and shrink.
#[test]
fn resize_and_shrink_to_fit() {
    let mut v: Vector<u16> = Vector::new();
    v.resize(300);
    assert_eq!(v.len(), 300);
    assert_eq!(v.capacity(), 512);
    v.resize_with_value(310, 7);
    assert_eq!(v[309], 7);
    v.truncate(3);
    v.shrink_to_fit();
    assert_eq!(v.capacity(), MIN_CAPACITY);
    v.clear();
    v.shrink_to_fit();
    assert_eq!(v.capacity(), 0);
    assert!(v.is_empty());
}

// Test: search, sort and append.
#[test]
fn find_sort_append() {
    let mut v = vector![5, 3, 9, 1];
    assert_eq!(v.find(&9), Some(&9));
    assert_eq!(v.find_id(&3), Some(1));
    assert_eq!(v.find_id(&4), None);
    v.sort();
    assert_eq!(v, [1, 3, 5, 9]);
    v.sort_by(|a, b| b.cmp(a));
    assert_eq!(v, [9, 5, 3, 1]);
    let tail = vector![0, 0];
    v.append(&tail);
    assert_eq!(v, vec![9, 5, 3, 1, 0, 0]);
    assert_eq!(tail.len(), 2);
    assert_eq!(v.front(), Some(&9));
    assert_eq!(v.back(), Some(&0));
}

// Test: iteration, including a partially consumed owning iterator.
#[test]
fn owning_iterator_drops_remainder() {
    let drops = Rc::new(Cell::new(0));
    let v: Vector<Counted> = (0..6)
        .map(|id| Counted {
            id,
            drops: drops.clone(),
        })
        .collect();
    let mut it = v.into_iter();
    assert_eq!(it.len(), 6);
    assert_eq!(it.next().map(|c| c.id), Some(0));
    assert_eq!(it.next_back().map(|c| c.id), Some(5));
    assert_eq!(drops.get(), 2);
    drop(it);
    assert_eq!(drops.get(), 6);
}

#[test]
#[should_panic]
fn index_past_len_panics() {
    let v = vector![1];
    let _ = v[1];
}
