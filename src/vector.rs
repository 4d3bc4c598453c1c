//! Vector: exclusive owner of a manually managed, power-of-two buffer.
//!
//! Storage layout
//! - `[0, len)` holds initialized elements, `[len, cap)` is raw memory.
//! - Every block is allocated with one extra guard slot that is never
//!   initialized; `capacity()` reports the usable slot count only.
//! - Once allocated, `cap` is a power of two and never below
//!   [`MIN_CAPACITY`]. Nothing is allocated until the first growth.
//!
//! Growth relocates elements with a bitwise move into the new block and
//! frees the old block without dropping anything in it; ownership of each
//! element travels with its bits. Moving a `Vector` itself only moves the
//! pointer, so element addresses survive an outer move but not a growth.

use crate::error::{ContainerError, Result};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::mem;
use core::ops::{Deref, DerefMut, Index, IndexMut};
use core::ptr::{self, NonNull};
use core::slice;
use std::alloc::{self, Layout};

/// Smallest capacity ever allocated.
pub const MIN_CAPACITY: usize = 64;

pub struct Vector<T> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    _owns: PhantomData<T>,
}

// Safety: Vector<T> owns its elements exactly like Vec<T>.
unsafe impl<T: Send> Send for Vector<T> {}
unsafe impl<T: Sync> Sync for Vector<T> {}

#[cold]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

/// Capacity chosen by the growth policy for `n` live slots.
#[inline]
pub fn policy_capacity(n: usize) -> usize {
    n.max(MIN_CAPACITY)
        .checked_next_power_of_two()
        .unwrap_or_else(|| capacity_overflow())
}

impl<T> Vector<T> {
    /// Sentinel for callers that want a numeric "not found" from
    /// [`Vector::find_id`].
    pub const NPOS: usize = usize::MAX;

    const IS_ZST: bool = mem::size_of::<T>() == 0;

    /// Empty vector; does not allocate.
    #[inline]
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            cap: 0,
            _owns: PhantomData,
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        let mut v = Self::new();
        v.reserve(n);
        v
    }

    /// A vector of `n` clones of `elem`.
    pub fn from_elem(elem: T, n: usize) -> Self
    where
        T: Clone,
    {
        let mut v = Self::new();
        v.resize_with_value(n, elem);
        v
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` is initialized; a dangling pointer is fine for len 0.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and `&mut self` guarantees exclusivity.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn layout_for(cap: usize) -> Layout {
        match cap.checked_add(1).map(Layout::array::<T>) {
            Some(Ok(layout)) => layout,
            _ => capacity_overflow(),
        }
    }

    /// Move the live elements into a fresh block of `new_cap` slots.
    fn reallocate(&mut self, new_cap: usize) {
        debug_assert!(new_cap >= self.len);
        log::trace!("vector realloc: {} -> {} slots ({} live)", self.cap, new_cap, self.len);
        if Self::IS_ZST {
            self.cap = new_cap;
            return;
        }
        let layout = Self::layout_for(new_cap);
        // SAFETY: layout is non-zero sized: T is not a ZST and it spans at least one slot.
        let raw = unsafe { alloc::alloc(layout) } as *mut T;
        let new_ptr = match NonNull::new(raw) {
            Some(p) => p,
            None => alloc::handle_alloc_error(layout),
        };
        if self.cap > 0 {
            // SAFETY: the blocks are distinct, both hold at least `len` slots,
            // and the old block was allocated with `layout_for(self.cap)`.
            // The old slots are freed without dropping: their values now live
            // in the new block.
            unsafe {
                ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len);
                alloc::dealloc(self.ptr.as_ptr() as *mut u8, Self::layout_for(self.cap));
            }
        }
        self.ptr = new_ptr;
        self.cap = new_cap;
    }

    /// Free the block. Live elements must already be gone.
    fn release(&mut self) {
        debug_assert_eq!(self.len, 0);
        if self.cap > 0 && !Self::IS_ZST {
            // SAFETY: allocated with exactly this layout in `reallocate`.
            unsafe { alloc::dealloc(self.ptr.as_ptr() as *mut u8, Self::layout_for(self.cap)) };
        }
        self.ptr = NonNull::dangling();
        self.cap = 0;
    }

    /// Ensure room for `n` elements in total (not `n` more). Never shrinks.
    pub fn reserve(&mut self, n: usize) {
        if n > self.cap {
            self.reallocate(policy_capacity(n));
        }
    }

    #[inline]
    fn grow_for_one(&mut self) {
        let needed = self
            .len
            .checked_add(1)
            .unwrap_or_else(|| capacity_overflow());
        self.reserve(needed);
    }

    /// Release unused capacity down to the policy capacity for `len`.
    /// An empty vector gives its buffer back entirely.
    pub fn shrink_to_fit(&mut self) {
        if self.len == 0 {
            self.release();
            return;
        }
        let target = policy_capacity(self.len);
        if target < self.cap {
            self.reallocate(target);
        }
    }

    pub fn push_back(&mut self, value: T) {
        self.grow_for_one();
        // SAFETY: `len < cap` after growing; the slot is uninitialized.
        unsafe { ptr::write(self.ptr.as_ptr().add(self.len), value) };
        self.len += 1;
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        self.push_back(value)
    }

    /// Construct the new element after any growth has happened.
    pub fn emplace_back<F>(&mut self, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        self.grow_for_one();
        let idx = self.len;
        // SAFETY: slot `idx` is within capacity and uninitialized.
        unsafe { ptr::write(self.ptr.as_ptr().add(idx), make()) };
        self.len += 1;
        &mut self.as_mut_slice()[idx]
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot `len` was initialized and is now outside the live range.
        Some(unsafe { ptr::read(self.ptr.as_ptr().add(self.len)) })
    }

    /// Insert at `pos`, shifting `[pos, len)` one slot right.
    pub fn insert(&mut self, pos: usize, value: T) -> Result<()> {
        if pos > self.len {
            return Err(ContainerError::out_of_range(pos, self.len));
        }
        self.grow_for_one();
        // SAFETY: capacity holds len + 1; `ptr::copy` handles the overlap.
        unsafe {
            let p = self.ptr.as_ptr().add(pos);
            ptr::copy(p, p.add(1), self.len - pos);
            ptr::write(p, value);
        }
        self.len += 1;
        Ok(())
    }

    /// Take the element at `pos` out, shifting the tail left.
    pub fn remove(&mut self, pos: usize) -> Result<T> {
        if pos >= self.len {
            return Err(ContainerError::out_of_range(pos, self.len));
        }
        // SAFETY: `pos < len`; the tail move overlaps and uses `ptr::copy`.
        unsafe {
            let p = self.ptr.as_ptr().add(pos);
            let value = ptr::read(p);
            ptr::copy(p.add(1), p, self.len - pos - 1);
            self.len -= 1;
            Ok(value)
        }
    }

    /// Drop the element at `pos`, shifting the tail left.
    pub fn erase(&mut self, pos: usize) -> Result<()> {
        self.remove(pos).map(drop)
    }

    /// Drop `[first, last)`. `last` is clamped to `len`; an empty or
    /// inverted range does nothing. Returns the number of elements dropped.
    pub fn erase_range(&mut self, first: usize, last: usize) -> usize {
        let last = last.min(self.len);
        if first >= last {
            return 0;
        }
        let tail = self.len - last;
        // If a destructor panics the tail is leaked, never dropped twice.
        self.len = first;
        // SAFETY: `[first, last)` and the tail are initialized and in bounds.
        unsafe {
            let base = self.ptr.as_ptr();
            ptr::drop_in_place(slice::from_raw_parts_mut(base.add(first), last - first));
            ptr::copy(base.add(last), base.add(first), tail);
        }
        self.len = first + tail;
        last - first
    }

    /// Drop everything past `n`.
    pub fn truncate(&mut self, n: usize) {
        if n >= self.len {
            return;
        }
        let old = self.len;
        self.len = n;
        // SAFETY: `[n, old)` was initialized and is now outside the live range.
        unsafe {
            ptr::drop_in_place(slice::from_raw_parts_mut(self.ptr.as_ptr().add(n), old - n));
        }
    }

    /// Drop every element; the buffer is kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    pub fn resize_with<F>(&mut self, n: usize, mut make: F)
    where
        F: FnMut() -> T,
    {
        if n <= self.len {
            self.truncate(n);
            return;
        }
        self.reserve(n);
        while self.len < n {
            // SAFETY: `len < n <= cap`.
            unsafe { ptr::write(self.ptr.as_ptr().add(self.len), make()) };
            self.len += 1;
        }
    }

    pub fn resize(&mut self, n: usize)
    where
        T: Default,
    {
        self.resize_with(n, T::default)
    }

    pub fn resize_with_value(&mut self, n: usize, value: T)
    where
        T: Clone,
    {
        self.resize_with(n, || value.clone())
    }

    /// Bounds-checked access.
    pub fn at(&self, i: usize) -> Result<&T> {
        let len = self.len;
        self.as_slice()
            .get(i)
            .ok_or(ContainerError::out_of_range(i, len))
    }

    pub fn at_mut(&mut self, i: usize) -> Result<&mut T> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(i)
            .ok_or(ContainerError::out_of_range(i, len))
    }

    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// First element equal to `x`.
    pub fn find(&self, x: &T) -> Option<&T>
    where
        T: PartialEq,
    {
        self.as_slice().iter().find(|e| *e == x)
    }

    /// Position of the first element equal to `x`.
    pub fn find_id(&self, x: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.as_slice().iter().position(|e| e == x)
    }

    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.as_mut_slice().sort_unstable()
    }

    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.as_mut_slice().sort_unstable_by(compare)
    }

    /// Clone every element of `other` onto the end.
    pub fn append(&mut self, other: &Vector<T>)
    where
        T: Clone,
    {
        let total = self
            .len
            .checked_add(other.len)
            .unwrap_or_else(|| capacity_overflow());
        self.reserve(total);
        for item in other.iter() {
            self.push_back(item.clone());
        }
    }
}

impl<T> Drop for Vector<T> {
    fn drop(&mut self) {
        self.clear();
        self.release();
    }
}

impl<T> Default for Vector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Vector<T> {
    fn clone(&self) -> Self {
        let mut out = Vector::new();
        out.reserve(self.len);
        for item in self.iter() {
            out.push_back(item.clone());
        }
        out
    }
}

impl<T> Deref for Vector<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for Vector<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for Vector<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> Index<usize> for Vector<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.as_slice()[i]
    }
}

impl<T> IndexMut<usize> for Vector<T> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.as_mut_slice()[i]
    }
}

impl<T: fmt::Debug> fmt::Debug for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Vector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for Vector<T> {}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for Vector<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for Vector<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialOrd> PartialOrd for Vector<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Ord> Ord for Vector<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Hash> Hash for Vector<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<T> Extend<T> for Vector<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(self.len.saturating_add(lower));
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<T> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut v = Vector::new();
        v.extend(iter);
        v
    }
}

impl<T, const N: usize> From<[T; N]> for Vector<T> {
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

impl<T> From<Vec<T>> for Vector<T> {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Clone> From<&[T]> for Vector<T> {
    fn from(items: &[T]) -> Self {
        items.iter().cloned().collect()
    }
}

/// Owning iterator; elements not yielded are dropped with the iterator.
pub struct IntoIter<T> {
    // `buf.len` is zero: the live range is tracked by `front..back` instead.
    buf: Vector<T>,
    front: usize,
    back: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        // SAFETY: `front < back` is an initialized slot not yet yielded.
        let item = unsafe { ptr::read(self.buf.as_ptr().add(self.front)) };
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: as in `next`.
        Some(unsafe { ptr::read(self.buf.as_ptr().add(self.back)) })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let remaining = self.back - self.front;
        // SAFETY: `[front, back)` is still initialized; `buf` frees the block after.
        unsafe {
            ptr::drop_in_place(slice::from_raw_parts_mut(
                self.buf.as_mut_ptr().add(self.front),
                remaining,
            ));
        }
    }
}

impl<T> IntoIterator for Vector<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> IntoIter<T> {
        let back = self.len;
        self.len = 0;
        IntoIter {
            buf: self,
            front: 0,
            back,
        }
    }
}

impl<'a, T> IntoIterator for &'a Vector<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Vector<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

/// Build a [`Vector`] from a literal sequence, like `vec!`.
#[macro_export]
macro_rules! vector {
    () => {
        $crate::vector::Vector::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::vector::Vector::from_elem($elem, $n)
    };
    ($($x:expr),+ $(,)?) => {
        $crate::vector::Vector::from([$($x),+])
    };
}
