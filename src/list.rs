//! List: doubly linked sequence whose nodes live in a `SlotMap` arena.
//!
//! Links are generational handles rather than pointers, so the list needs no
//! unsafe code and a stale link can never alias a newer node. Push and pop
//! at either end are O(1); positional access walks from the nearer end.
//!
//! Cursors add one "ghost" position past the last node. Moving next from
//! the back reaches the ghost, moving prev from the ghost lands on the back,
//! and inserting before the ghost appends.

use crate::error::{ContainerError, Result};
use core::fmt;
use core::iter::FusedIterator;
use core::ops::{Index, IndexMut};
use slotmap::{DefaultKey, SecondaryMap, SlotMap};

struct Node<T> {
    value: T,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

pub struct List<T> {
    slots: SlotMap<DefaultKey, Node<T>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<T> List<T> {
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn link_between(&mut self, value: T, prev: Option<DefaultKey>, next: Option<DefaultKey>) -> DefaultKey {
        let k = self.slots.insert(Node { value, prev, next });
        match prev {
            Some(p) => self.slots[p].next = Some(k),
            None => self.head = Some(k),
        }
        match next {
            Some(n) => self.slots[n].prev = Some(k),
            None => self.tail = Some(k),
        }
        k
    }

    fn link_before(&mut self, value: T, at: Option<DefaultKey>) -> DefaultKey {
        match at {
            Some(n) => {
                let prev = self.slots[n].prev;
                self.link_between(value, prev, Some(n))
            }
            None => self.link_between(value, self.tail, None),
        }
    }

    fn unlink(&mut self, k: DefaultKey) -> Option<Node<T>> {
        let node = self.slots.remove(k)?;
        match node.prev {
            Some(p) => self.slots[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.slots[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node)
    }

    /// Handle of the node at `pos`, walking from whichever end is closer.
    fn node_at(&self, pos: usize) -> Option<DefaultKey> {
        let len = self.len();
        if pos >= len {
            return None;
        }
        if pos <= len / 2 {
            let mut cur = self.head;
            for _ in 0..pos {
                cur = self.slots[cur?].next;
            }
            cur
        } else {
            let mut cur = self.tail;
            for _ in 0..(len - 1 - pos) {
                cur = self.slots[cur?].prev;
            }
            cur
        }
    }

    pub fn push_back(&mut self, value: T) {
        self.link_between(value, self.tail, None);
    }

    pub fn push_front(&mut self, value: T) {
        self.link_between(value, None, self.head);
    }

    pub fn emplace_back<F>(&mut self, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        let k = self.link_between(make(), self.tail, None);
        &mut self.slots[k].value
    }

    pub fn emplace_front<F>(&mut self, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        let k = self.link_between(make(), None, self.head);
        &mut self.slots[k].value
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let k = self.tail?;
        self.unlink(k).map(|n| n.value)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let k = self.head?;
        self.unlink(k).map(|n| n.value)
    }

    pub fn front(&self) -> Option<&T> {
        self.head.map(|k| &self.slots[k].value)
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        let k = self.head?;
        Some(&mut self.slots[k].value)
    }

    pub fn back(&self) -> Option<&T> {
        self.tail.map(|k| &self.slots[k].value)
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        let k = self.tail?;
        Some(&mut self.slots[k].value)
    }

    pub fn at(&self, pos: usize) -> Result<&T> {
        match self.node_at(pos) {
            Some(k) => Ok(&self.slots[k].value),
            None => Err(ContainerError::out_of_range(pos, self.len())),
        }
    }

    pub fn at_mut(&mut self, pos: usize) -> Result<&mut T> {
        match self.node_at(pos) {
            Some(k) => Ok(&mut self.slots[k].value),
            None => Err(ContainerError::out_of_range(pos, self.len())),
        }
    }

    /// Insert so that the new value ends up at `pos`; `pos == len` appends.
    pub fn insert(&mut self, pos: usize, value: T) -> Result<()> {
        let len = self.len();
        if pos > len {
            return Err(ContainerError::out_of_range(pos, len));
        }
        let at = self.node_at(pos);
        self.link_before(value, at);
        Ok(())
    }

    pub fn erase(&mut self, pos: usize) -> Result<T> {
        let len = self.len();
        let k = self
            .node_at(pos)
            .ok_or(ContainerError::out_of_range(pos, len))?;
        self.unlink(k)
            .map(|n| n.value)
            .ok_or(ContainerError::out_of_range(pos, len))
    }

    /// Remove `[first, last)`, with `last` clamped to `len`. Returns the
    /// number of values removed.
    pub fn erase_range(&mut self, first: usize, last: usize) -> usize {
        let last = last.min(self.len());
        if first >= last {
            return 0;
        }
        let mut cur = self.node_at(first);
        for _ in first..last {
            let Some(k) = cur else { break };
            cur = self.slots[k].next;
            self.unlink(k);
        }
        last - first
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn contains(&self, x: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|v| v == x)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: &self.slots,
            front: self.head,
            back: self.tail,
            remaining: self.len(),
        }
    }

    /// Collects one reference per node before yielding.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let remaining = self.slots.len();
        let mut refs = SecondaryMap::with_capacity(remaining);
        for (k, node) in self.slots.iter_mut() {
            refs.insert(k, node);
        }
        IterMut {
            refs,
            front: self.head,
            back: self.tail,
            remaining,
        }
    }

    pub fn cursor_front(&self) -> Cursor<'_, T> {
        Cursor {
            list: self,
            current: self.head,
        }
    }

    pub fn cursor_back(&self) -> Cursor<'_, T> {
        Cursor {
            list: self,
            current: self.tail,
        }
    }

    /// Cursor on the ghost position.
    pub fn cursor_end(&self) -> Cursor<'_, T> {
        Cursor {
            list: self,
            current: None,
        }
    }

    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut {
            current: self.head,
            list: self,
        }
    }

    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut {
            current: self.tail,
            list: self,
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for List<T> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for List<T> {}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Index<usize> for List<T> {
    type Output = T;

    fn index(&self, pos: usize) -> &T {
        match self.at(pos) {
            Ok(v) => v,
            Err(e) => panic!("List index: {e}"),
        }
    }
}

impl<T> IndexMut<usize> for List<T> {
    fn index_mut(&mut self, pos: usize) -> &mut T {
        match self.at_mut(pos) {
            Ok(v) => v,
            Err(e) => panic!("List index: {e}"),
        }
    }
}

impl<T> Extend<T> for List<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.push_back(v);
        }
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = List::new();
        list.extend(iter);
        list
    }
}

impl<T, const N: usize> From<[T; N]> for List<T> {
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

pub struct Iter<'a, T> {
    slots: &'a SlotMap<DefaultKey, Node<T>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.slots[self.front?];
        self.front = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.slots[self.back?];
        self.back = node.prev;
        self.remaining -= 1;
        Some(&node.value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

pub struct IterMut<'a, T> {
    refs: SecondaryMap<DefaultKey, &'a mut Node<T>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.refs.remove(self.front?)?;
        self.front = node.next;
        self.remaining -= 1;
        Some(&mut node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.refs.remove(self.back?)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some(&mut node.value)
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

pub struct IntoIter<T> {
    list: List<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter { list: self }
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut List<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

/// Read-only position in a [`List`], possibly the ghost past the back.
pub struct Cursor<'a, T> {
    list: &'a List<T>,
    current: Option<DefaultKey>,
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        Cursor {
            list: self.list,
            current: self.current,
        }
    }
}

impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.list, other.list) && self.current == other.current
    }
}

impl<T> Eq for Cursor<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.current()).finish()
    }
}

impl<'a, T> Cursor<'a, T> {
    pub fn is_ghost(&self) -> bool {
        self.current.is_none()
    }

    pub fn current(&self) -> Option<&'a T> {
        self.list.slots.get(self.current?).map(|n| &n.value)
    }

    pub fn move_next(&mut self) {
        self.current = match self.current {
            Some(k) => self.list.slots[k].next,
            None => self.list.head,
        };
    }

    pub fn move_prev(&mut self) {
        self.current = match self.current {
            Some(k) => self.list.slots[k].prev,
            None => self.list.tail,
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

/// Position in a [`List`] that can edit around itself.
pub struct CursorMut<'a, T> {
    list: &'a mut List<T>,
    current: Option<DefaultKey>,
}

impl<T> CursorMut<'_, T> {
    pub fn is_ghost(&self) -> bool {
        self.current.is_none()
    }

    pub fn current(&mut self) -> Option<&mut T> {
        let k = self.current?;
        self.list.slots.get_mut(k).map(|n| &mut n.value)
    }

    pub fn move_next(&mut self) {
        self.current = match self.current {
            Some(k) => self.list.slots[k].next,
            None => self.list.head,
        };
    }

    pub fn move_prev(&mut self) {
        self.current = match self.current {
            Some(k) => self.list.slots[k].prev,
            None => self.list.tail,
        };
    }

    /// Insert before the current position; on the ghost this appends.
    pub fn insert_before(&mut self, value: T) {
        self.list.link_before(value, self.current);
    }

    /// Remove the current value and move to its successor. `None` on the ghost.
    pub fn remove_current(&mut self) -> Option<T> {
        let k = self.current?;
        let node = self.list.unlink(k)?;
        self.current = node.next;
        Some(node.value)
    }
}
