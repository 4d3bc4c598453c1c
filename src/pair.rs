//! Pair: two independently typed public fields.
//!
//! Equality, ordering and hashing are field-wise over `(first, second)`.
//! `HashTable` stores each entry as a `Pair<K, V>`.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pair<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> Pair<A, B> {
    #[inline]
    pub const fn new(first: A, second: B) -> Self {
        Pair { first, second }
    }

    #[inline]
    pub fn into_tuple(self) -> (A, B) {
        (self.first, self.second)
    }

    #[inline]
    pub fn as_ref(&self) -> Pair<&A, &B> {
        Pair::new(&self.first, &self.second)
    }
}

impl<A, B> From<(A, B)> for Pair<A, B> {
    fn from((first, second): (A, B)) -> Self {
        Pair { first, second }
    }
}

impl<A, B> From<Pair<A, B>> for (A, B) {
    fn from(p: Pair<A, B>) -> Self {
        p.into_tuple()
    }
}
