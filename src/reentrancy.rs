//! Debug-only reentrancy detection for `HashTable`.
//!
//! While a table probes a bucket chain or splices its order list it calls
//! into user `Hash`/`Eq` code with its links transiently inconsistent. A
//! `K: Eq` that reaches back into the same table at that point would observe
//! a half-updated structure. In debug builds the second entry panics and
//! names both operations; in release builds the guard is a zero-sized no-op.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table tracker. Public table methods open a section with
/// `let _g = self.reentrancy.enter("op");`.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Single-threaded like the table that embeds it.
    _single_thread: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _single_thread: PhantomData,
        }
    }

    /// Open a guarded section for `op`. Panics in debug builds if another
    /// section of the same table is still open.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> Section<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant HashTable access: `{op}` called while `{outer}` is running");
            }
            self.active.set(Some(op));
            Section { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            Section { _owner: PhantomData }
        }
    }

    #[cfg(all(test, debug_assertions))]
    pub(crate) fn is_active(&self) -> bool {
        self.active.get().is_some()
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII section returned by [`DebugReentrancy::enter`].
pub(crate) struct Section<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a ()>,
}

impl Drop for Section<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DebugReentrancy;

    #[test]
    fn sequential_sections_are_fine() {
        let r = DebugReentrancy::new();
        {
            let _g = r.enter("insert");
        }
        let _g = r.enter("erase");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn section_closes_on_drop() {
        let r = DebugReentrancy::new();
        let g = r.enter("find");
        assert!(r.is_active());
        drop(g);
        assert!(!r.is_active());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_section_panics_with_both_names() {
        let r = DebugReentrancy::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = r.enter("insert");
            let _inner = r.enter("find");
        }));
        let err = res.expect_err("nested entry must panic in debug builds");
        let msg = err
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(msg.contains("`find`") && msg.contains("`insert`"), "{msg}");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_section_is_a_noop_in_release() {
        let r = DebugReentrancy::new();
        let _a = r.enter("insert");
        let _b = r.enter("find");
    }
}
