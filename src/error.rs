//! Fault types shared by every container in the crate.

use thiserror::Error;

/// Errors raised by checked container operations.
///
/// Positional access reports [`ContainerError::OutOfRange`], keyed access
/// reports [`ContainerError::KeyNotFound`]. Neither is fatal: callers are
/// expected to handle them where the lookup happens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContainerError {
    /// A position was not within `[0, len)` (or `[0, len]` for inserts).
    #[error("index {index} out of range for length {len}")]
    OutOfRange {
        /// The offending index
        index: usize,
        /// Length of the container at the time of access
        len: usize,
    },

    /// No entry with the requested key exists.
    #[error("key not found (searched bucket {bucket})")]
    KeyNotFound {
        /// Bucket that was scanned for the key
        bucket: usize,
    },

    /// `insert` was called with a key that is already present.
    #[error("duplicate key")]
    DuplicateKey,

    /// A max load factor that is not finite or is below
    /// `hash_table::MIN_MAX_LOAD_FACTOR`.
    #[error("invalid max load factor: {0}")]
    InvalidLoadFactor(f32),
}

impl ContainerError {
    #[inline]
    pub(crate) fn out_of_range(index: usize, len: usize) -> Self {
        ContainerError::OutOfRange { index, len }
    }

    /// The offending index for positional faults.
    pub fn index(&self) -> Option<usize> {
        match self {
            ContainerError::OutOfRange { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, ContainerError>;
