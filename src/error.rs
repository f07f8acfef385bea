//! Error types for fallible array operations.

use thiserror::Error;

/// Errors reported by the `try_*` family of operations and by checked access.
///
/// Every operation that returns one of these leaves the array exactly as it
/// was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArrayError {
    /// A size request above [`max_size`](crate::max_size) for the element type.
    #[error("capacity overflow: requested {requested} slots, max is {max}")]
    CapacityOverflow {
        /// Number of slots requested.
        requested: usize,
        /// Largest slot count representable for the element type.
        max: usize,
    },
    /// The global allocator returned null.
    #[error("allocation of {bytes} bytes (align {align}) failed")]
    AllocFailed {
        /// Size of the rejected layout in bytes.
        bytes: usize,
        /// Alignment of the rejected layout.
        align: usize,
    },
    /// Checked access past the last live element.
    #[error("index {index} out of range for length {len}")]
    OutOfRange {
        /// The rejected index.
        index: usize,
        /// Length at the time of the call.
        len: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T, E = ArrayError> = std::result::Result<T, E>;
