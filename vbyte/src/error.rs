//! Top-level error type for the vbyte library.
//!
//! Only the checked (`try_*`) entry points return these errors. The
//! unchecked codec, select and search functions never validate their input.

/// Errors returned by the checked codec API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Attempted to decode from an empty input.
    #[error("empty input")]
    EmptyInput,

    /// The input ended inside a group (last byte had its continuation bit set).
    #[error("incomplete varint group")]
    IncompleteSequence,

    /// The final permitted byte of a group had its continuation bit set.
    #[error("continuation bit set on byte {0} of a varint group")]
    InvalidContinuation(usize),

    /// The decoded group carries more bits than the integer width.
    #[error("attempted to decode a value exceeding {0} bits")]
    ValueOutOfBounds(u32),

    /// A sorted sequence was not strictly increasing.
    #[error("values are not strictly increasing at index {index}")]
    NotStrictlyIncreasing {
        /// Index of the first value that is not greater than its predecessor.
        index: usize,
    },

    /// The output buffer cannot hold the compressed sequence.
    #[error("output buffer too small: required={required}, available={available}")]
    BufferTooSmall {
        /// Number of bytes the compressed sequence needs.
        required: usize,
        /// Number of bytes the caller provided.
        available: usize,
    },
}
