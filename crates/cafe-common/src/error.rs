//! Error types for cafe-common.

use thiserror::Error;

/// Common error type for Cafe cursor operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A read, write or seek reached past the end of the buffer.
    #[error("out of bounds at {offset:#x}: needed {needed} bytes but only {available} available")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Invalid magic bytes encountered.
    #[error("invalid magic at {offset:#x}: expected {expected:?}, got {actual:?}")]
    InvalidMagic {
        offset: usize,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    /// Integer width outside of 1..=8 bytes.
    #[error("unsupported integer width: {0} bytes")]
    InvalidUintWidth(usize),

    /// String does not fit in its fixed-size field.
    #[error("string of {len} bytes does not fit in a {capacity} byte field")]
    StringTooLong { len: usize, capacity: usize },

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Missing null terminator in string.
    #[error("string at {0:#x} missing null terminator")]
    MissingNullTerminator(usize),
}

impl Error {
    /// Whether this error was caused by running off the end of a buffer.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Error::OutOfBounds { .. })
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
