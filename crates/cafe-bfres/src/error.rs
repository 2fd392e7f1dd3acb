//! Error types for BFRES parsing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when parsing or editing BFRES archives.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error, including out of bounds reads.
    #[error("{0}")]
    Common(#[from] cafe_common::Error),

    /// GX2 surface description error.
    #[error("{0}")]
    Gx2(#[from] cafe_gx2::Error),

    /// A block did not start with its expected magic.
    #[error("bad magic at {offset:#x}: expected {:?}, got {:?}", String::from_utf8_lossy(.expected), String::from_utf8_lossy(.actual))]
    BadMagic {
        offset: usize,
        expected: [u8; 4],
        actual: [u8; 4],
    },

    /// The byte-order mark is neither `FE FF` nor `FF FE`.
    #[error("invalid byte-order mark {0:02X?}")]
    InvalidByteOrderMark([u8; 2]),

    /// An offset field points past the end of the buffer.
    #[error("{field} points to {offset:#x}, past the end of the {len:#x} byte buffer")]
    OffsetOutOfBounds {
        field: String,
        offset: i64,
        len: usize,
    },

    /// Two dictionary entries share a key.
    #[error("duplicate dictionary key {0:?}")]
    DuplicateKey(String),

    /// A dictionary child link refers to a node that does not exist.
    #[error("dictionary node index {index} out of bounds (total nodes: {count})")]
    NodeIndexOutOfBounds { index: u16, count: usize },

    /// No resource with this name.
    #[error("no resource named {0:?}")]
    NotFound(String),

    /// The archive could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be written.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Whether a read or an offset ran off the end of the buffer (a truncated archive).
    pub fn is_out_of_bounds(&self) -> bool {
        match self {
            Error::Common(e) => e.is_out_of_bounds(),
            Error::OffsetOutOfBounds { .. } => true,
            _ => false,
        }
    }
}

/// Result type for BFRES operations.
pub type Result<T> = std::result::Result<T, Error>;
