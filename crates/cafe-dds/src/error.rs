//! Error types for DDS handling.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while writing or reading back DDS files.
#[derive(Debug, Error)]
pub enum Error {
    /// The destination file could not be created or written.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Common library error.
    #[error("{0}")]
    Common(#[from] cafe_common::Error),

    /// Surface dimensions the header cannot describe.
    #[error("{0}")]
    Gx2(#[from] cafe_gx2::Error),

    /// The input does not start with `"DDS "`.
    #[error("not a DDS file (magic {:?})", String::from_utf8_lossy(.0))]
    InvalidMagic([u8; 4]),

    /// A fixed size field of the header has the wrong value.
    #[error("malformed DDS header: {0}")]
    InvalidHeader(String),
}

/// Result type for DDS operations.
pub type Result<T> = std::result::Result<T, Error>;
