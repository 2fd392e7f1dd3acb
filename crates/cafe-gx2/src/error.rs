//! Error types for GX2 surface handling.

use thiserror::Error;

use crate::TileMode;

/// Errors that can occur when describing or converting GX2 surfaces.
#[derive(Debug, Error)]
pub enum Error {
    /// Surface format id not present in the descriptor table.
    #[error("unknown GX2 surface format {0:#x}")]
    UnknownFormat(u32),

    /// Tile mode id outside of the GX2 range.
    #[error("unknown GX2 tile mode {0}")]
    UnknownTileMode(u32),

    /// Surface dimension id outside of the GX2 range.
    #[error("unknown GX2 surface dimension {0}")]
    UnknownDim(u32),

    /// The untiler cannot handle this tile mode.
    #[error("tile mode {0:?} is not supported by this untiler")]
    UnsupportedTileMode(TileMode),

    /// More mip levels than a GX2 surface can locate.
    #[error("{count} mip levels declared, at most {max} are supported")]
    InvalidMipCount { count: u32, max: u32 },

    /// The byte size of a surface does not fit the integer type holding it.
    #[error("a {width}x{height} surface is too large to address")]
    SizeOverflow { width: u32, height: u32 },

    /// Surface data is shorter than its declared layout.
    #[error("mip level {level} needs {needed} bytes but only {available} are available")]
    DataTooShort {
        level: u32,
        needed: usize,
        available: usize,
    },
}

/// Result type for GX2 operations.
pub type Result<T> = std::result::Result<T, Error>;
