//! GX2 surface formats for Wii U textures.
//!
//! The Wii U GPU describes every texture with a `GX2Surface`: dimensions,
//! a surface format id, a tile mode and the offsets of its mip levels. This
//! crate provides:
//!
//! - [`SurfaceFormat`] and the static [`FormatDescriptor`] table, mapping a
//!   format id to its block footprint, channel masks and compression
//! - [`SurfaceInfo`] and [`TileMode`], the layout of one surface
//! - the [`Untiler`] contract that turns GPU-native surface bytes into the
//!   linear scan order expected by interchange containers
//!
//! # Example
//!
//! ```
//! use cafe_gx2::FormatDescriptor;
//!
//! let bc1 = FormatDescriptor::lookup(0x31)?;
//! assert!(bc1.is_compressed());
//! assert_eq!(bc1.surface_size(512, 512)?, 131072);
//! # Ok::<(), cafe_gx2::Error>(())
//! ```

mod error;
mod format;
mod surface;

pub use error::{Error, Result};
pub use format::{ChannelLayout, ChannelMasks, Footprint, FormatDescriptor, SurfaceFormat};
pub use surface::{LinearCopy, SurfaceDim, SurfaceInfo, TileMode, Untiler, Verbatim};
