//! DDS texture container synthesis for Wii U textures.
//!
//! GX2 surfaces are exported as classic DDS files: a `"DDS "` magic, a
//! 124 byte header describing dimensions, mip levels and pixel format, and
//! the pixel payload in linear scan order. The header is derived from a
//! [`cafe_gx2::FormatDescriptor`]; the payload is copied verbatim.
//!
//! # Example
//!
//! ```no_run
//! use cafe_dds::{DdsFile, DdsHeader};
//! use cafe_gx2::SurfaceFormat;
//!
//! let format = SurfaceFormat::UnormBc1.descriptor();
//! let header = DdsHeader::new(256, 256, 1, 1, format)?;
//! let payload = vec![0u8; format.surface_size(256, 256)?];
//!
//! DdsFile::new(header, payload).write_file("texture.dds")?;
//! # Ok::<(), cafe_dds::Error>(())
//! ```

mod error;
mod file;
mod header;

pub use error::{Error, Result};
pub use file::{write_file, DdsFile};
pub use header::{flags, DdsHeader, DdsPixelFormat, FourCC};

/// DDS file magic bytes ("DDS ").
pub const DDS_MAGIC: &[u8; 4] = b"DDS ";
