//! GX2 surface format descriptor table.

use std::fmt;

use crate::{Error, Result};

/// GX2 surface format ids used by Wii U textures.
///
/// The low byte selects the bit layout; bit 10 (`0x400`) marks sRGB and
/// bit 9 (`0x200`) marks signed-normalized variants of the same layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u32)]
pub enum SurfaceFormat {
    UnormR8 = 0x001,
    UnormR4G4 = 0x002,
    UnormR8G8 = 0x007,
    UnormR5G6B5 = 0x008,
    UnormR5G5B5A1 = 0x00A,
    UnormR4G4B4A4 = 0x00B,
    UnormA1B5G5R5 = 0x00C,
    UnormR10G10B10A2 = 0x019,
    UnormR8G8B8A8 = 0x01A,
    SrgbR8G8B8A8 = 0x41A,
    UnormBc1 = 0x031,
    SrgbBc1 = 0x431,
    UnormBc2 = 0x032,
    SrgbBc2 = 0x432,
    UnormBc3 = 0x033,
    SrgbBc3 = 0x433,
    UnormBc4 = 0x034,
    SnormBc4 = 0x234,
    UnormBc5 = 0x035,
    SnormBc5 = 0x235,
}

impl SurfaceFormat {
    /// Raw GX2 format id.
    #[inline]
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Convert a raw GX2 format id.
    pub fn from_id(id: u32) -> Result<Self> {
        FormatDescriptor::lookup(id).map(|d| d.format)
    }

    /// Descriptor for this format.
    pub fn descriptor(self) -> &'static FormatDescriptor {
        // Every variant has a table entry.
        FORMATS
            .iter()
            .find(|d| d.format == self)
            .unwrap_or(&FORMATS[0])
    }
}

impl TryFrom<u32> for SurfaceFormat {
    type Error = Error;

    fn try_from(id: u32) -> Result<Self> {
        Self::from_id(id)
    }
}

impl fmt::Display for SurfaceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

/// Storage footprint of a surface format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Footprint {
    /// One element per pixel.
    Uncompressed { bits_per_pixel: u32 },
    /// One element per `width` x `height` pixel block.
    Block { width: u32, height: u32, bytes: u32 },
}

/// Which channels an uncompressed format carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ChannelLayout {
    Luminance,
    LuminanceAlpha,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    /// Whether an alpha channel is present.
    pub const fn has_alpha(self) -> bool {
        matches!(self, ChannelLayout::LuminanceAlpha | ChannelLayout::Rgba)
    }
}

/// Channel bit masks of an uncompressed pixel, as read from a little endian word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChannelMasks {
    pub r: u32,
    pub g: u32,
    pub b: u32,
    pub a: u32,
}

impl ChannelMasks {
    const NONE: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u32, g: u32, b: u32, a: u32) -> Self {
        Self { r, g, b, a }
    }
}

/// Static layout information for one GX2 surface format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FormatDescriptor {
    pub format: SurfaceFormat,
    pub name: &'static str,
    pub footprint: Footprint,
    pub channels: ChannelLayout,
    pub masks: ChannelMasks,
    /// Four-character code identifying the block compression in DDS files.
    pub four_cc: Option<[u8; 4]>,
}

const fn uncompressed(
    format: SurfaceFormat,
    name: &'static str,
    bits_per_pixel: u32,
    channels: ChannelLayout,
    masks: ChannelMasks,
) -> FormatDescriptor {
    FormatDescriptor {
        format,
        name,
        footprint: Footprint::Uncompressed { bits_per_pixel },
        channels,
        masks,
        four_cc: None,
    }
}

const fn bc(
    format: SurfaceFormat,
    name: &'static str,
    bytes: u32,
    channels: ChannelLayout,
    four_cc: &[u8; 4],
) -> FormatDescriptor {
    FormatDescriptor {
        format,
        name,
        footprint: Footprint::Block {
            width: 4,
            height: 4,
            bytes,
        },
        channels,
        masks: ChannelMasks::NONE,
        four_cc: Some(*four_cc),
    }
}

use ChannelLayout::*;
use SurfaceFormat::*;

static FORMATS: [FormatDescriptor; 20] = [
    uncompressed(UnormR8, "R8_UNORM", 8, Luminance, ChannelMasks::new(0xFF, 0, 0, 0)),
    uncompressed(
        UnormR4G4,
        "R4_G4_UNORM",
        8,
        LuminanceAlpha,
        ChannelMasks::new(0x0F, 0, 0, 0xF0),
    ),
    uncompressed(
        UnormR8G8,
        "R8_G8_UNORM",
        16,
        LuminanceAlpha,
        ChannelMasks::new(0x00FF, 0, 0, 0xFF00),
    ),
    uncompressed(
        UnormR5G6B5,
        "R5_G6_B5_UNORM",
        16,
        Rgb,
        ChannelMasks::new(0xF800, 0x07E0, 0x001F, 0),
    ),
    uncompressed(
        UnormR5G5B5A1,
        "R5_G5_B5_A1_UNORM",
        16,
        Rgba,
        ChannelMasks::new(0x7C00, 0x03E0, 0x001F, 0x8000),
    ),
    uncompressed(
        UnormR4G4B4A4,
        "R4_G4_B4_A4_UNORM",
        16,
        Rgba,
        ChannelMasks::new(0x0F00, 0x00F0, 0x000F, 0xF000),
    ),
    uncompressed(
        UnormA1B5G5R5,
        "A1_B5_G5_R5_UNORM",
        16,
        Rgba,
        ChannelMasks::new(0x001F, 0x03E0, 0x7C00, 0x8000),
    ),
    uncompressed(
        UnormR10G10B10A2,
        "R10_G10_B10_A2_UNORM",
        32,
        Rgba,
        ChannelMasks::new(0x0000_03FF, 0x000F_FC00, 0x3FF0_0000, 0xC000_0000),
    ),
    uncompressed(
        UnormR8G8B8A8,
        "R8_G8_B8_A8_UNORM",
        32,
        Rgba,
        ChannelMasks::new(0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000),
    ),
    uncompressed(
        SrgbR8G8B8A8,
        "R8_G8_B8_A8_SRGB",
        32,
        Rgba,
        ChannelMasks::new(0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000),
    ),
    bc(UnormBc1, "BC1_UNORM", 8, Rgba, b"DXT1"),
    bc(SrgbBc1, "BC1_SRGB", 8, Rgba, b"DXT1"),
    bc(UnormBc2, "BC2_UNORM", 16, Rgba, b"DXT3"),
    bc(SrgbBc2, "BC2_SRGB", 16, Rgba, b"DXT3"),
    bc(UnormBc3, "BC3_UNORM", 16, Rgba, b"DXT5"),
    bc(SrgbBc3, "BC3_SRGB", 16, Rgba, b"DXT5"),
    bc(UnormBc4, "BC4_UNORM", 8, Luminance, b"BC4U"),
    bc(SnormBc4, "BC4_SNORM", 8, Luminance, b"BC4S"),
    bc(UnormBc5, "BC5_UNORM", 16, LuminanceAlpha, b"BC5U"),
    bc(SnormBc5, "BC5_SNORM", 16, LuminanceAlpha, b"BC5S"),
];

impl FormatDescriptor {
    /// Look up the descriptor of a raw GX2 format id.
    pub fn lookup(format_id: u32) -> Result<&'static FormatDescriptor> {
        FORMATS
            .iter()
            .find(|d| d.format.id() == format_id)
            .ok_or(Error::UnknownFormat(format_id))
    }

    /// The whole descriptor table.
    pub fn all() -> &'static [FormatDescriptor] {
        &FORMATS
    }

    /// Whether the format is block compressed.
    #[inline]
    pub const fn is_compressed(&self) -> bool {
        matches!(self.footprint, Footprint::Block { .. })
    }

    /// Pixel dimensions of one storage element (1x1 for uncompressed formats).
    pub const fn block_dimensions(&self) -> (u32, u32) {
        match self.footprint {
            Footprint::Uncompressed { .. } => (1, 1),
            Footprint::Block { width, height, .. } => (width, height),
        }
    }

    /// Bits per pixel of an uncompressed format, or the average for a block format.
    pub const fn bits_per_pixel(&self) -> u32 {
        match self.footprint {
            Footprint::Uncompressed { bits_per_pixel } => bits_per_pixel,
            Footprint::Block {
                width,
                height,
                bytes,
            } => bytes * 8 / (width * height),
        }
    }

    /// Size in bytes of one storage element (pixel or block).
    pub const fn bytes_per_element(&self) -> u32 {
        match self.footprint {
            Footprint::Uncompressed { bits_per_pixel } => bits_per_pixel.div_ceil(8),
            Footprint::Block { bytes, .. } => bytes,
        }
    }

    /// Number of storage elements covering `width` x `height` pixels, per axis.
    pub const fn element_extent(&self, width: u32, height: u32) -> (u32, u32) {
        let (bw, bh) = self.block_dimensions();
        (width.div_ceil(bw), height.div_ceil(bh))
    }

    /// Size in bytes of one row of pixels, or one row of blocks.
    pub fn row_size(&self, width: u32) -> Result<u32> {
        let size = match self.footprint {
            Footprint::Uncompressed { bits_per_pixel } => {
                u32::try_from((width as u64 * bits_per_pixel as u64).div_ceil(8)).ok()
            }
            Footprint::Block { width: bw, bytes, .. } => width.div_ceil(bw).checked_mul(bytes),
        };
        size.ok_or(Error::SizeOverflow { width, height: 1 })
    }

    /// Size in bytes of one linear 2D level of `width` x `height` pixels.
    pub fn surface_size(&self, width: u32, height: u32) -> Result<usize> {
        let (_, rows) = self.element_extent(width, height);
        (self.row_size(width)? as usize)
            .checked_mul(rows as usize)
            .ok_or(Error::SizeOverflow { width, height })
    }

    /// Size in bytes of mip `level` of a `width` x `height` surface.
    pub fn mip_level_size(&self, width: u32, height: u32, level: u32) -> Result<usize> {
        let w = width.checked_shr(level).unwrap_or(0).max(1);
        let h = height.checked_shr(level).unwrap_or(0).max(1);
        self.surface_size(w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_and_unknown() {
        let rgba = FormatDescriptor::lookup(0x1A).unwrap();
        assert_eq!(rgba.format, SurfaceFormat::UnormR8G8B8A8);
        assert!(!rgba.is_compressed());
        assert_eq!(rgba.bits_per_pixel(), 32);

        assert!(matches!(
            FormatDescriptor::lookup(0x3F),
            Err(Error::UnknownFormat(0x3F))
        ));
    }

    #[test]
    fn test_table_is_consistent() {
        for descriptor in FormatDescriptor::all() {
            assert_eq!(descriptor.format.descriptor(), descriptor);
            assert_eq!(descriptor.is_compressed(), descriptor.four_cc.is_some());
            if !descriptor.is_compressed() {
                assert_ne!(descriptor.masks, ChannelMasks::default(), "{}", descriptor.name);
            }
        }
    }

    #[test]
    fn test_block_sizes() {
        let bc1 = SurfaceFormat::UnormBc1.descriptor();
        let bc3 = SurfaceFormat::SrgbBc3.descriptor();
        assert_eq!(bc1.bytes_per_element(), 8);
        assert_eq!(bc3.bytes_per_element(), 16);
        assert_eq!(bc1.bits_per_pixel(), 4);

        // Partial blocks round up.
        assert_eq!(bc1.surface_size(1, 1).unwrap(), 8);
        assert_eq!(bc1.surface_size(5, 9).unwrap(), 2 * 3 * 8);
        assert_eq!(bc3.surface_size(1024, 1024).unwrap(), 1024 * 1024);
    }

    #[test]
    fn test_mip_level_size_clamps_to_one_pixel() {
        let rgba = SurfaceFormat::UnormR8G8B8A8.descriptor();
        assert_eq!(rgba.mip_level_size(256, 64, 0).unwrap(), 256 * 64 * 4);
        assert_eq!(rgba.mip_level_size(256, 64, 7).unwrap(), 2 * 4);
        assert_eq!(rgba.mip_level_size(256, 64, 12).unwrap(), 4);
        assert_eq!(rgba.mip_level_size(256, 64, 40).unwrap(), 4);
    }

    #[test]
    fn test_sizes_report_overflow() {
        let rgba = SurfaceFormat::UnormR8G8B8A8.descriptor();
        assert_eq!(rgba.row_size(0x3FFF_FFFF).unwrap(), 0xFFFF_FFFC);
        assert!(matches!(
            rgba.row_size(0x4000_0000),
            Err(Error::SizeOverflow { width: 0x4000_0000, .. })
        ));

        let bc3 = SurfaceFormat::UnormBc3.descriptor();
        assert!(matches!(
            bc3.surface_size(u32::MAX, 4),
            Err(Error::SizeOverflow { .. })
        ));
    }
}
