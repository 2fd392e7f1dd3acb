//! DDS header structures.

use cafe_common::{BinaryReader, BinaryWriter, Endian};
use cafe_gx2::{ChannelLayout, FormatDescriptor};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// Flag values of the DDS header, pixel format and caps words.
pub mod flags {
    /// `caps` is valid.
    pub const DDSD_CAPS: u32 = 0x1;
    /// `height` is valid.
    pub const DDSD_HEIGHT: u32 = 0x2;
    /// `width` is valid.
    pub const DDSD_WIDTH: u32 = 0x4;
    /// `pitch_or_linear_size` holds a row pitch.
    pub const DDSD_PITCH: u32 = 0x8;
    /// `pixel_format` is valid.
    pub const DDSD_PIXELFORMAT: u32 = 0x1000;
    /// `mipmap_count` is valid.
    pub const DDSD_MIPMAPCOUNT: u32 = 0x20000;
    /// `pitch_or_linear_size` holds the size of the top level.
    pub const DDSD_LINEARSIZE: u32 = 0x80000;
    /// `depth` is valid.
    pub const DDSD_DEPTH: u32 = 0x800000;

    pub const DDSCAPS_COMPLEX: u32 = 0x8;
    pub const DDSCAPS_TEXTURE: u32 = 0x1000;
    pub const DDSCAPS_MIPMAP: u32 = 0x400000;

    pub const DDSCAPS2_VOLUME: u32 = 0x200000;

    pub const DDPF_ALPHAPIXELS: u32 = 0x1;
    pub const DDPF_ALPHA: u32 = 0x2;
    pub const DDPF_FOURCC: u32 = 0x4;
    pub const DDPF_RGB: u32 = 0x40;
    pub const DDPF_YUV: u32 = 0x200;
    pub const DDPF_LUMINANCE: u32 = 0x20000;
}

use flags::*;

/// Four-character code for compression type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// DXT1 compression.
    pub const DXT1: Self = Self(*b"DXT1");
    /// DXT3 compression.
    pub const DXT3: Self = Self(*b"DXT3");
    /// DXT5 compression.
    pub const DXT5: Self = Self(*b"DXT5");
    /// BC4U compression.
    pub const BC4U: Self = Self(*b"BC4U");
    /// BC4S compression.
    pub const BC4S: Self = Self(*b"BC4S");
    /// BC5U compression.
    pub const BC5U: Self = Self(*b"BC5U");
    /// BC5S compression.
    pub const BC5S: Self = Self(*b"BC5S");
    /// No code (uncompressed formats).
    pub const NONE: Self = Self([0; 4]);
}

/// DDS pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DdsPixelFormat {
    /// Structure size (should be 32).
    pub size: u32,
    /// Pixel format flags.
    pub flags: u32,
    /// Four-character code for compression.
    pub four_cc: FourCC,
    /// Number of bits per pixel (for uncompressed).
    pub rgb_bit_count: u32,
    /// Red bit mask.
    pub r_bit_mask: u32,
    /// Green bit mask.
    pub g_bit_mask: u32,
    /// Blue bit mask.
    pub b_bit_mask: u32,
    /// Alpha bit mask.
    pub a_bit_mask: u32,
}

impl DdsPixelFormat {
    /// Expected structure size.
    pub const SIZE: u32 = 32;

    /// Derive the pixel format block from a GX2 format descriptor.
    pub fn from_descriptor(format: &FormatDescriptor) -> Self {
        if let Some(code) = format.four_cc {
            return Self {
                size: Self::SIZE,
                flags: DDPF_FOURCC,
                four_cc: FourCC(code),
                ..Self::default()
            };
        }

        let mut flags = match format.channels {
            ChannelLayout::Luminance | ChannelLayout::LuminanceAlpha => DDPF_LUMINANCE,
            ChannelLayout::Rgb | ChannelLayout::Rgba => DDPF_RGB,
        };
        if format.channels.has_alpha() {
            flags |= DDPF_ALPHAPIXELS;
        }

        Self {
            size: Self::SIZE,
            flags,
            four_cc: FourCC::NONE,
            rgb_bit_count: format.bits_per_pixel(),
            r_bit_mask: format.masks.r,
            g_bit_mask: format.masks.g,
            b_bit_mask: format.masks.b,
            a_bit_mask: format.masks.a,
        }
    }

    /// Whether the pixel format names a block compression code.
    pub fn is_compressed(&self) -> bool {
        self.flags & DDPF_FOURCC != 0
    }

    fn extend_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.size.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(self.four_cc.as_bytes());
        for word in [
            self.rgb_bit_count,
            self.r_bit_mask,
            self.g_bit_mask,
            self.b_bit_mask,
            self.a_bit_mask,
        ] {
            out.extend_from_slice(&word.to_le_bytes());
        }
    }

    fn read_from(reader: &mut BinaryReader<'_>) -> cafe_common::Result<Self> {
        Ok(Self {
            size: reader.read_u32()?,
            flags: reader.read_u32()?,
            four_cc: reader.read_struct()?,
            rgb_bit_count: reader.read_u32()?,
            r_bit_mask: reader.read_u32()?,
            g_bit_mask: reader.read_u32()?,
            b_bit_mask: reader.read_u32()?,
            a_bit_mask: reader.read_u32()?,
        })
    }
}

/// DDS file header (the 124 bytes following the magic).
///
/// DDS files are little endian regardless of the source archive, so the
/// header is serialized field by field rather than as a raw struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DdsHeader {
    /// Header size (should be 124).
    pub size: u32,
    /// Header flags.
    pub flags: u32,
    /// Image height.
    pub height: u32,
    /// Image width.
    pub width: u32,
    /// Pitch or linear size.
    pub pitch_or_linear_size: u32,
    /// Depth (for volume textures).
    pub depth: u32,
    /// Number of mipmap levels.
    pub mipmap_count: u32,
    /// Reserved.
    pub reserved1: [u32; 11],
    /// Pixel format.
    pub pixel_format: DdsPixelFormat,
    /// Surface complexity (`DDSCAPS_*`).
    pub caps: u32,
    /// Surface capabilities 2.
    pub caps2: u32,
    /// Surface capabilities 3.
    pub caps3: u32,
    /// Surface capabilities 4.
    pub caps4: u32,
    /// Reserved.
    pub reserved2: u32,
}

impl DdsHeader {
    /// Expected header size.
    pub const SIZE: u32 = 124;

    /// Synthesize a header for a surface of the given format.
    ///
    /// Uncompressed formats record a row pitch, block formats the byte size
    /// of the top level. `depth > 1` marks a volume texture and
    /// `mip_count > 1` a mipmapped, complex surface. Fails when the pitch or
    /// top level size does not fit the 32-bit header field.
    pub fn new(
        width: u32,
        height: u32,
        depth: u32,
        mip_count: u32,
        format: &FormatDescriptor,
    ) -> Result<Self> {
        let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT;
        let mut caps = 0;
        let mut caps2 = 0;

        let pitch_or_linear_size = if format.is_compressed() {
            flags |= DDSD_LINEARSIZE;
            u32::try_from(format.surface_size(width, height)?)
                .map_err(|_| cafe_gx2::Error::SizeOverflow { width, height })?
        } else {
            flags |= DDSD_PITCH;
            format.row_size(width)?
        };

        if depth > 1 {
            flags |= DDSD_DEPTH;
            caps2 |= DDSCAPS2_VOLUME;
        }

        if mip_count > 1 {
            flags |= DDSD_MIPMAPCOUNT;
            caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
        }

        Ok(Self {
            size: Self::SIZE,
            flags,
            height,
            width,
            pitch_or_linear_size,
            depth,
            mipmap_count: mip_count,
            reserved1: [0; 11],
            pixel_format: DdsPixelFormat::from_descriptor(format),
            caps,
            caps2,
            caps3: 0,
            caps4: 0,
            reserved2: 0,
        })
    }

    /// Whether the header describes more than one mip level.
    pub fn has_mipmaps(&self) -> bool {
        self.flags & DDSD_MIPMAPCOUNT != 0
    }

    /// Serialize the header (without magic) at the writer's position.
    pub fn write_to(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.write_bytes(&self.to_bytes())?;
        Ok(())
    }

    /// Serialize the header (without magic), always little endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE as usize);
        for word in [
            self.size,
            self.flags,
            self.height,
            self.width,
            self.pitch_or_linear_size,
            self.depth,
            self.mipmap_count,
        ]
        .into_iter()
        .chain(self.reserved1)
        {
            out.extend_from_slice(&word.to_le_bytes());
        }
        self.pixel_format.extend_bytes(&mut out);
        for word in [self.caps, self.caps2, self.caps3, self.caps4, self.reserved2] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Parse a header (without magic) at the reader's position.
    pub fn read_from(reader: &mut BinaryReader<'_>) -> Result<Self> {
        reader.set_endian(Endian::Little);
        let size = reader.read_u32()?;
        if size != Self::SIZE {
            return Err(Error::InvalidHeader(format!(
                "header size is {size}, expected {}",
                Self::SIZE
            )));
        }

        let flags = reader.read_u32()?;
        let height = reader.read_u32()?;
        let width = reader.read_u32()?;
        let pitch_or_linear_size = reader.read_u32()?;
        let depth = reader.read_u32()?;
        let mipmap_count = reader.read_u32()?;
        let mut reserved1 = [0u32; 11];
        for reserved in &mut reserved1 {
            *reserved = reader.read_u32()?;
        }

        let pixel_format = DdsPixelFormat::read_from(reader)?;
        if pixel_format.size != DdsPixelFormat::SIZE {
            return Err(Error::InvalidHeader(format!(
                "pixel format size is {}, expected {}",
                pixel_format.size,
                DdsPixelFormat::SIZE
            )));
        }

        Ok(Self {
            size,
            flags,
            height,
            width,
            pitch_or_linear_size,
            depth,
            mipmap_count,
            reserved1,
            pixel_format,
            caps: reader.read_u32()?,
            caps2: reader.read_u32()?,
            caps3: reader.read_u32()?,
            caps4: reader.read_u32()?,
            reserved2: reader.read_u32()?,
        })
    }
}
