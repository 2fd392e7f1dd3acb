//! Sub-resource headers reached through the group dictionaries.
//!
//! Only the fixed headers are decoded; bodies (vertex buffers, skeletons,
//! pixel data) stay in the archive buffer and are sliced on demand.

use std::sync::Arc;

use cafe_common::BinaryReader;
use cafe_gx2::{FormatDescriptor, SurfaceDim, SurfaceInfo, TileMode};
use tracing::debug;

use crate::{Error, GroupKind, Result};

/// Check the magic at the reader's position.
fn expect_magic(reader: &mut BinaryReader<'_>, expected: &[u8; 4]) -> Result<()> {
    let offset = reader.position();
    let actual: [u8; 4] = reader.read_array()?;
    if &actual != expected {
        return Err(Error::BadMagic {
            offset,
            expected: *expected,
            actual,
        });
    }
    Ok(())
}

/// Slice `size` bytes at `offset`, naming `field` on failure.
fn slice<'a>(data: &'a [u8], field: &str, offset: Option<usize>, size: u32) -> Result<&'a [u8]> {
    let Some(offset) = offset else {
        return Ok(&[]);
    };
    offset
        .checked_add(size as usize)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| Error::OffsetOutOfBounds {
            field: field.to_string(),
            offset: offset as i64 + size as i64,
            len: data.len(),
        })
}

/// FMDL model header (0x30 bytes).
///
/// Offsets are absolute and `None` when the field is 0.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModelHeader {
    pub name_offset: Option<usize>,
    pub path_offset: Option<usize>,
    pub skeleton_offset: Option<usize>,
    pub vertex_array_offset: Option<usize>,
    pub shape_dict_offset: Option<usize>,
    pub material_dict_offset: Option<usize>,
    pub user_data_dict_offset: Option<usize>,
    pub vertex_buffer_count: u16,
    pub shape_count: u16,
    pub material_count: u16,
    pub user_data_count: u16,
    pub total_vertices: u32,
    pub user_pointer: u32,
}

impl ModelHeader {
    pub const MAGIC: &'static [u8; 4] = b"FMDL";
    pub const SIZE: usize = 0x30;

    /// Read the header at the reader's position.
    pub fn read_from(reader: &mut BinaryReader<'_>) -> Result<Self> {
        expect_magic(reader, Self::MAGIC)?;
        Ok(Self {
            name_offset: reader.read_relative_offset()?,
            path_offset: reader.read_relative_offset()?,
            skeleton_offset: reader.read_relative_offset()?,
            vertex_array_offset: reader.read_relative_offset()?,
            shape_dict_offset: reader.read_relative_offset()?,
            material_dict_offset: reader.read_relative_offset()?,
            user_data_dict_offset: reader.read_relative_offset()?,
            vertex_buffer_count: reader.read_u16()?,
            shape_count: reader.read_u16()?,
            material_count: reader.read_u16()?,
            user_data_count: reader.read_u16()?,
            total_vertices: reader.read_u32()?,
            user_pointer: reader.read_u32()?,
        })
    }
}

/// FTEX texture header (0xC0 bytes): a GX2 surface description plus
/// pointers to the pixel data.
///
/// Enumerated GX2 fields are kept as raw ids so that unknown values do not
/// prevent the archive from opening; [`TextureHeader::surface_info`]
/// interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextureHeader {
    pub dim: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mip_count: u32,
    pub format: u32,
    pub aa_mode: u32,
    pub usage: u32,
    pub image_size: u32,
    pub image_pointer: u32,
    pub mipmap_size: u32,
    pub mipmap_pointer: u32,
    pub tile_mode: u32,
    pub swizzle: u32,
    pub alignment: u32,
    pub pitch: u32,
    pub mip_offsets: [u32; 13],
    pub view_first_mip: u32,
    pub view_mip_count: u32,
    pub view_first_slice: u32,
    pub view_slice_count: u32,
    pub component_selector: [u8; 4],
    pub registers: [u32; 5],
    pub handle: u32,
    pub array_length: u32,
    pub name_offset: Option<usize>,
    pub path_offset: Option<usize>,
    pub data_offset: Option<usize>,
    pub mipmap_offset: Option<usize>,
    pub user_data_dict_offset: Option<usize>,
    pub user_data_count: u16,
}

impl TextureHeader {
    pub const MAGIC: &'static [u8; 4] = b"FTEX";
    pub const SIZE: usize = 0xC0;

    /// Read the header at the reader's position.
    pub fn read_from(reader: &mut BinaryReader<'_>) -> Result<Self> {
        expect_magic(reader, Self::MAGIC)?;

        let dim = reader.read_u32()?;
        let width = reader.read_u32()?;
        let height = reader.read_u32()?;
        let depth = reader.read_u32()?;
        let mip_count = reader.read_u32()?;
        let format = reader.read_u32()?;
        let aa_mode = reader.read_u32()?;
        let usage = reader.read_u32()?;
        let image_size = reader.read_u32()?;
        let image_pointer = reader.read_u32()?;
        let mipmap_size = reader.read_u32()?;
        let mipmap_pointer = reader.read_u32()?;
        let tile_mode = reader.read_u32()?;
        let swizzle = reader.read_u32()?;
        let alignment = reader.read_u32()?;
        let pitch = reader.read_u32()?;

        let mut mip_offsets = [0u32; 13];
        for offset in &mut mip_offsets {
            *offset = reader.read_u32()?;
        }

        let view_first_mip = reader.read_u32()?;
        let view_mip_count = reader.read_u32()?;
        let view_first_slice = reader.read_u32()?;
        let view_slice_count = reader.read_u32()?;
        let component_selector = reader.read_array()?;

        let mut registers = [0u32; 5];
        for register in &mut registers {
            *register = reader.read_u32()?;
        }

        let handle = reader.read_u32()?;
        let array_length = reader.read_u32()?;
        let name_offset = reader.read_relative_offset()?;
        let path_offset = reader.read_relative_offset()?;
        let data_offset = reader.read_relative_offset()?;
        let mipmap_offset = reader.read_relative_offset()?;
        let user_data_dict_offset = reader.read_relative_offset()?;
        let user_data_count = reader.read_u16()?;
        reader.advance(2)?;

        Ok(Self {
            dim,
            width,
            height,
            depth,
            mip_count,
            format,
            aa_mode,
            usage,
            image_size,
            image_pointer,
            mipmap_size,
            mipmap_pointer,
            tile_mode,
            swizzle,
            alignment,
            pitch,
            mip_offsets,
            view_first_mip,
            view_mip_count,
            view_first_slice,
            view_slice_count,
            component_selector,
            registers,
            handle,
            array_length,
            name_offset,
            path_offset,
            data_offset,
            mipmap_offset,
            user_data_dict_offset,
            user_data_count,
        })
    }

    /// Descriptor of the texture's GX2 format.
    pub fn format_descriptor(&self) -> cafe_gx2::Result<&'static FormatDescriptor> {
        FormatDescriptor::lookup(self.format)
    }

    /// Interpret the GX2 fields as a surface description.
    ///
    /// Fails on unknown enumerated values and on more mip levels than the
    /// header has offsets for.
    pub fn surface_info(&self) -> cafe_gx2::Result<SurfaceInfo> {
        let surface = SurfaceInfo {
            dim: SurfaceDim::try_from(self.dim)?,
            width: self.width,
            height: self.height,
            depth: self.depth,
            mip_count: self.mip_count,
            format: self.format_descriptor()?,
            tile_mode: TileMode::try_from(self.tile_mode)?,
            swizzle: self.swizzle,
            alignment: self.alignment,
            pitch: self.pitch,
            mip_offsets: self.mip_offsets,
        };
        surface.validate()?;
        Ok(surface)
    }

    /// Base level pixel data inside the archive buffer.
    pub fn image_data<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        slice(data, "texture data", self.data_offset, self.image_size)
    }

    /// Pixel data of levels 1 and up, empty without mipmaps.
    pub fn mipmap_data<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        if self.mip_count <= 1 {
            return Ok(&[]);
        }
        slice(data, "texture mipmap data", self.mipmap_offset, self.mipmap_size)
    }
}

/// Embedded file descriptor (8 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EmbeddedFile {
    pub data_offset: Option<usize>,
    pub size: u32,
}

impl EmbeddedFile {
    pub const SIZE: usize = 0x08;

    pub fn read_from(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            data_offset: reader.read_relative_offset()?,
            size: reader.read_u32()?,
        })
    }

    /// File contents inside the archive buffer.
    pub fn data<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        slice(data, "embedded file data", self.data_offset, self.size)
    }
}

/// Decoded sub-resource header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SubResource {
    Model(ModelHeader),
    Texture(TextureHeader),
    Embedded(EmbeddedFile),
    /// Animation and scene resources: only the magic is checked.
    Other { magic: [u8; 4] },
}

impl SubResource {
    /// Read the header of a `kind` resource at `offset`.
    ///
    /// Returns the header and its serialized size. The reader position is
    /// left unchanged.
    pub fn parse(
        reader: &mut BinaryReader<'_>,
        kind: GroupKind,
        offset: usize,
    ) -> Result<(Self, usize)> {
        let saved = reader.position();
        let result = reader.seek(offset).map_err(Error::from).and_then(|()| {
            Ok(match kind {
                GroupKind::Model => (
                    Self::Model(ModelHeader::read_from(reader)?),
                    ModelHeader::SIZE,
                ),
                GroupKind::Texture => (
                    Self::Texture(TextureHeader::read_from(reader)?),
                    TextureHeader::SIZE,
                ),
                GroupKind::EmbeddedFile => (
                    Self::Embedded(EmbeddedFile::read_from(reader)?),
                    EmbeddedFile::SIZE,
                ),
                other => {
                    // Every other slot carries a magic.
                    let expected = other.magic().unwrap_or(b"\0\0\0\0");
                    expect_magic(reader, expected)?;
                    (Self::Other { magic: *expected }, 4)
                }
            })
        });
        reader.seek(saved)?;
        result
    }
}

/// A named entry of a resource group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    /// Name, shared with the dictionary.
    pub name: Arc<str>,
    /// Absolute offset of the sub-header.
    pub offset: usize,
    /// Size of the parsed sub-header.
    pub len: usize,
    pub resource: SubResource,
}

impl ResourceNode {
    pub(crate) fn parse(
        reader: &mut BinaryReader<'_>,
        kind: GroupKind,
        name: Arc<str>,
        offset: usize,
    ) -> Result<Self> {
        let (resource, len) = SubResource::parse(reader, kind, offset)?;
        debug!(%name, offset, %kind, "parsed resource");
        Ok(Self {
            name,
            offset,
            len,
            resource,
        })
    }

    pub fn as_model(&self) -> Option<&ModelHeader> {
        match &self.resource {
            SubResource::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&TextureHeader> {
        match &self.resource {
            SubResource::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn as_embedded(&self) -> Option<&EmbeddedFile> {
        match &self.resource {
            SubResource::Embedded(file) => Some(file),
            _ => None,
        }
    }
}
