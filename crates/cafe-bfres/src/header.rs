//! BFRES file header.

use std::fmt;

use cafe_common::{BinaryReader, BinaryWriter, Endian};
use tracing::warn;

use crate::{Error, Result};

/// Number of resource group slots in the header.
pub const GROUP_COUNT: usize = 12;

/// Resource group slots, in header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum GroupKind {
    Model,
    Texture,
    SkeletalAnim,
    ShaderParamAnim,
    ColorAnim,
    TextureSrtAnim,
    TexturePatternAnim,
    BoneVisibilityAnim,
    MaterialVisibilityAnim,
    ShapeAnim,
    SceneAnim,
    EmbeddedFile,
}

impl GroupKind {
    /// All slots in header order.
    pub const ALL: [GroupKind; GROUP_COUNT] = [
        GroupKind::Model,
        GroupKind::Texture,
        GroupKind::SkeletalAnim,
        GroupKind::ShaderParamAnim,
        GroupKind::ColorAnim,
        GroupKind::TextureSrtAnim,
        GroupKind::TexturePatternAnim,
        GroupKind::BoneVisibilityAnim,
        GroupKind::MaterialVisibilityAnim,
        GroupKind::ShapeAnim,
        GroupKind::SceneAnim,
        GroupKind::EmbeddedFile,
    ];

    /// Slot index in the header tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Magic of the sub-resources stored in this group, if they carry one.
    pub const fn magic(self) -> Option<&'static [u8; 4]> {
        match self {
            GroupKind::Model => Some(b"FMDL"),
            GroupKind::Texture => Some(b"FTEX"),
            GroupKind::SkeletalAnim => Some(b"FSKA"),
            GroupKind::ShaderParamAnim | GroupKind::ColorAnim | GroupKind::TextureSrtAnim => {
                Some(b"FSHU")
            }
            GroupKind::TexturePatternAnim => Some(b"FTXP"),
            GroupKind::BoneVisibilityAnim | GroupKind::MaterialVisibilityAnim => Some(b"FVIS"),
            GroupKind::ShapeAnim => Some(b"FSHA"),
            GroupKind::SceneAnim => Some(b"FSCN"),
            GroupKind::EmbeddedFile => None,
        }
    }

    /// Human readable group name.
    pub const fn label(self) -> &'static str {
        match self {
            GroupKind::Model => "Models",
            GroupKind::Texture => "Textures",
            GroupKind::SkeletalAnim => "Skeletal Animations",
            GroupKind::ShaderParamAnim => "Shader Parameter Animations",
            GroupKind::ColorAnim => "Color Animations",
            GroupKind::TextureSrtAnim => "Texture SRT Animations",
            GroupKind::TexturePatternAnim => "Texture Pattern Animations",
            GroupKind::BoneVisibilityAnim => "Bone Visibility Animations",
            GroupKind::MaterialVisibilityAnim => "Material Visibility Animations",
            GroupKind::ShapeAnim => "Shape Animations",
            GroupKind::SceneAnim => "Scene Animations",
            GroupKind::EmbeddedFile => "Embedded Files",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// BFRES file header (Wii U layout, 0x6C bytes).
///
/// Offset fields are stored exactly as on disk: signed and relative to the
/// position of the field itself, with 0 meaning "absent". Use the accessor
/// methods to resolve them to absolute buffer offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BfresHeader {
    /// Magic file identifier (`FRES`).
    pub magic: [u8; 4],
    /// Format version, one byte per component.
    pub version: u32,
    /// Byte order declared by the byte-order mark.
    pub endian: Endian,
    /// Size of the fixed header fields counted by the format (usually 0x10).
    pub header_length: u16,
    /// Total file length.
    pub length: u32,
    /// Data alignment.
    pub alignment: u32,
    /// Offset to the archive name, relative to its field.
    pub file_name_offset: i32,
    /// String table length in bytes.
    pub string_table_length: i32,
    /// Offset to the string table, relative to its field.
    pub string_table_offset: i32,
    /// Dictionary offsets per group, relative to their fields.
    pub group_offsets: [i32; GROUP_COUNT],
    /// Number of entries per group.
    pub group_counts: [u16; GROUP_COUNT],
    /// Runtime user pointer, 0 on disk.
    pub user_pointer: u32,
}

impl BfresHeader {
    /// The magic bytes at the start of a BFRES file.
    pub const MAGIC: &'static [u8; 4] = b"FRES";

    /// Serialized header size.
    pub const SIZE: usize = 0x6C;

    const BOM_POSITION: usize = 0x08;
    const FILE_NAME_OFFSET_POSITION: usize = 0x14;
    const STRING_TABLE_OFFSET_POSITION: usize = 0x1C;
    const GROUP_OFFSETS_POSITION: usize = 0x20;

    /// Check if data looks like a BFRES file by checking the magic bytes.
    pub fn is_bfres(data: &[u8]) -> bool {
        data.len() >= 4 && &data[..4] == Self::MAGIC
    }

    /// Read and validate the header at the start of `data`.
    ///
    /// Fails with [`Error::BadMagic`] on a foreign file,
    /// [`Error::InvalidByteOrderMark`] on an unknown byte order, an out of
    /// bounds error on truncation and [`Error::OffsetOutOfBounds`] when an
    /// offset field resolves outside of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = Self::read_from(&mut BinaryReader::new(data))?;
        header.validate(data.len())?;
        Ok(header)
    }

    /// Read the header at the reader's position and pin the reader's byte order.
    pub fn read_from(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let start = reader.position();
        let magic: [u8; 4] = reader.read_array()?;
        if &magic != Self::MAGIC {
            return Err(Error::BadMagic {
                offset: start,
                expected: *Self::MAGIC,
                actual: magic,
            });
        }

        let bom: [u8; 2] = reader.at(start + Self::BOM_POSITION, |r| r.read_array())?;
        let endian = Endian::from_bom(bom).ok_or(Error::InvalidByteOrderMark(bom))?;
        reader.set_endian(endian);

        let version = reader.read_u32()?;
        reader.advance(2)?;
        let header_length = reader.read_u16()?;
        let length = reader.read_u32()?;
        let alignment = reader.read_u32()?;
        let file_name_offset = reader.read_i32()?;
        let string_table_length = reader.read_i32()?;
        let string_table_offset = reader.read_i32()?;

        let mut group_offsets = [0i32; GROUP_COUNT];
        for offset in &mut group_offsets {
            *offset = reader.read_i32()?;
        }
        let mut group_counts = [0u16; GROUP_COUNT];
        for count in &mut group_counts {
            *count = reader.read_u16()?;
        }
        let user_pointer = reader.read_u32()?;

        Ok(Self {
            magic,
            version,
            endian,
            header_length,
            length,
            alignment,
            file_name_offset,
            string_table_length,
            string_table_offset,
            group_offsets,
            group_counts,
            user_pointer,
        })
    }

    /// Check every offset field against a buffer of `len` bytes.
    pub fn validate(&self, len: usize) -> Result<()> {
        if self.length as usize != len {
            warn!(
                declared = self.length,
                actual = len,
                "BFRES length field does not match the buffer size"
            );
        }

        let check = |field: String, position: usize, relative: i32| -> Result<()> {
            if relative == 0 {
                return Ok(());
            }
            let absolute = position as i64 + relative as i64;
            if absolute < 0 || absolute >= len as i64 {
                return Err(Error::OffsetOutOfBounds {
                    field,
                    offset: absolute,
                    len,
                });
            }
            Ok(())
        };

        check(
            "file name offset".into(),
            Self::FILE_NAME_OFFSET_POSITION,
            self.file_name_offset,
        )?;
        check(
            "string table offset".into(),
            Self::STRING_TABLE_OFFSET_POSITION,
            self.string_table_offset,
        )?;
        for kind in GroupKind::ALL {
            check(
                format!("{kind} group offset"),
                Self::group_offset_position(kind),
                self.group_offsets[kind.index()],
            )?;
        }
        Ok(())
    }

    /// Write the header in place at the start of `data`, in its own byte order.
    ///
    /// Only the header bytes are touched; offsets are written back verbatim.
    pub fn write(&self, data: &mut [u8]) -> Result<()> {
        self.write_to(&mut BinaryWriter::new(data))
    }

    /// Serialize the header at the writer's position.
    pub fn write_to(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        writer.set_endian(self.endian);
        writer.write_bytes(&self.magic)?;
        writer.write_u32(self.version)?;
        writer.write_bytes(&self.endian.bom())?;
        writer.write_u16(self.header_length)?;
        writer.write_u32(self.length)?;
        writer.write_u32(self.alignment)?;
        writer.write_i32(self.file_name_offset)?;
        writer.write_i32(self.string_table_length)?;
        writer.write_i32(self.string_table_offset)?;
        for offset in self.group_offsets {
            writer.write_i32(offset)?;
        }
        for count in self.group_counts {
            writer.write_u16(count)?;
        }
        writer.write_u32(self.user_pointer)?;
        Ok(())
    }

    /// Serialize the header into a new buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; Self::SIZE];
        self.write(&mut bytes)?;
        Ok(bytes)
    }

    /// Version as `(major, minor, micro, build)`.
    pub fn version_parts(&self) -> (u8, u8, u8, u8) {
        let [a, b, c, d] = self.version.to_be_bytes();
        (a, b, c, d)
    }

    /// Position of the offset field of a group.
    pub const fn group_offset_position(kind: GroupKind) -> usize {
        Self::GROUP_OFFSETS_POSITION + kind.index() * 4
    }

    /// Absolute offset of a group's dictionary, `None` when the group is absent.
    pub fn group_offset(&self, kind: GroupKind) -> Option<usize> {
        resolve(
            Self::group_offset_position(kind),
            self.group_offsets[kind.index()],
        )
    }

    /// Number of entries the header declares for a group.
    pub fn group_count(&self, kind: GroupKind) -> u16 {
        self.group_counts[kind.index()]
    }

    /// Absolute offset of the archive name.
    pub fn file_name_position(&self) -> Option<usize> {
        resolve(Self::FILE_NAME_OFFSET_POSITION, self.file_name_offset)
    }

    /// Absolute offset of the string table.
    pub fn string_table_position(&self) -> Option<usize> {
        resolve(Self::STRING_TABLE_OFFSET_POSITION, self.string_table_offset)
    }
}

fn resolve(position: usize, relative: i32) -> Option<usize> {
    if relative == 0 {
        return None;
    }
    usize::try_from(position as i64 + relative as i64).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_header() -> BfresHeader {
        let mut group_offsets = [0; GROUP_COUNT];
        let mut group_counts = [0; GROUP_COUNT];
        // Dictionaries at 0x80 and 0xC0.
        group_offsets[0] = 0x80 - 0x20;
        group_counts[0] = 1;
        group_offsets[1] = 0xC0 - 0x24;
        group_counts[1] = 2;

        BfresHeader {
            magic: *b"FRES",
            version: 0x0304_0004,
            endian: Endian::Big,
            header_length: 0x10,
            length: 0x100,
            alignment: 0x2000,
            file_name_offset: 0xF0 - 0x14,
            string_table_length: 0x20,
            string_table_offset: 0xE0 - 0x1C,
            group_offsets,
            group_counts,
            user_pointer: 0,
        }
    }

    fn sample_bytes(header: &BfresHeader) -> Vec<u8> {
        let mut data = vec![0u8; 0x100];
        header.write(&mut data).unwrap();
        data
    }

    #[test]
    fn test_round_trip_both_orders() {
        for endian in [Endian::Big, Endian::Little] {
            let header = BfresHeader {
                endian,
                ..sample_header()
            };
            let data = sample_bytes(&header);

            let parsed = BfresHeader::parse(&data).unwrap();
            assert_eq!(parsed, header);

            let mut rewritten = vec![0u8; 0x100];
            parsed.write(&mut rewritten).unwrap();
            assert_eq!(rewritten[..BfresHeader::SIZE], data[..BfresHeader::SIZE]);
            assert_eq!(parsed.to_bytes().unwrap(), data[..BfresHeader::SIZE]);
        }
    }

    #[test]
    fn test_big_endian_layout() {
        let data = sample_bytes(&sample_header());
        assert_eq!(&data[0..4], b"FRES");
        assert_eq!(&data[8..10], &[0xFE, 0xFF]);
        assert_eq!(&data[0x0C..0x10], &0x100u32.to_be_bytes());
        assert_eq!(&data[0x20..0x24], &0x60i32.to_be_bytes());
        assert_eq!(&data[0x50..0x52], &1u16.to_be_bytes());
    }

    #[test]
    fn test_resolved_offsets() {
        let header = sample_header();
        assert_eq!(header.group_offset(GroupKind::Model), Some(0x80));
        assert_eq!(header.group_offset(GroupKind::Texture), Some(0xC0));
        assert_eq!(header.group_offset(GroupKind::SkeletalAnim), None);
        assert_eq!(header.group_count(GroupKind::Texture), 2);
        assert_eq!(header.file_name_position(), Some(0xF0));
        assert_eq!(header.string_table_position(), Some(0xE0));
        assert_eq!(header.version_parts(), (3, 4, 0, 4));
    }

    #[test]
    fn test_bad_magic() {
        let mut data = sample_bytes(&sample_header());
        data[..4].copy_from_slice(b"SARC");
        assert!(matches!(
            BfresHeader::parse(&data),
            Err(Error::BadMagic { actual, .. }) if &actual == b"SARC"
        ));
    }

    #[test]
    fn test_bad_byte_order_mark() {
        let mut data = sample_bytes(&sample_header());
        data[8..10].copy_from_slice(&[0x12, 0x34]);
        assert!(matches!(
            BfresHeader::parse(&data),
            Err(Error::InvalidByteOrderMark([0x12, 0x34]))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let data = sample_bytes(&sample_header());
        let err = BfresHeader::parse(&data[..0x40]).unwrap_err();
        assert!(err.is_out_of_bounds());
    }

    #[test]
    fn test_offset_past_end() {
        let mut header = sample_header();
        header.group_offsets[1] = 0x1000;
        let data = sample_bytes(&header);
        assert!(matches!(
            BfresHeader::parse(&data),
            Err(Error::OffsetOutOfBounds { offset, .. }) if offset == 0x1024
        ));
    }
}
