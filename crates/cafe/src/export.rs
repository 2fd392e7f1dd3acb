//! FTEX to DDS export.

use std::path::Path;

use cafe_bfres::{BfresFile, TextureHeader};
use cafe_dds::{DdsFile, DdsHeader};
use cafe_gx2::Untiler;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while exporting a texture.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0}")]
    Bfres(#[from] cafe_bfres::Error),

    #[error("{0}")]
    Gx2(#[from] cafe_gx2::Error),

    #[error("{0}")]
    Dds(#[from] cafe_dds::Error),
}

/// Convert a texture of the archive in `data` into a DDS file.
///
/// The pixel payload is whatever `untiler` produces from the stored image
/// and mipmap data; the header is synthesized from the texture's format.
pub fn texture_to_dds(
    data: &[u8],
    texture: &TextureHeader,
    untiler: &dyn Untiler,
) -> Result<DdsFile, ExportError> {
    let surface = texture.surface_info()?;
    let image = texture.image_data(data)?;
    let mipmaps = texture.mipmap_data(data)?;

    let payload = untiler.untile(&surface, image, mipmaps)?;
    debug!(
        format = surface.format.name,
        tile_mode = ?surface.tile_mode,
        stored = image.len() + mipmaps.len(),
        payload = payload.len(),
        "converted surface"
    );

    let header = DdsHeader::new(
        surface.width,
        surface.height,
        surface.depth,
        surface.mip_count,
        surface.format,
    )?;
    Ok(DdsFile::new(header, payload))
}

/// Export texture `name` of `file` to a DDS file at `path`.
pub fn export_texture<P: AsRef<Path>>(
    file: &BfresFile,
    name: &str,
    path: P,
    untiler: &dyn Untiler,
) -> Result<(), ExportError> {
    let texture = file.archive().texture(name)?;
    texture_to_dds(file.data(), texture, untiler)?.write_file(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_bfres::BfresHeader;
    use cafe_common::Endian;
    use cafe_dds::flags;
    use cafe_gx2::{LinearCopy, SurfaceFormat, TileMode, Verbatim};
    use pretty_assertions::assert_eq;

    /// Texture whose image starts at 0 and whose mipmaps follow it.
    fn texture(
        format: SurfaceFormat,
        tile_mode: TileMode,
        size: (u32, u32),
        pitch: u32,
    ) -> TextureHeader {
        TextureHeader {
            dim: 1,
            width: size.0,
            height: size.1,
            depth: 1,
            mip_count: 1,
            format: format.id(),
            aa_mode: 0,
            usage: 1,
            image_size: 0,
            image_pointer: 0,
            mipmap_size: 0,
            mipmap_pointer: 0,
            tile_mode: tile_mode as u32,
            swizzle: 0,
            alignment: 0x200,
            pitch,
            mip_offsets: [0; 13],
            view_first_mip: 0,
            view_mip_count: 1,
            view_first_slice: 0,
            view_slice_count: 1,
            component_selector: [0, 1, 2, 3],
            registers: [0; 5],
            handle: 0,
            array_length: 1,
            name_offset: None,
            path_offset: None,
            data_offset: Some(0),
            mipmap_offset: None,
            user_data_dict_offset: None,
            user_data_count: 0,
        }
    }

    #[test]
    fn test_linear_texture() {
        // 2x2 RGBA stored with a pitch of 4 pixels.
        let mut header = texture(SurfaceFormat::UnormR8G8B8A8, TileMode::LinearAligned, (2, 2), 4);
        header.image_size = 32;
        let data: Vec<u8> = (0..32).collect();

        let dds = texture_to_dds(&data, &header, &LinearCopy).unwrap();
        let expected: Vec<u8> = (0..8).chain(16..24).collect();
        assert_eq!(dds.data, expected);
        assert_eq!(dds.header.pitch_or_linear_size, 8);
        assert_eq!(dds.header.flags & flags::DDSD_PITCH, flags::DDSD_PITCH);
        assert_eq!(dds.header.mipmap_count, 1);
    }

    #[test]
    fn test_tiled_texture_verbatim() {
        let mut header = texture(SurfaceFormat::UnormBc1, TileMode::Tiled2DThin1, (8, 8), 8);
        header.mip_count = 2;
        header.image_size = 32;
        header.mipmap_size = 8;
        header.mipmap_offset = Some(32);
        let data = vec![0xAB; 40];

        let dds = texture_to_dds(&data, &header, &Verbatim).unwrap();
        assert_eq!(dds.data.len(), 40);
        assert_eq!(dds.header.pitch_or_linear_size, 32);
        let mipmapped = flags::DDSCAPS_COMPLEX | flags::DDSCAPS_MIPMAP;
        assert_eq!(dds.header.caps & mipmapped, mipmapped);

        assert!(matches!(
            texture_to_dds(&data, &header, &LinearCopy),
            Err(ExportError::Gx2(cafe_gx2::Error::UnsupportedTileMode(TileMode::Tiled2DThin1)))
        ));
    }

    #[test]
    fn test_mip_count_past_offset_table() {
        let mut header = texture(SurfaceFormat::UnormR8G8B8A8, TileMode::LinearAligned, (1, 1), 1);
        header.mip_count = 15;
        header.image_size = 8;
        for untiler in [&LinearCopy as &dyn Untiler, &Verbatim] {
            assert!(matches!(
                texture_to_dds(&[0; 8], &header, untiler),
                Err(ExportError::Gx2(cafe_gx2::Error::InvalidMipCount { count: 15, .. }))
            ));
        }
    }

    #[test]
    fn test_declared_width_beyond_header_range() {
        let mut header = texture(SurfaceFormat::UnormR8G8B8A8, TileMode::LinearAligned, (1, 1), 1);
        header.image_size = 8;

        header.width = 0x1000_0000;
        let dds = texture_to_dds(&[0; 8], &header, &Verbatim).unwrap();
        assert_eq!(dds.header.pitch_or_linear_size, 0x4000_0000);
        assert_eq!(dds.data, vec![0; 8]);

        header.width = 0x4000_0000;
        assert!(matches!(
            texture_to_dds(&[0; 8], &header, &Verbatim),
            Err(ExportError::Dds(cafe_dds::Error::Gx2(
                cafe_gx2::Error::SizeOverflow { width: 0x4000_0000, .. }
            )))
        ));
        assert!(matches!(
            texture_to_dds(&[0; 8], &header, &LinearCopy),
            Err(ExportError::Gx2(cafe_gx2::Error::DataTooShort { level: 0, .. }))
        ));
    }

    #[test]
    fn test_unknown_format() {
        let mut header = texture(SurfaceFormat::UnormR8, TileMode::LinearAligned, (1, 1), 1);
        header.format = 0x99;
        assert!(matches!(
            texture_to_dds(&[0], &header, &Verbatim),
            Err(ExportError::Gx2(cafe_gx2::Error::UnknownFormat(0x99)))
        ));
    }

    #[test]
    fn test_missing_texture() {
        let header = BfresHeader {
            magic: *BfresHeader::MAGIC,
            version: 0x0304_0004,
            endian: Endian::Big,
            header_length: 0x10,
            length: BfresHeader::SIZE as u32,
            alignment: 0x2000,
            file_name_offset: 0,
            string_table_length: 0,
            string_table_offset: 0,
            group_offsets: [0; 12],
            group_counts: [0; 12],
            user_pointer: 0,
        };
        let file = BfresFile::from_bytes("empty", header.to_bytes().unwrap()).unwrap();
        let path = std::env::temp_dir().join("cafe-missing-texture.dds");

        assert!(matches!(
            export_texture(&file, "Mario_Alb", &path, &LinearCopy),
            Err(ExportError::Bfres(cafe_bfres::Error::NotFound(name))) if name == "Mario_Alb"
        ));
        assert!(!path.exists());
    }
}
