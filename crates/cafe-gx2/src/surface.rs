//! GX2 surface layout and the untiling contract.

use tracing::debug;

use crate::{Error, FormatDescriptor, Result};

/// GX2 surface dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u32)]
pub enum SurfaceDim {
    Dim1D = 0,
    Dim2D = 1,
    Dim3D = 2,
    Cube = 3,
    Dim1DArray = 4,
    Dim2DArray = 5,
    Dim2DMsaa = 6,
    Dim2DMsaaArray = 7,
}

impl TryFrom<u32> for SurfaceDim {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Ok(match value {
            0 => Self::Dim1D,
            1 => Self::Dim2D,
            2 => Self::Dim3D,
            3 => Self::Cube,
            4 => Self::Dim1DArray,
            5 => Self::Dim2DArray,
            6 => Self::Dim2DMsaa,
            7 => Self::Dim2DMsaaArray,
            other => return Err(Error::UnknownDim(other)),
        })
    }
}

/// GX2 tile modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u32)]
pub enum TileMode {
    Default = 0,
    LinearAligned = 1,
    Tiled1DThin1 = 2,
    Tiled1DThick = 3,
    Tiled2DThin1 = 4,
    Tiled2DThin2 = 5,
    Tiled2DThin4 = 6,
    Tiled2DThick = 7,
    Tiled2BThin1 = 8,
    Tiled2BThin2 = 9,
    Tiled2BThin4 = 10,
    Tiled2BThick = 11,
    Tiled3DThin1 = 12,
    Tiled3DThick = 13,
    Tiled3BThin1 = 14,
    Tiled3BThick = 15,
    LinearSpecial = 16,
}

impl TileMode {
    /// Whether surface rows are stored in plain scan order.
    pub const fn is_linear(self) -> bool {
        matches!(self, TileMode::LinearAligned | TileMode::LinearSpecial)
    }
}

impl TryFrom<u32> for TileMode {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        use TileMode::*;
        const MODES: [TileMode; 17] = [
            Default,
            LinearAligned,
            Tiled1DThin1,
            Tiled1DThick,
            Tiled2DThin1,
            Tiled2DThin2,
            Tiled2DThin4,
            Tiled2DThick,
            Tiled2BThin1,
            Tiled2BThin2,
            Tiled2BThin4,
            Tiled2BThick,
            Tiled3DThin1,
            Tiled3DThick,
            Tiled3BThin1,
            Tiled3BThick,
            LinearSpecial,
        ];
        MODES
            .get(value as usize)
            .copied()
            .ok_or(Error::UnknownTileMode(value))
    }
}

/// Layout of one GX2 surface.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SurfaceInfo {
    pub dim: SurfaceDim,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mip_count: u32,
    pub format: &'static FormatDescriptor,
    pub tile_mode: TileMode,
    pub swizzle: u32,
    pub alignment: u32,
    /// Row pitch of the base level, in storage elements.
    pub pitch: u32,
    /// GX2 mip offsets: entry `n` locates level `n + 1` inside the mip data.
    /// Level 1 always starts at the beginning of the mip data.
    pub mip_offsets: [u32; 13],
}

impl SurfaceInfo {
    /// Most levels a surface can carry: the base level plus one per mip offset.
    pub const MAX_MIP_COUNT: u32 = 14;

    /// Reject layouts whose levels cannot be located.
    pub fn validate(&self) -> Result<()> {
        if self.mip_count > Self::MAX_MIP_COUNT {
            return Err(Error::InvalidMipCount {
                count: self.mip_count,
                max: Self::MAX_MIP_COUNT,
            });
        }
        Ok(())
    }

    /// Number of depth slices (or cube faces / array layers) stored per level.
    pub fn slices(&self) -> u32 {
        self.depth.max(1)
    }

    /// Offset of mip `level` (>= 1) inside the mip data.
    pub fn mip_offset(&self, level: u32) -> Option<usize> {
        match level {
            0 | 1 => Some(0),
            n => self.mip_offsets.get((n - 1) as usize).map(|&offset| offset as usize),
        }
    }

    fn overflow(&self) -> Error {
        Error::SizeOverflow {
            width: self.width,
            height: self.height,
        }
    }

    /// Size in bytes of all levels in linear scan order.
    pub fn linear_size(&self) -> Result<usize> {
        let mut total = 0usize;
        for level in 0..self.mip_count.max(1) {
            let size = self.format.mip_level_size(self.width, self.height, level)?;
            total = total.checked_add(size).ok_or_else(|| self.overflow())?;
        }
        total
            .checked_mul(self.slices() as usize)
            .ok_or_else(|| self.overflow())
    }
}

/// Converts GPU-native surface bytes into linear scan order.
///
/// `image` holds the base level and `mipmaps` the remaining levels, both
/// exactly as stored in the archive. The result holds every level
/// (`surface.mip_count` of them) back to back, each level in row-major
/// order of storage elements, slices of a level adjacent.
pub trait Untiler {
    fn untile(&self, surface: &SurfaceInfo, image: &[u8], mipmaps: &[u8]) -> Result<Vec<u8>>;
}

/// Untiler for linear surfaces: drops the row padding implied by the pitch.
///
/// Tiled surfaces are rejected with [`Error::UnsupportedTileMode`]; their
/// address swizzling is handled by a dedicated untiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearCopy;

impl Untiler for LinearCopy {
    fn untile(&self, surface: &SurfaceInfo, image: &[u8], mipmaps: &[u8]) -> Result<Vec<u8>> {
        if !surface.tile_mode.is_linear() {
            return Err(Error::UnsupportedTileMode(surface.tile_mode));
        }
        surface.validate()?;

        let format = surface.format;
        let element = format.bytes_per_element() as usize;
        let slices = surface.slices() as usize;

        // Every level is checked against its data before anything is allocated.
        let mut levels = Vec::with_capacity(surface.mip_count.max(1) as usize);
        let mut total = 0usize;
        for level in 0..surface.mip_count.max(1) {
            let width = (surface.width >> level).max(1);
            let height = (surface.height >> level).max(1);
            let (columns, rows) = format.element_extent(width, height);
            let pitch = (surface.pitch >> level).max(columns) as usize;

            let row_bytes = (columns as usize)
                .checked_mul(element)
                .ok_or_else(|| surface.overflow())?;
            let stride = pitch.checked_mul(element).ok_or_else(|| surface.overflow())?;
            let row_count = (rows as usize)
                .checked_mul(slices)
                .ok_or_else(|| surface.overflow())?;
            let level_bytes = stride
                .checked_mul(row_count)
                .ok_or_else(|| surface.overflow())?;

            let source = if level == 0 {
                image
            } else {
                surface
                    .mip_offset(level)
                    .and_then(|offset| mipmaps.get(offset..))
                    .unwrap_or(&[])
            };
            // The last row of the level needs no trailing padding.
            let needed = level_bytes - (stride - row_bytes);
            if source.len() < needed {
                return Err(Error::DataTooShort {
                    level,
                    needed,
                    available: source.len(),
                });
            }

            total = total
                .checked_add(row_bytes * row_count)
                .ok_or_else(|| surface.overflow())?;
            debug!(level, width, height, pitch, "copying linear level");
            levels.push((source, row_bytes, stride, row_count));
        }

        let mut output = Vec::with_capacity(total);
        for (source, row_bytes, stride, row_count) in levels {
            for row in 0..row_count {
                let start = row * stride;
                output.extend_from_slice(&source[start..start + row_bytes]);
            }
        }
        Ok(output)
    }
}

/// Passes surface bytes through unchanged: the base level followed by the mip data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl Untiler for Verbatim {
    fn untile(&self, _surface: &SurfaceInfo, image: &[u8], mipmaps: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(image.len() + mipmaps.len());
        output.extend_from_slice(image);
        output.extend_from_slice(mipmaps);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SurfaceFormat;

    fn surface(format: SurfaceFormat, tile_mode: TileMode, pitch: u32, mip_count: u32) -> SurfaceInfo {
        SurfaceInfo {
            dim: SurfaceDim::Dim2D,
            width: 4,
            height: 2,
            depth: 1,
            mip_count,
            format: format.descriptor(),
            tile_mode,
            swizzle: 0,
            alignment: 0x100,
            pitch,
            mip_offsets: [0; 13],
        }
    }

    #[test]
    fn test_tile_mode_conversion() {
        assert_eq!(TileMode::try_from(4).unwrap(), TileMode::Tiled2DThin1);
        assert_eq!(TileMode::try_from(16).unwrap(), TileMode::LinearSpecial);
        assert!(matches!(TileMode::try_from(17), Err(Error::UnknownTileMode(17))));
        assert!(TileMode::LinearAligned.is_linear());
        assert!(!TileMode::Default.is_linear());
    }

    #[test]
    fn test_linear_copy_drops_row_padding() {
        // R8: 4 pixels per row, padded to a pitch of 8.
        let info = surface(SurfaceFormat::UnormR8, TileMode::LinearAligned, 8, 1);
        let image = [1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8];

        let linear = LinearCopy.untile(&info, &image, &[]).unwrap();
        assert_eq!(linear, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_linear_copy_reads_mip_levels() {
        // Level 0 is 4x2, level 1 is 2x1.
        let info = surface(SurfaceFormat::UnormR8, TileMode::LinearAligned, 4, 2);
        let image = [1, 2, 3, 4, 5, 6, 7, 8];
        let mipmaps = [9, 10];

        let linear = LinearCopy.untile(&info, &image, &mipmaps).unwrap();
        assert_eq!(linear, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(linear.len(), info.linear_size().unwrap());
    }

    #[test]
    fn test_mip_count_beyond_offsets_rejected() {
        let mut info = surface(SurfaceFormat::UnormR8, TileMode::LinearAligned, 4, 14);
        assert!(info.validate().is_ok());
        assert_eq!(info.mip_offset(14), None);

        info.mip_count = 15;
        assert!(matches!(
            LinearCopy.untile(&info, &[0; 8], &[]),
            Err(Error::InvalidMipCount { count: 15, max: 14 })
        ));
    }

    #[test]
    fn test_huge_depth_fails_before_allocating() {
        let mut info = surface(SurfaceFormat::UnormR8G8B8A8, TileMode::LinearAligned, 4, 1);
        info.depth = u32::MAX;
        assert!(matches!(
            LinearCopy.untile(&info, &[0; 64], &[]),
            Err(Error::DataTooShort { level: 0, available: 64, .. })
        ));
    }

    #[test]
    fn test_linear_copy_rejects_tiled_and_short_data() {
        let tiled = surface(SurfaceFormat::UnormR8, TileMode::Tiled2DThin1, 4, 1);
        assert!(matches!(
            LinearCopy.untile(&tiled, &[0; 8], &[]),
            Err(Error::UnsupportedTileMode(TileMode::Tiled2DThin1))
        ));

        let linear = surface(SurfaceFormat::UnormR8, TileMode::LinearAligned, 4, 1);
        assert!(matches!(
            LinearCopy.untile(&linear, &[0; 7], &[]),
            Err(Error::DataTooShort { level: 0, needed: 8, available: 7 })
        ));
    }

    #[test]
    fn test_verbatim_concatenates() {
        let tiled = surface(SurfaceFormat::UnormBc1, TileMode::Tiled2DThin1, 1, 2);
        let bytes = Verbatim.untile(&tiled, &[1, 2], &[3]).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
