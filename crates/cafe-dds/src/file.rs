//! DDS file assembly and output.

use std::fs;
use std::path::Path;

use cafe_common::BinaryReader;
use tracing::debug;

use crate::header::DdsHeader;
use crate::{Error, Result, DDS_MAGIC};

/// Size of the magic plus header.
const PREAMBLE_SIZE: usize = 4 + DdsHeader::SIZE as usize;

/// A complete DDS file: header plus pixel payload in linear scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdsFile {
    pub header: DdsHeader,
    pub data: Vec<u8>,
}

impl DdsFile {
    /// Pair a header with its payload.
    pub fn new(header: DdsHeader, data: Vec<u8>) -> Self {
        Self { header, data }
    }

    /// Parse a DDS file from bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(bytes);
        let magic: [u8; 4] = reader.read_array()?;
        if &magic != DDS_MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let header = DdsHeader::read_from(&mut reader)?;
        Ok(Self {
            header,
            data: reader.remaining_bytes().to_vec(),
        })
    }

    /// Serialize magic, header and payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        to_bytes(&self.header, &self.data)
    }

    /// Write the file to `path`.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_file(path, &self.header, &self.data)
    }
}

fn to_bytes(header: &DdsHeader, data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(PREAMBLE_SIZE + data.len());
    output.extend_from_slice(DDS_MAGIC);
    output.extend_from_slice(&header.to_bytes());
    output.extend_from_slice(data);
    output
}

/// Write magic, `header` and `data` verbatim to `path`.
///
/// Any failure to create or write the destination is reported as
/// [`Error::WriteFailure`].
pub fn write_file<P: AsRef<Path>>(path: P, header: &DdsHeader, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    debug!(
        path = %path.display(),
        width = header.width,
        height = header.height,
        mips = header.mipmap_count,
        payload = data.len(),
        "writing DDS"
    );

    fs::write(path, to_bytes(header, data)).map_err(|source| Error::WriteFailure {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_gx2::SurfaceFormat;
    use pretty_assertions::assert_eq;

    fn sample() -> DdsFile {
        let format = SurfaceFormat::UnormR8G8B8A8.descriptor();
        let data = (0..format.surface_size(2, 2).unwrap() as u8).collect();
        DdsFile::new(DdsHeader::new(2, 2, 1, 1, format).unwrap(), data)
    }

    #[test]
    fn test_to_bytes_layout() {
        let file = sample();
        let bytes = file.to_bytes();

        assert_eq!(&bytes[..4], b"DDS ");
        assert_eq!(bytes.len(), 128 + 16);
        assert_eq!(&bytes[128..], file.data.as_slice());
        assert_eq!(DdsFile::parse(&bytes).unwrap(), file);
    }

    #[test]
    fn test_parse_rejects_bad_magic() {
        let mut bytes = sample().to_bytes();
        bytes[..4].copy_from_slice(b"XDS ");
        assert!(matches!(DdsFile::parse(&bytes), Err(Error::InvalidMagic(m)) if &m == b"XDS "));
        assert!(matches!(
            DdsFile::parse(b"DDS "),
            Err(Error::Common(e)) if e.is_out_of_bounds()
        ));
    }

    #[test]
    fn test_write_file() {
        let dir = std::env::temp_dir().join(format!("cafe-dds-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.dds");

        let file = sample();
        file.write_file(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), file.to_bytes());

        let missing = dir.join("missing").join("out.dds");
        assert!(matches!(
            file.write_file(&missing),
            Err(Error::WriteFailure { path, .. }) if path == missing
        ));

        fs::remove_dir_all(&dir).unwrap();
    }
}
