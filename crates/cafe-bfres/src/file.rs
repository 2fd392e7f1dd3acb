//! Editable BFRES session.

use std::fs;
use std::path::Path;

use cafe_common::Endian;
use tracing::{debug, info, instrument};

use crate::archive::Archive;
use crate::header::BfresHeader;
use crate::resource::{ModelHeader, TextureHeader};
use crate::{Error, Result};

/// An opened BFRES file: the owned bytes plus the archive parsed from them.
///
/// The archive always reflects the current bytes. Edits go through
/// [`BfresFile::set_header`], which only commits when the edited bytes
/// still parse.
#[derive(Debug, Clone)]
pub struct BfresFile {
    data: Vec<u8>,
    archive: Archive,
}

impl BfresFile {
    /// Read and parse the file at `path`. The file stem is the name hint.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| Error::ReadFailure {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();
        Self::from_bytes(&name, data)
    }

    /// Parse `data`, taking ownership of it.
    pub fn from_bytes(name: &str, data: Vec<u8>) -> Result<Self> {
        let archive = Archive::parse(name, &data)?;
        info!(
            name = archive.name(),
            groups = archive.groups().len(),
            "opened BFRES archive"
        );
        Ok(Self { data, archive })
    }

    pub fn name(&self) -> &str {
        self.archive.name()
    }

    pub fn header(&self) -> &BfresHeader {
        self.archive.header()
    }

    /// Replace the header.
    ///
    /// The header is written over the first bytes of a copy of the file and
    /// the copy is parsed again. On failure the session is left untouched.
    pub fn set_header(&mut self, header: BfresHeader) -> Result<()> {
        let mut data = self.data.clone();
        header.write(&mut data)?;
        let archive = Archive::parse(self.archive.name(), &data)?;

        debug!(
            endian = %header.endian,
            alignment = header.alignment,
            length = header.length,
            "header updated"
        );
        self.data = data;
        self.archive = archive;
        Ok(())
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Current file bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn models(&self) -> impl Iterator<Item = (&str, &ModelHeader)> + '_ {
        self.archive.models()
    }

    pub fn textures(&self) -> impl Iterator<Item = (&str, &TextureHeader)> + '_ {
        self.archive.textures()
    }

    pub fn endian_names(&self) -> &'static [(Endian, &'static str)] {
        Archive::endian_names()
    }

    /// Write the current bytes to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, &self.data).map_err(|source| Error::WriteFailure {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = self.data.len(), "saved BFRES archive");
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
