//! Cafe - Wii U BFRES archive and GX2 texture library.
//!
//! This crate provides a unified interface to the Cafe crates and the
//! texture export pipeline built on top of them.
//!
//! # Crates
//!
//! - [`cafe_common`] - Endian-aware binary reading and writing
//! - [`cafe_gx2`] - GX2 surface formats and the untiling contract
//! - [`cafe_dds`] - DDS header synthesis and file output
//! - [`cafe_bfres`] - BFRES archive parsing and header editing
//!
//! # Example
//!
//! ```no_run
//! use cafe::prelude::*;
//!
//! let file = BfresFile::open("Mario.bfres")?;
//! for (name, _) in file.textures() {
//!     export_texture(&file, name, format!("{name}.dds"), &LinearCopy)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod export;

pub use cafe_bfres as bfres;
pub use cafe_common as common;
pub use cafe_dds as dds;
pub use cafe_gx2 as gx2;

pub use export::{export_texture, texture_to_dds, ExportError};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::export::{export_texture, texture_to_dds, ExportError};
    pub use cafe_bfres::{Archive, BfresFile, BfresHeader, GroupKind, ResDict, TextureHeader};
    pub use cafe_common::{BinaryReader, BinaryWriter, Endian};
    pub use cafe_dds::{DdsFile, DdsHeader};
    pub use cafe_gx2::{FormatDescriptor, LinearCopy, SurfaceFormat, Untiler, Verbatim};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
