//! BFRES archive parser for Wii U resources.
//!
//! A BFRES file bundles the models, textures and animations of one asset.
//! Its header points at up to twelve resource groups, each indexed by a
//! patricia-tree dictionary keyed by resource name.
//!
//! - [`BfresHeader`] - the 0x6C byte file header, readable and writable in place
//! - [`ResDict`] - the per-group name dictionaries
//! - [`Archive`] - a parsed snapshot: header, groups and sub-resource headers
//! - [`BfresFile`] - an owned, editable file session
//!
//! # Example
//!
//! ```no_run
//! use cafe_bfres::BfresFile;
//!
//! let file = BfresFile::open("Mario.bfres")?;
//! for (name, texture) in file.textures() {
//!     println!("{name}: {}x{}", texture.width, texture.height);
//! }
//! # Ok::<(), cafe_bfres::Error>(())
//! ```

pub mod dict;
mod archive;
mod error;
mod file;
mod header;
mod resource;

pub use archive::{Archive, Group};
pub use dict::{DictNode, ResDict};
pub use error::{Error, Result};
pub use file::BfresFile;
pub use header::{BfresHeader, GroupKind, GROUP_COUNT};
pub use resource::{EmbeddedFile, ModelHeader, ResourceNode, SubResource, TextureHeader};
