//! Resource dictionaries.
//!
//! Every resource group in a BFRES file is indexed by a dictionary: a
//! patricia tree over the resource names, stored as a flat array of 16 byte
//! nodes that link to each other by index.
//!
//! ```text
//! [0x00] Total size in bytes                (u32)
//! [0x04] Entry count, root excluded         (i32)
//! [0x08] Nodes, root first, 0x10 bytes each:
//!        Reference bit                      (u32)
//!        Left child index                   (u16)
//!        Right child index                  (u16)
//!        Name pointer  (rel, 0 for root)    (i32)
//!        Data pointer  (rel, 0 for root)    (i32)
//! ```
//!
//! A reference bit `r` selects character `len - 1 - (r >> 3)` of a name,
//! counting from its end, and bit `r & 7` of that character; characters
//! before the start of the name read as zero. Reference bits strictly
//! decrease along every downward path starting at the root, whose own
//! reference is `0xFFFFFFFF`. A link that does not decrease the reference
//! is a back link to the node holding the candidate name.

use std::sync::Arc;

use cafe_common::{BinaryReader, BinaryWriter};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Size of one serialized node.
const NODE_SIZE: usize = 0x10;

/// Size of the dictionary preamble.
const PREAMBLE_SIZE: usize = 0x08;

/// Reference bit of the root sentinel.
const ROOT_REFERENCE: u32 = u32::MAX;

/// One node of a dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictNode {
    /// Bit of the name tested at this node.
    pub reference: u32,
    /// Child index followed when the tested bit is 0.
    pub left: u16,
    /// Child index followed when the tested bit is 1.
    pub right: u16,
    /// Resource name (empty for the root).
    pub key: Arc<str>,
    /// Absolute offset of the name characters.
    pub name_offset: Option<usize>,
    /// Absolute offset of the resource.
    pub data_offset: Option<usize>,
}

impl DictNode {
    fn root() -> Self {
        Self {
            reference: ROOT_REFERENCE,
            left: 0,
            right: 0,
            key: Arc::from(""),
            name_offset: None,
            data_offset: None,
        }
    }

    #[inline]
    fn child(&self, key: &[u8]) -> usize {
        if bit(key, self.reference) {
            self.right as usize
        } else {
            self.left as usize
        }
    }
}

/// Bit `reference` of `key`, counted from the last character.
#[inline]
fn bit(key: &[u8], reference: u32) -> bool {
    let char_index = (reference >> 3) as usize;
    if char_index >= key.len() {
        return false;
    }
    (key[key.len() - 1 - char_index] >> (reference & 7)) & 1 == 1
}

/// Highest reference bit at which `a` and `b` differ.
fn first_difference(a: &[u8], b: &[u8]) -> Option<u32> {
    let char_at = |key: &[u8], index: usize| {
        if index < key.len() {
            key[key.len() - 1 - index]
        } else {
            0
        }
    };

    (0..a.len().max(b.len())).rev().find_map(|index| {
        let diff = char_at(a, index) ^ char_at(b, index);
        (diff != 0).then(|| ((index as u32) << 3) | (7 - diff.leading_zeros()))
    })
}

/// Read a relative pointer that must land inside the buffer.
fn read_pointer(r: &mut BinaryReader<'_>, field: impl FnOnce() -> String) -> Result<Option<usize>> {
    let position = r.position();
    let relative = r.read_i32()?;
    if relative == 0 {
        return Ok(None);
    }
    let target = position as i64 + relative as i64;
    if target < 0 || target >= r.len() as i64 {
        return Err(Error::OffsetOutOfBounds {
            field: field(),
            offset: target,
            len: r.len(),
        });
    }
    Ok(Some(target as usize))
}

/// A parsed or built resource dictionary.
///
/// Nodes live in one arena; index 0 is the root sentinel and entries
/// `1..=len()` are the resources in storage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResDict {
    nodes: Vec<DictNode>,
}

impl Default for ResDict {
    fn default() -> Self {
        Self {
            nodes: vec![DictNode::root()],
        }
    }
}

impl ResDict {
    /// Parse the dictionary at `offset`.
    ///
    /// The reader's byte order must already be pinned. The reader position is
    /// left unchanged.
    pub fn parse(reader: &mut BinaryReader<'_>, offset: usize) -> Result<Self> {
        let nodes = reader.at(offset, |r| -> Result<Vec<DictNode>> {
            let _size = r.read_u32()?;
            let declared = r.read_i32()?;
            if declared < 0 {
                warn!(offset, declared, "negative dictionary entry count, reading no entries");
            }
            let count = declared.max(0) as usize;
            // Bound the allocation by what the buffer can actually hold.
            let capacity = (count + 1).min(r.remaining() / NODE_SIZE);
            let mut nodes = Vec::with_capacity(capacity);

            for index in 0..=count {
                let reference = r.read_u32()?;
                let left = r.read_u16()?;
                let right = r.read_u16()?;
                let name_offset = read_pointer(r, || format!("dictionary entry {index} name"))?;
                let data_offset = read_pointer(r, || format!("dictionary entry {index} data"))?;
                let key: Arc<str> = match name_offset {
                    Some(position) => Arc::from(r.read_string_at(position)?),
                    None => Arc::from(""),
                };
                nodes.push(DictNode {
                    reference,
                    left,
                    right,
                    key,
                    name_offset,
                    data_offset,
                });
            }
            Ok(nodes)
        })?;

        let dict = Self { nodes };
        dict.validate()?;
        debug!(offset, entries = dict.len(), "parsed dictionary");
        Ok(dict)
    }

    fn validate(&self) -> Result<()> {
        let count = self.nodes.len();
        let mut seen = FxHashSet::default();

        for (index, node) in self.nodes.iter().enumerate() {
            for child in [node.left, node.right] {
                if child as usize >= count {
                    return Err(Error::NodeIndexOutOfBounds {
                        index: child,
                        count,
                    });
                }
            }
            if index > 0 && !seen.insert(node.key.clone()) {
                return Err(Error::DuplicateKey(node.key.to_string()));
            }
        }

        for (index, node) in self.iter() {
            if self.find(&node.key) != Some(index) {
                warn!(key = %node.key, index, "dictionary entry is unreachable by name");
            }
        }
        Ok(())
    }

    /// Build a dictionary over `keys`, in order.
    ///
    /// Name and data offsets are left unset; see [`ResDict::set_offsets`].
    /// Fails with [`Error::DuplicateKey`] when a key repeats. The empty
    /// name is reserved for the root and is rejected the same way.
    pub fn from_keys<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        let mut dict = Self::default();
        for key in keys {
            dict.insert(key.into())?;
        }
        Ok(dict)
    }

    fn insert(&mut self, key: Arc<str>) -> Result<()> {
        let bytes = key.as_bytes();

        let closest = self.walk(bytes);
        let reference = first_difference(bytes, self.nodes[closest].key.as_bytes())
            .ok_or_else(|| Error::DuplicateKey(key.to_string()))?;

        let mut parent = 0;
        let mut child = self.nodes[0].child(bytes);
        while self.nodes[parent].reference > self.nodes[child].reference
            && self.nodes[child].reference > reference
        {
            parent = child;
            child = self.nodes[child].child(bytes);
        }

        let index = u16::try_from(self.nodes.len()).map_err(|_| Error::NodeIndexOutOfBounds {
            index: u16::MAX,
            count: self.nodes.len(),
        })?;
        let (left, right) = if bit(bytes, reference) {
            (child as u16, index)
        } else {
            (index, child as u16)
        };
        let parent_goes_right = bit(bytes, self.nodes[parent].reference);
        self.nodes.push(DictNode {
            reference,
            left,
            right,
            key,
            name_offset: None,
            data_offset: None,
        });

        let parent = &mut self.nodes[parent];
        if parent_goes_right {
            parent.right = index;
        } else {
            parent.left = index;
        }
        Ok(())
    }

    /// Follow `key` down the tree to the node whose name it has to match.
    fn walk(&self, key: &[u8]) -> usize {
        let mut parent = 0;
        let mut child = self.nodes[0].child(key);
        while self.nodes[parent].reference > self.nodes[child].reference {
            parent = child;
            child = self.nodes[child].child(key);
        }
        child
    }

    /// Index of the entry named `key`.
    pub fn find(&self, key: &str) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let index = self.walk(key.as_bytes());
        (index != 0 && &*self.nodes[index].key == key).then_some(index)
    }

    /// The entry named `key`.
    pub fn lookup(&self, key: &str) -> Option<&DictNode> {
        self.find(key).map(|index| &self.nodes[index])
    }

    /// Number of entries, root excluded.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the dictionary has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All nodes, root first.
    #[inline]
    pub fn nodes(&self) -> &[DictNode] {
        &self.nodes
    }

    /// Node at `index` (0 is the root).
    #[inline]
    pub fn get(&self, index: usize) -> Option<&DictNode> {
        self.nodes.get(index)
    }

    /// Entries with their indices, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &DictNode)> + '_ {
        self.nodes.iter().enumerate().skip(1)
    }

    /// Entry names in storage order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(_, node)| &*node.key)
    }

    /// Point entry `index` at its name characters and resource.
    pub fn set_offsets(&mut self, index: usize, name_offset: usize, data_offset: usize) {
        if let Some(node) = self.nodes.get_mut(index).filter(|_| index > 0) {
            node.name_offset = Some(name_offset);
            node.data_offset = Some(data_offset);
        }
    }

    /// Serialized size in bytes.
    pub fn byte_size(&self) -> usize {
        PREAMBLE_SIZE + self.nodes.len() * NODE_SIZE
    }

    /// Serialize the dictionary at the writer's position.
    ///
    /// Pointers are written relative to their fields; unset offsets are
    /// written as 0.
    pub fn write(&self, writer: &mut BinaryWriter<'_>) -> Result<()> {
        let relative = |field: usize, target: Option<usize>| -> i32 {
            target.map_or(0, |target| (target as i64 - field as i64) as i32)
        };

        writer.write_u32(self.byte_size() as u32)?;
        writer.write_i32(self.len() as i32)?;
        for node in &self.nodes {
            writer.write_u32(node.reference)?;
            writer.write_u16(node.left)?;
            writer.write_u16(node.right)?;
            let field = writer.position();
            writer.write_i32(relative(field, node.name_offset))?;
            writer.write_i32(relative(field + 4, node.data_offset))?;
        }
        Ok(())
    }
}
