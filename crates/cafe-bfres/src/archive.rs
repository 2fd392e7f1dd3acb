//! Archive parsing: header, group dictionaries and sub-resource headers.

use std::sync::Arc;

use cafe_common::{BinaryReader, Endian};
use tracing::{debug, instrument, warn};

use crate::dict::ResDict;
use crate::header::{BfresHeader, GroupKind};
use crate::resource::{ModelHeader, ResourceNode, TextureHeader};
use crate::{Error, Result};

/// One resource group: its dictionary and the nodes it indexes, in
/// dictionary storage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub kind: GroupKind,
    pub dict: ResDict,
    pub nodes: Vec<ResourceNode>,
}

impl Group {
    /// Node named `name`, located through the dictionary.
    pub fn find(&self, name: &str) -> Option<&ResourceNode> {
        // Entry `n` of the dictionary is node `n - 1`.
        self.dict.find(name).and_then(|index| self.nodes.get(index - 1))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A parsed BFRES archive.
///
/// The archive is a snapshot of the buffer it was parsed from; it does not
/// borrow it. Slicing resource bodies needs the same buffer again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    name: Arc<str>,
    header: BfresHeader,
    groups: Vec<Group>,
}

impl Archive {
    /// Parse an archive.
    ///
    /// The name stored in the file wins over `name_hint`, which is used when
    /// the archive carries none. Any failure aborts the whole parse.
    #[instrument(skip(data), fields(len = data.len()))]
    pub fn parse(name_hint: &str, data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let header = BfresHeader::read_from(&mut reader)?;
        header.validate(data.len())?;

        let name: Arc<str> = match header.file_name_position() {
            Some(position) => Arc::from(reader.read_string_at(position)?),
            None => Arc::from(name_hint),
        };
        debug!(
            %name,
            endian = %header.endian,
            version = header.version,
            "parsed BFRES header"
        );

        let groups = read_groups(&mut reader, &header)?;
        Ok(Self {
            name,
            header,
            groups,
        })
    }

    pub fn header(&self) -> &BfresHeader {
        &self.header
    }

    /// Archive name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endian(&self) -> Endian {
        self.header.endian
    }

    /// Groups present in the file, in header slot order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, kind: GroupKind) -> Option<&Group> {
        self.groups.iter().find(|group| group.kind == kind)
    }

    /// FMDL nodes in dictionary order.
    pub fn models(&self) -> impl Iterator<Item = (&str, &ModelHeader)> + '_ {
        self.nodes(GroupKind::Model)
            .filter_map(|node| Some((&*node.name, node.as_model()?)))
    }

    /// FTEX nodes in dictionary order.
    pub fn textures(&self) -> impl Iterator<Item = (&str, &TextureHeader)> + '_ {
        self.nodes(GroupKind::Texture)
            .filter_map(|node| Some((&*node.name, node.as_texture()?)))
    }

    fn nodes(&self, kind: GroupKind) -> impl Iterator<Item = &ResourceNode> + '_ {
        self.group(kind).into_iter().flat_map(|group| group.nodes.iter())
    }

    /// Resource `name` in group `kind`.
    pub fn find(&self, kind: GroupKind, name: &str) -> Option<&ResourceNode> {
        self.group(kind)?.find(name)
    }

    /// Texture `name`, or [`Error::NotFound`].
    pub fn texture(&self, name: &str) -> Result<&TextureHeader> {
        self.find(GroupKind::Texture, name)
            .and_then(ResourceNode::as_texture)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Display labels of the byte orders an archive can be stored in.
    pub fn endian_names() -> &'static [(Endian, &'static str)] {
        Endian::labels()
    }
}

fn read_groups(reader: &mut BinaryReader<'_>, header: &BfresHeader) -> Result<Vec<Group>> {
    let mut groups = Vec::new();

    for kind in GroupKind::ALL {
        let Some(offset) = header.group_offset(kind) else {
            continue;
        };

        let dict = ResDict::parse(reader, offset).map_err(|error| match error {
            Error::OffsetOutOfBounds { field, offset, len } => Error::OffsetOutOfBounds {
                field: format!("{kind} {field}"),
                offset,
                len,
            },
            other => other,
        })?;
        let declared = header.group_count(kind) as usize;
        if declared != dict.len() {
            warn!(
                %kind,
                declared,
                actual = dict.len(),
                "group count does not match its dictionary"
            );
        }

        let mut nodes = Vec::with_capacity(dict.len());
        for (_, entry) in dict.iter() {
            let offset = entry.data_offset.ok_or_else(|| Error::OffsetOutOfBounds {
                field: format!("{kind} entry {:?}", entry.key),
                offset: 0,
                len: reader.len(),
            })?;
            nodes.push(ResourceNode::parse(reader, kind, entry.key.clone(), offset)?);
        }

        debug!(%kind, entries = nodes.len(), "parsed group");
        groups.push(Group { kind, dict, nodes });
    }

    Ok(groups)
}
