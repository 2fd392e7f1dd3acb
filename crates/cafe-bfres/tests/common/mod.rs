//! Synthetic BFRES archives for the integration tests.

#![allow(dead_code)]

use cafe_bfres::{BfresHeader, GroupKind, ResDict, GROUP_COUNT};
use cafe_common::{BinaryWriter, Endian};

pub const MODEL_GROUP: usize = 0;
pub const TEXTURE_GROUP: usize = 1;
pub const FILE_GROUP: usize = 11;

/// A texture to lay out in the archive.
#[derive(Debug, Clone)]
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: u32,
    pub tile_mode: u32,
    pub pitch: u32,
    pub mip_count: u32,
    pub mip_offsets: [u32; 13],
    pub image: Vec<u8>,
    pub mipmaps: Vec<u8>,
}

impl Texture {
    /// Linear R8G8B8A8 texture with a counting pixel pattern and no mipmaps.
    pub fn rgba(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            format: 0x1A,
            tile_mode: 1,
            pitch: width,
            mip_count: 1,
            mip_offsets: [0; 13],
            image: (0..width * height * 4).map(|i| i as u8).collect(),
            mipmaps: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    endian: Endian,
    name: Option<String>,
    models: Vec<String>,
    textures: Vec<Texture>,
    files: Vec<(String, Vec<u8>)>,
}

/// Bytes of a built archive plus where things ended up.
#[derive(Debug, Clone)]
pub struct Built {
    pub data: Vec<u8>,
    /// Absolute positions of the characters of every string.
    pub strings: Vec<(String, usize)>,
    /// Absolute dictionary offsets per group slot.
    pub dicts: [Option<usize>; GROUP_COUNT],
}

impl Built {
    pub fn string_position(&self, value: &str) -> usize {
        self.strings
            .iter()
            .find(|(s, _)| s == value)
            .map(|(_, position)| *position)
            .expect("string is laid out")
    }
}

fn align(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

fn relative(field: usize, target: usize) -> i32 {
    (target as i64 - field as i64) as i32
}

impl ArchiveBuilder {
    pub fn new(endian: Endian) -> Self {
        Self {
            endian,
            ..Default::default()
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn model(mut self, name: &str) -> Self {
        self.models.push(name.to_string());
        self
    }

    pub fn texture(mut self, texture: Texture) -> Self {
        self.textures.push(texture);
        self
    }

    pub fn file(mut self, name: &str, contents: &[u8]) -> Self {
        self.files.push((name.to_string(), contents.to_vec()));
        self
    }

    pub fn build(&self) -> Built {
        let mut cursor = 0x80;

        // String table: u32 length, characters, NUL.
        let string_table = cursor;
        let mut strings: Vec<(String, usize)> = Vec::new();
        let all_names = self
            .name
            .iter()
            .chain(&self.models)
            .chain(self.textures.iter().map(|t| &t.name))
            .chain(self.files.iter().map(|(name, _)| name));
        for name in all_names {
            if strings.iter().all(|(s, _)| s != name) {
                strings.push((name.clone(), cursor + 4));
                cursor = align(cursor + 4 + name.len() + 1, 4);
            }
        }
        let string_table_len = cursor - string_table;

        let texture_names: Vec<String> = self.textures.iter().map(|t| t.name.clone()).collect();
        let file_names: Vec<String> = self.files.iter().map(|(n, _)| n.clone()).collect();
        let slots = [
            (MODEL_GROUP, &self.models, 0x30),
            (TEXTURE_GROUP, &texture_names, 0xC0),
            (FILE_GROUP, &file_names, 0x08),
        ];

        // Dictionaries.
        let mut groups = Vec::new();
        for (slot, names, header_size) in slots {
            if names.is_empty() {
                continue;
            }
            let dict = ResDict::from_keys(names.iter().map(String::as_str)).unwrap();
            let position = cursor;
            cursor = align(cursor + dict.byte_size(), 0x10);
            groups.push((slot, names, header_size, position, dict));
        }

        // Sub-resource headers.
        let mut headers: Vec<Vec<usize>> = Vec::new();
        for (_, names, header_size, _, _) in &groups {
            let positions = names
                .iter()
                .map(|_| {
                    let position = cursor;
                    cursor = align(cursor + header_size, 0x10);
                    position
                })
                .collect();
            headers.push(positions);
        }

        // Texture pixels, then embedded file contents.
        let mut pixels = Vec::new();
        for texture in &self.textures {
            let image = align(cursor, 0x100);
            let mipmaps = align(image + texture.image.len(), 0x100);
            cursor = mipmaps + texture.mipmaps.len();
            pixels.push((image, mipmaps));
        }
        let mut contents = Vec::new();
        for (_, bytes) in &self.files {
            let position = align(cursor, 0x10);
            cursor = position + bytes.len();
            contents.push(position);
        }
        let len = align(cursor, 0x10);

        let mut data = vec![0u8; len];
        let mut dicts = [None; GROUP_COUNT];
        let mut w = BinaryWriter::with_endian(&mut data, self.endian);

        let mut group_offsets = [0i32; GROUP_COUNT];
        let mut group_counts = [0u16; GROUP_COUNT];
        for (slot, names, _, position, _) in &groups {
            group_offsets[*slot] = relative(BfresHeader::group_offset_position(GroupKind::ALL[*slot]), *position);
            group_counts[*slot] = names.len() as u16;
            dicts[*slot] = Some(*position);
        }
        let string_position = |value: &str| {
            strings
                .iter()
                .find(|(s, _)| s == value)
                .map(|(_, position)| *position)
                .unwrap()
        };

        let header = BfresHeader {
            magic: *BfresHeader::MAGIC,
            version: 0x0304_0004,
            endian: self.endian,
            header_length: 0x10,
            length: len as u32,
            alignment: 0x2000,
            file_name_offset: self
                .name
                .as_deref()
                .map_or(0, |name| relative(0x14, string_position(name))),
            string_table_length: string_table_len as i32,
            string_table_offset: relative(0x1C, string_table),
            group_offsets,
            group_counts,
            user_pointer: 0,
        };
        header.write_to(&mut w).unwrap();

        for (value, position) in &strings {
            w.seek(position - 4).unwrap();
            w.write_u32(value.len() as u32).unwrap();
            w.write_cstring(value).unwrap();
        }

        for ((slot, names, _, position, dict), positions) in groups.iter_mut().zip(&headers) {
            for (index, (name, header)) in names.iter().zip(positions).enumerate() {
                dict.set_offsets(index + 1, string_position(name), *header);
            }
            w.seek(*position).unwrap();
            dict.write(&mut w).unwrap();

            for (index, (name, &header)) in names.iter().zip(positions).enumerate() {
                w.seek(header).unwrap();
                match *slot {
                    MODEL_GROUP => {
                        w.write_bytes(b"FMDL").unwrap();
                        w.write_i32(relative(header + 4, string_position(name))).unwrap();
                    }
                    TEXTURE_GROUP => {
                        let texture = &self.textures[index];
                        let (image, mipmaps) = pixels[index];
                        write_texture(&mut w, header, texture, string_position(name), image, mipmaps);
                    }
                    _ => {
                        w.write_i32(relative(header, contents[index])).unwrap();
                        w.write_u32(self.files[index].1.len() as u32).unwrap();
                    }
                }
            }
        }

        for (texture, (image, mipmaps)) in self.textures.iter().zip(&pixels) {
            w.seek(*image).unwrap();
            w.write_bytes(&texture.image).unwrap();
            w.seek(*mipmaps).unwrap();
            w.write_bytes(&texture.mipmaps).unwrap();
        }
        for ((_, bytes), position) in self.files.iter().zip(&contents) {
            w.seek(*position).unwrap();
            w.write_bytes(bytes).unwrap();
        }

        Built {
            data,
            strings,
            dicts,
        }
    }
}

fn write_texture(
    w: &mut BinaryWriter<'_>,
    header: usize,
    texture: &Texture,
    name: usize,
    image: usize,
    mipmaps: usize,
) {
    w.write_bytes(b"FTEX").unwrap();
    for value in [
        1, // 2D
        texture.width,
        texture.height,
        1,
        texture.mip_count,
        texture.format,
        0,
        1,
        texture.image.len() as u32,
        0,
        texture.mipmaps.len() as u32,
        0,
        texture.tile_mode,
        0,
        0x200,
        texture.pitch,
    ] {
        w.write_u32(value).unwrap();
    }
    for offset in texture.mip_offsets {
        w.write_u32(offset).unwrap();
    }
    for value in [0, texture.mip_count, 0, 1] {
        w.write_u32(value).unwrap();
    }
    w.write_bytes(&[0, 1, 2, 3]).unwrap();
    for _ in 0..5 {
        w.write_u32(0).unwrap();
    }
    w.write_u32(0).unwrap(); // handle
    w.write_u32(1).unwrap(); // array length

    w.seek(header + 0xA8).unwrap();
    w.write_i32(relative(header + 0xA8, name)).unwrap();
    w.write_i32(0).unwrap();
    w.write_i32(relative(header + 0xB0, image)).unwrap();
    let mipmaps = if texture.mipmaps.is_empty() {
        0
    } else {
        relative(header + 0xB4, mipmaps)
    };
    w.write_i32(mipmaps).unwrap();
}
