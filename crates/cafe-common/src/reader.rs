//! Binary reader for zero-copy parsing of byte slices.
//!
//! This module provides [`BinaryReader`], a cursor-like type that reads
//! binary data from a byte slice without copying, in a byte order pinned
//! for the lifetime of the reader.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use zerocopy::FromBytes;

use crate::{Endian, Error, Result};

macro_rules! read_primitive {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $size:expr, $method:ident) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self) -> Result<$ty> {
            let bytes = self.read_bytes($size)?;
            Ok(match self.endian {
                Endian::Big => BigEndian::$method(bytes),
                Endian::Little => LittleEndian::$method(bytes),
            })
        }
    };
}

/// A binary reader that provides zero-copy reading from a byte slice.
///
/// Multi-byte values are decoded in the reader's [`Endian`], which defaults to
/// big endian and is normally pinned once per file after the byte-order mark
/// has been inspected.
///
/// # Example
///
/// ```
/// use cafe_common::{BinaryReader, Endian};
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x01020304);
/// reader.set_endian(Endian::Little);
/// assert_eq!(reader.read_u32().unwrap(), 0x08070605);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
    endian: Endian,
}

impl<'a> BinaryReader<'a> {
    /// Create a new big endian reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            endian: Endian::Big,
        }
    }

    /// Create a new reader with an explicit byte order.
    #[inline]
    pub const fn with_endian(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            position: 0,
            endian,
        }
    }

    /// Byte order used for multi-byte reads.
    #[inline]
    pub const fn endian(&self) -> Endian {
        self.endian
    }

    /// Pin the byte order used for subsequent multi-byte reads.
    #[inline]
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// The whole underlying buffer.
    #[inline]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Seek to an absolute position.
    ///
    /// Seeking exactly to the end of the buffer is allowed; anything past it
    /// fails with [`Error::OutOfBounds`].
    #[inline]
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::OutOfBounds {
                offset: position,
                needed: 0,
                available: 0,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Advance the position by a number of bytes.
    #[inline]
    pub fn advance(&mut self, count: usize) -> Result<()> {
        self.seek(self.position.saturating_add(count))
    }

    /// Run `f` with the cursor at `position`, then restore the current position.
    ///
    /// The position is restored even when `f` fails.
    pub fn at<T, E: From<Error>>(
        &mut self,
        position: usize,
        f: impl FnOnce(&mut Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let saved = self.position;
        let result = self.seek(position).map_err(E::from).and_then(|()| f(self));
        self.position = saved;
        result
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::OutOfBounds {
                offset: self.position,
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a fixed-size byte array, such as a magic tag.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.read_struct::<[u8; N]>()
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a signed byte.
    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    read_primitive!(
        /// Read a u16.
        read_u16, u16, 2, read_u16
    );
    read_primitive!(
        /// Read an i16.
        read_i16, i16, 2, read_i16
    );
    read_primitive!(
        /// Read a u32.
        read_u32, u32, 4, read_u32
    );
    read_primitive!(
        /// Read an i32.
        read_i32, i32, 4, read_i32
    );
    read_primitive!(
        /// Read a u64.
        read_u64, u64, 8, read_u64
    );
    read_primitive!(
        /// Read an i64.
        read_i64, i64, 8, read_i64
    );
    read_primitive!(
        /// Read an f32.
        read_f32, f32, 4, read_f32
    );

    /// Read an unsigned integer of `n_bytes` (1 to 8) bytes.
    pub fn read_uint(&mut self, n_bytes: usize) -> Result<u64> {
        if !(1..=8).contains(&n_bytes) {
            return Err(Error::InvalidUintWidth(n_bytes));
        }
        let bytes = self.read_bytes(n_bytes)?;
        Ok(match self.endian {
            Endian::Big => BigEndian::read_uint(bytes, n_bytes),
            Endian::Little => LittleEndian::read_uint(bytes, n_bytes),
        })
    }

    /// Read an `i32` offset stored relative to its own position.
    ///
    /// Returns the absolute offset, or `None` when the stored value is 0.
    pub fn read_relative_offset(&mut self) -> Result<Option<usize>> {
        let field = self.position;
        let relative = self.read_i32()?;
        if relative == 0 {
            return Ok(None);
        }
        let absolute = field as i64 + relative as i64;
        if absolute < 0 || absolute as usize > self.data.len() {
            return Err(Error::OutOfBounds {
                offset: absolute.max(0) as usize,
                needed: 0,
                available: 0,
            });
        }
        Ok(Some(absolute as usize))
    }

    /// Read a null-terminated UTF-8 string.
    pub fn read_cstring(&mut self) -> Result<&'a str> {
        let start = self.position;
        let remaining = self.remaining_bytes();

        let null_pos =
            memchr::memchr(0, remaining).ok_or(Error::MissingNullTerminator(start))?;

        let string_bytes = &remaining[..null_pos];
        self.position = start + null_pos + 1;

        std::str::from_utf8(string_bytes).map_err(Error::Utf8)
    }

    /// Read a null-terminated string at an absolute offset without moving.
    pub fn read_string_at(&mut self, offset: usize) -> Result<&'a str> {
        self.at(offset, |r| r.read_cstring())
    }

    /// Read a string of a specific length.
    pub fn read_string(&mut self, length: usize) -> Result<&'a str> {
        let bytes = self.read_bytes(length)?;
        std::str::from_utf8(bytes).map_err(Error::Utf8)
    }

    /// Read a string from a fixed-size field, stopping at the first null.
    pub fn read_fixed_string(&mut self, field_size: usize) -> Result<&'a str> {
        let bytes = self.read_bytes(field_size)?;
        let null_pos = memchr::memchr(0, bytes).unwrap_or(field_size);
        std::str::from_utf8(&bytes[..null_pos]).map_err(Error::Utf8)
    }

    /// Read a struct using zerocopy.
    ///
    /// Only byte-oriented types are endian-neutral; multi-byte fields should
    /// go through the typed readers instead.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let offset = self.position;
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::OutOfBounds {
            offset,
            needed: size,
            available: bytes.len(),
        })
    }

    /// Expect specific magic bytes.
    pub fn expect_magic(&mut self, expected: &[u8]) -> Result<()> {
        let offset = self.position;
        let actual = self.read_bytes(expected.len())?;
        if actual != expected {
            return Err(Error::InvalidMagic {
                offset,
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            });
        }
        Ok(())
    }
}
