//! Binary writer for in-place serialization into byte slices.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::{Endian, Error, Result};

macro_rules! write_primitive {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $size:expr, $method:ident) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, value: $ty) -> Result<()> {
            let endian = self.endian;
            let bytes = self.reserve($size)?;
            match endian {
                Endian::Big => BigEndian::$method(bytes, value),
                Endian::Little => LittleEndian::$method(bytes, value),
            }
            Ok(())
        }
    };
}

/// A cursor that writes into a fixed-size mutable byte slice.
///
/// The writer never grows the buffer: writing past the end fails with
/// [`Error::OutOfBounds`] and leaves the out-of-range bytes untouched.
/// Callers that produce new files allocate the final size up front.
///
/// # Example
///
/// ```
/// use cafe_common::{BinaryWriter, Endian};
///
/// let mut buffer = [0u8; 6];
/// let mut writer = BinaryWriter::with_endian(&mut buffer, Endian::Little);
/// writer.write_u32(0x04030201).unwrap();
/// writer.write_u16(0xBEEF).unwrap();
/// assert_eq!(buffer, [0x01, 0x02, 0x03, 0x04, 0xEF, 0xBE]);
/// ```
#[derive(Debug)]
pub struct BinaryWriter<'a> {
    data: &'a mut [u8],
    position: usize,
    endian: Endian,
}

impl<'a> BinaryWriter<'a> {
    /// Create a new big endian writer over a byte slice.
    #[inline]
    pub fn new(data: &'a mut [u8]) -> Self {
        Self::with_endian(data, Endian::Big)
    }

    /// Create a new writer with an explicit byte order.
    #[inline]
    pub fn with_endian(data: &'a mut [u8], endian: Endian) -> Self {
        Self {
            data,
            position: 0,
            endian,
        }
    }

    /// Byte order used for multi-byte writes.
    #[inline]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Pin the byte order used for subsequent multi-byte writes.
    #[inline]
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Get the current position in the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the underlying buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Seek to an absolute position (at most the end of the buffer).
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

    /// Run `f` with the cursor at `position`, then restore the current position.
    pub fn at<T>(&mut self, position: usize, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = self.position;
        let result = self.seek(position).and_then(|()| f(self));
        self.position = saved;
        result
    }

    /// Borrow the next `count` bytes for writing and advance past them.
    fn reserve(&mut self, count: usize) -> Result<&mut [u8]> {
        let available = self.data.len().saturating_sub(self.position);
        if available < count {
            return Err(Error::OutOfBounds {
                offset: self.position,
                needed: count,
                available,
            });
        }
        let start = self.position;
        self.position += count;
        Ok(&mut self.data[start..start + count])
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Write a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    write_primitive!(
        /// Write a u16.
        write_u16, u16, 2, write_u16
    );
    write_primitive!(
        /// Write an i16.
        write_i16, i16, 2, write_i16
    );
    write_primitive!(
        /// Write a u32.
        write_u32, u32, 4, write_u32
    );
    write_primitive!(
        /// Write an i32.
        write_i32, i32, 4, write_i32
    );
    write_primitive!(
        /// Write a u64.
        write_u64, u64, 8, write_u64
    );

    /// Write the low `n_bytes` (1 to 8) bytes of `value`.
    pub fn write_uint(&mut self, value: u64, n_bytes: usize) -> Result<()> {
        if !(1..=8).contains(&n_bytes) {
            return Err(Error::InvalidUintWidth(n_bytes));
        }
        let endian = self.endian;
        let bytes = self.reserve(n_bytes)?;
        // byteorder asserts that the value fits; truncation is the contract here.
        let value = if n_bytes == 8 {
            value
        } else {
            value & ((1u64 << (n_bytes * 8)) - 1)
        };
        match endian {
            Endian::Big => BigEndian::write_uint(bytes, value, n_bytes),
            Endian::Little => LittleEndian::write_uint(bytes, value, n_bytes),
        }
        Ok(())
    }

    /// Write a string into a fixed-size field, padding with nulls.
    pub fn write_fixed_string(&mut self, value: &str, field_size: usize) -> Result<()> {
        let bytes = value.as_bytes();
        if bytes.len() > field_size {
            return Err(Error::StringTooLong {
                len: bytes.len(),
                capacity: field_size,
            });
        }
        let field = self.reserve(field_size)?;
        field[..bytes.len()].copy_from_slice(bytes);
        field[bytes.len()..].fill(0);
        Ok(())
    }

    /// Write a null-terminated string.
    pub fn write_cstring(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())?;
        self.write_u8(0)
    }
}
