//! Bounded cursor over container bytes.
//!
//! This module provides [`ByteCursor`], a cursor-like type that reads binary
//! data from a byte slice without copying. Every read and seek is checked
//! against the slice length, so probing arbitrary input can only fail with an
//! error, never panic.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use encoding_rs::SHIFT_JIS;
use zerocopy::FromBytes;

use crate::{Error, Result};

/// A seekable, bounded view over archive bytes.
///
/// The cursor borrows its data immutably, so cloning it is free and a failed
/// probe can simply be discarded and restarted from position 0.
///
/// # Example
///
/// ```
/// use kura_common::ByteCursor;
///
/// let data = [0x01, 0x02, 0x03, 0x04, b'a', b'b', 0x00, b'x'];
/// let mut cursor = ByteCursor::new(&data);
///
/// assert_eq!(cursor.read_u32_le().unwrap(), 0x04030201);
/// assert_eq!(cursor.read_zero_terminated(4).unwrap(), b"ab");
/// assert!(cursor.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a new cursor at position 0.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn tell(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining_len(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Seek to an absolute position within `[0, len]`.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::OutOfBounds {
                position,
                len: self.data.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Advance the position by `count` bytes.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        let target = self.position.checked_add(count).ok_or(Error::OutOfBounds {
            position: usize::MAX,
            len: self.data.len(),
        })?;
        self.seek(target)
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining_len() < count {
            return Err(Error::TruncatedInput {
                needed: count,
                available: self.remaining_len(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read(1).map(|b| b[0])
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.read(2).map(LittleEndian::read_u16)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.read(4).map(LittleEndian::read_u32)
    }

    /// Read a big-endian u16.
    #[inline]
    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.read(2).map(BigEndian::read_u16)
    }

    /// Read a big-endian u32.
    #[inline]
    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.read(4).map(BigEndian::read_u32)
    }

    /// Read a fixed-width field of `max_len` bytes, returning everything
    /// before the first zero byte.
    ///
    /// The cursor always advances by the full width; whatever follows the
    /// terminator inside the field is discarded.
    pub fn read_zero_terminated(&mut self, max_len: usize) -> Result<&'a [u8]> {
        let field = self.read(max_len)?;
        let end = memchr::memchr(0, field).unwrap_or(field.len());
        Ok(&field[..end])
    }

    /// Read bytes up to (and consuming) the next zero byte.
    ///
    /// Used by variable-width tables. Fails with
    /// [`Error::TruncatedInput`] when no terminator is left in the buffer.
    pub fn read_until_zero(&mut self) -> Result<&'a [u8]> {
        let remaining = self.remaining_bytes();
        let end = memchr::memchr(0, remaining).ok_or(Error::TruncatedInput {
            needed: remaining.len() + 1,
            available: remaining.len(),
        })?;
        self.position += end + 1;
        Ok(&remaining[..end])
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::TruncatedInput {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Expect specific magic bytes.
    pub fn expect_magic(&mut self, expected: &[u8]) -> Result<()> {
        let actual = self.read(expected.len())?;
        if actual != expected {
            return Err(Error::InvalidMagic {
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            });
        }
        Ok(())
    }
}

/// Decode an archive file name.
///
/// Names in these containers are Shift-JIS; plain ASCII passes through
/// unchanged and undecodable sequences become U+FFFD.
pub fn decode_name(bytes: &[u8]) -> String {
    let (text, _) = SHIFT_JIS.decode_without_bom_handling(bytes);
    text.into_owned()
}
