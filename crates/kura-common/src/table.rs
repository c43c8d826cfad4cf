//! Fixed-width file tables.
//!
//! Most containers describe their payloads with a run of equally sized
//! records: a padded name field, a 32-bit size and a 32-bit offset in some
//! order, and a few unused trailer bytes. [`TableReader`] parses such a run
//! from an [`EntryLayout`] and validates every entry against the container
//! length before the table is handed out.

use std::ops::Range;

use crate::reader::decode_name;
use crate::{ByteCursor, Error, Result, StreamCipher};

/// Width of each 32-bit size/offset field.
const FIELD_WIDTH: usize = 4;

/// Order of the size and offset fields after the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    /// Size first, then offset.
    SizeOffset,
    /// Offset first, then size.
    OffsetSize,
}

/// What stored offsets are measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetBase {
    /// Offsets are positions in the container.
    Absolute,
    /// Offsets are relative to the first byte after the table.
    Relative,
}

/// Geometry of one fixed-width table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryLayout {
    /// Width of the zero-padded name field.
    pub name_width: usize,
    /// Order of the size and offset fields.
    pub order: FieldOrder,
    /// Base of the stored offsets.
    pub offsets: OffsetBase,
    /// Unused bytes after the size and offset fields.
    pub trailer: usize,
}

impl EntryLayout {
    /// Total width of one record in bytes.
    #[inline]
    pub const fn width(&self) -> usize {
        self.name_width + 2 * FIELD_WIDTH + self.trailer
    }
}

/// How a payload is stored, for tables that record it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Packing {
    /// Format-specific storage method; 0 means stored as-is.
    pub method: u32,
    /// Size of the payload once unpacked.
    pub unpacked_size: u32,
}

/// A record describing one payload inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableEntry {
    /// File name/path within the container.
    pub name: String,
    /// Absolute byte offset of the payload.
    pub offset: u32,
    /// Payload size in bytes, as stored.
    pub size: u32,
    /// Storage method, when the table records one.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub packing: Option<Packing>,
}

impl TableEntry {
    /// Build an entry, rejecting it if it reaches past `container_len`.
    ///
    /// Offsets and sizes are taken as `u64` so that relative offsets can be
    /// rebased before validation without overflowing.
    pub fn validated(name: String, offset: u64, size: u64, container_len: usize) -> Result<Self> {
        let in_bounds = offset
            .checked_add(size)
            .is_some_and(|end| end <= container_len as u64);
        match (in_bounds, u32::try_from(offset), u32::try_from(size)) {
            (true, Ok(offset), Ok(size)) => Ok(Self {
                name,
                offset,
                size,
                packing: None,
            }),
            _ => Err(Error::BadDataOffset {
                name,
                offset,
                size,
                container_len,
            }),
        }
    }

    /// Attach storage information.
    #[inline]
    pub fn with_packing(mut self, packing: Packing) -> Self {
        self.packing = Some(packing);
        self
    }

    /// Byte range of the payload inside the container.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.size as usize
    }
}

/// Ordered file table, in on-disk order.
pub type Table = Vec<TableEntry>;

/// Parser for fixed-width file tables.
///
/// # Example
///
/// ```
/// use kura_common::{ByteCursor, EntryLayout, FieldOrder, OffsetBase, TableReader};
///
/// let layout = EntryLayout {
///     name_width: 4,
///     order: FieldOrder::OffsetSize,
///     offsets: OffsetBase::Relative,
///     trailer: 0,
/// };
///
/// let mut data = Vec::new();
/// data.extend_from_slice(b"a.b\0");
/// data.extend_from_slice(&0u32.to_le_bytes()); // offset
/// data.extend_from_slice(&3u32.to_le_bytes()); // size
/// data.extend_from_slice(b"xyz");
///
/// let reader = TableReader::new(layout, data.len());
/// let table = reader.read(&mut ByteCursor::new(&data), 1)?;
/// assert_eq!(table[0].name, "a.b");
/// assert_eq!(table[0].offset, 12);
/// # Ok::<(), kura_common::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TableReader {
    layout: EntryLayout,
    container_len: usize,
    empty_container_len: Option<usize>,
}

impl TableReader {
    /// Create a reader for a container of `container_len` bytes.
    #[inline]
    pub const fn new(layout: EntryLayout, container_len: usize) -> Self {
        Self {
            layout,
            container_len,
            empty_container_len: None,
        }
    }

    /// Only accept an empty table when the container is exactly `len` bytes.
    #[inline]
    pub const fn with_empty_container_len(mut self, len: usize) -> Self {
        self.empty_container_len = Some(len);
        self
    }

    /// Read `count` plaintext records starting at the cursor position.
    ///
    /// On success the cursor sits right after the table.
    pub fn read(&self, cursor: &mut ByteCursor<'_>, count: usize) -> Result<Table> {
        self.check_count(count)?;
        let table_size = self.table_size(cursor, count)?;
        let data_start = cursor.tell() + table_size;
        self.read_entries(cursor, count, data_start)
    }

    /// Read `count` records that were encrypted with `cipher`.
    ///
    /// The table range is copied into its own buffer and decrypted there; the
    /// container bytes are never touched. On success the cursor sits right
    /// after the table.
    pub fn read_encrypted(
        &self,
        cursor: &mut ByteCursor<'_>,
        count: usize,
        cipher: StreamCipher,
    ) -> Result<Table> {
        self.check_count(count)?;
        let table_size = self.table_size(cursor, count)?;
        let mut raw = cursor.read(table_size)?.to_vec();
        cipher.apply(&mut raw);
        let data_start = cursor.tell();
        self.read_entries(&mut ByteCursor::new(&raw), count, data_start)
    }

    fn check_count(&self, count: usize) -> Result<()> {
        match self.empty_container_len {
            Some(len) if count == 0 && self.container_len != len => {
                Err(Error::NotRecognized("empty table in a non-empty container"))
            }
            _ => Ok(()),
        }
    }

    /// Size of the table in bytes, checked against what is left to read so
    /// that a garbage count never drives a huge allocation.
    fn table_size(&self, cursor: &ByteCursor<'_>, count: usize) -> Result<usize> {
        let available = cursor.remaining_len();
        match count.checked_mul(self.layout.width()) {
            Some(size) if size <= available => Ok(size),
            Some(size) => Err(Error::TruncatedInput {
                needed: size,
                available,
            }),
            None => Err(Error::TruncatedInput {
                needed: usize::MAX,
                available,
            }),
        }
    }

    fn read_entries(
        &self,
        table: &mut ByteCursor<'_>,
        count: usize,
        data_start: usize,
    ) -> Result<Table> {
        let base = match self.layout.offsets {
            OffsetBase::Absolute => 0,
            OffsetBase::Relative => data_start as u64,
        };

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let name = decode_name(table.read_zero_terminated(self.layout.name_width)?);
            let (size, offset) = match self.layout.order {
                FieldOrder::SizeOffset => {
                    let size = table.read_u32_le()?;
                    (size, table.read_u32_le()?)
                }
                FieldOrder::OffsetSize => {
                    let offset = table.read_u32_le()?;
                    (table.read_u32_le()?, offset)
                }
            };
            table.skip(self.layout.trailer)?;

            entries.push(TableEntry::validated(
                name,
                base + offset as u64,
                size as u64,
                self.container_len,
            )?);
        }
        Ok(entries)
    }
}
