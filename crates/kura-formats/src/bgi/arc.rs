//! BGI (Buriko General Interpreter) archives.
//!
//! Two revisions share the same structure and differ only in the signature
//! and record geometry:
//!
//! | Revision | Magic          | Record | Name | Trailer |
//! |----------|----------------|--------|------|---------|
//! | 1        | `PackFile    ` | 0x20   | 0x10 | 0x08    |
//! | 2        | `BURIKO ARC20` | 0x80   | 0x60 | 0x18    |
//!
//! Each record stores the offset before the size; offsets are relative to
//! the first byte after the table.

use std::sync::Arc;

use kura_common::{ByteCursor, EntryLayout, FieldOrder, OffsetBase, RawFile, Table, TableReader};
use kura_fmt::{ArchiveDecoder, Registry, Result};

/// Registered name of the first revision.
pub const NAME: &str = "bgi/arc";
/// Registered name of the `ARC20` revision.
pub const NAME_ARC20: &str = "bgi/arc20";

/// Archive revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcVersion {
    /// `PackFile    `
    V1,
    /// `BURIKO ARC20`
    Arc20,
}

impl ArcVersion {
    /// Signature at offset 0.
    pub const fn magic(self) -> &'static [u8] {
        match self {
            ArcVersion::V1 => b"PackFile    ",
            ArcVersion::Arc20 => b"BURIKO ARC20",
        }
    }

    /// Table record geometry.
    pub const fn layout(self) -> EntryLayout {
        let (name_width, trailer) = match self {
            ArcVersion::V1 => (0x10, 0x08),
            ArcVersion::Arc20 => (0x60, 0x18),
        };
        EntryLayout {
            name_width,
            order: FieldOrder::OffsetSize,
            offsets: OffsetBase::Relative,
            trailer,
        }
    }
}

/// Decoder for BGI archives.
///
/// Payloads are offered to the BGI media decoders before they reach the
/// sink.
pub struct ArcArchiveDecoder {
    version: ArcVersion,
    sub_decoders: Arc<Registry>,
}

impl ArcArchiveDecoder {
    /// Create a decoder for `version` that hands payloads to `sub_decoders`.
    pub fn new(version: ArcVersion, sub_decoders: Arc<Registry>) -> Self {
        Self {
            version,
            sub_decoders,
        }
    }
}

impl ArchiveDecoder for ArcArchiveDecoder {
    fn check_magic(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        cursor.expect_magic(self.version.magic())?;
        Ok(())
    }

    fn read_table(&self, input: &RawFile, cursor: &mut ByteCursor<'_>) -> Result<Table> {
        let count = cursor.read_u32_le()? as usize;
        let table = TableReader::new(self.version.layout(), input.len()).read(cursor, count)?;
        Ok(table)
    }

    fn sub_decoders(&self) -> Option<&Registry> {
        Some(&self.sub_decoders)
    }

    // The signature is long enough to be trusted on its own.
    fn recognize(&self, input: &RawFile) -> Result<()> {
        self.check_magic(&mut input.cursor())
    }
}

#[cfg(test)]
pub(crate) fn arc_bytes(version: ArcVersion, entries: &[(&str, &[u8])]) -> Vec<u8> {
    let layout = version.layout();
    let mut out = version.magic().to_vec();
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());

    let mut offset = 0u32;
    for (name, data) in entries {
        let mut field = vec![0u8; layout.name_width];
        let len = name.len().min(layout.name_width);
        field[..len].copy_from_slice(&name.as_bytes()[..len]);
        out.extend_from_slice(&field);
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.resize(out.len() + layout.trailer, 0);
        offset += data.len() as u32;
    }
    for (_, data) in entries {
        out.extend_from_slice(data);
    }
    out
}
