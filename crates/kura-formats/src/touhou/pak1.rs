//! Touhou PAK1 archives.
//!
//! There is no signature. The file starts with a 16-bit entry count followed
//! by a table of `0x6C`-byte records encrypted with a rolling cipher:
//!
//! | Offset | Size | Field                          |
//! |--------|------|--------------------------------|
//! | 0x00   | 0x64 | name, zero-padded              |
//! | 0x64   | 4    | size                           |
//! | 0x68   | 4    | offset, absolute               |
//!
//! A few text resources are additionally encrypted, each with its own
//! cipher parameters chosen by file name.

use kura_common::{
    ByteCursor, EntryLayout, FieldOrder, OffsetBase, RawFile, StreamCipher, Table, TableReader,
};
use kura_fmt::{ArchiveDecoder, PayloadRule, Result};

/// Registered format name.
pub const NAME: &str = "th/pak1";

const LAYOUT: EntryLayout = EntryLayout {
    name_width: 0x64,
    order: FieldOrder::SizeOffset,
    offsets: OffsetBase::Absolute,
    trailer: 0,
};

const TABLE_CIPHER: StreamCipher = StreamCipher::new(0x64, 0x64, 0x4D);

/// Length of an archive with no entries.
const EMPTY_ARCHIVE_LEN: usize = 6;

const PAYLOAD_RULES: &[PayloadRule] = &[
    PayloadRule::new("musicroom.dat", StreamCipher::new(0x5C, 0x5A, 0x3D), Some("txt")),
    PayloadRule::new(".sce", StreamCipher::new(0x63, 0x62, 0x42), Some("txt")),
    PayloadRule::new("cardlist.dat", StreamCipher::new(0x60, 0x61, 0x41), Some("txt")),
];

/// Decoder for PAK1 archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pak1ArchiveDecoder;

impl ArchiveDecoder for Pak1ArchiveDecoder {
    fn check_magic(&self, _cursor: &mut ByteCursor<'_>) -> Result<()> {
        Ok(())
    }

    fn read_table(&self, input: &RawFile, cursor: &mut ByteCursor<'_>) -> Result<Table> {
        let count = cursor.read_u16_le()? as usize;
        let table = TableReader::new(LAYOUT, input.len())
            .with_empty_container_len(EMPTY_ARCHIVE_LEN)
            .read_encrypted(cursor, count, TABLE_CIPHER)?;
        Ok(table)
    }

    fn payload_rules(&self) -> &[PayloadRule] {
        PAYLOAD_RULES
    }
}
