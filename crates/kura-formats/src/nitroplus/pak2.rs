//! Nitroplus PAK archives, revision 2.
//!
//! ```text
//! 0x000  u32  revision (2)
//! 0x004  Pak2Header
//! 0x114  zlib-compressed file table
//!        ...  payloads, offsets relative to the end of the compressed table
//! ```
//!
//! Table records are variable-width: a length-prefixed Shift-JIS name, then
//! offset, unpacked size, four unused bytes, a compression flag and the
//! stored size. Payloads with a non-zero flag are zlib streams.

use kura_common::{
    decode_name, ByteCursor, Error as CommonError, Packing, RawFile, Table, TableEntry,
};
use kura_fmt::{read_entry_data, ArchiveDecoder, Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::compression::{check_size, inflate_zlib_sized};

/// Registered format name.
pub const NAME: &str = "nitroplus/pak2";

const REVISION: u32 = 2;

/// Revisions that share the signature slot but use another layout.
const OTHER_REVISIONS: &[u32] = &[1, 3, 4];

/// Offset of the compressed table.
const TABLE_OFFSET: usize = 0x114;

/// Fixed header after the revision field.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Pak2Header {
    /// Number of table records.
    pub file_count: u32,
    /// Size of the table once inflated.
    pub table_size: u32,
    /// Size of the compressed table.
    pub compressed_table_size: u32,
}

/// Decoder for revision 2 PAK archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pak2ArchiveDecoder;

impl ArchiveDecoder for Pak2ArchiveDecoder {
    fn check_magic(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        let revision = cursor.read_u32_le()?;
        if revision == REVISION {
            return Ok(());
        }
        if OTHER_REVISIONS.contains(&revision) {
            return Err(Error::UnsupportedVariant(format!("PAK revision {revision}")));
        }
        Err(CommonError::InvalidMagic {
            expected: REVISION.to_le_bytes().to_vec(),
            actual: revision.to_le_bytes().to_vec(),
        }
        .into())
    }

    fn read_table(&self, input: &RawFile, cursor: &mut ByteCursor<'_>) -> Result<Table> {
        let header: Pak2Header = cursor.read_struct()?;
        let file_count = header.file_count as usize;
        let table_size = header.table_size as usize;

        cursor.seek(TABLE_OFFSET)?;
        let compressed = cursor.read(header.compressed_table_size as usize)?;
        let data_start = cursor.tell() as u64;

        let raw = inflate_zlib_sized(&input.name, compressed, table_size)?;
        log::debug!(
            "{}: {} entries, table inflated from {} to {} bytes",
            input.name,
            file_count,
            compressed.len(),
            raw.len()
        );
        let mut records = ByteCursor::new(&raw);

        // A record is at least 24 bytes.
        if file_count > raw.len() / 24 {
            return Err(CommonError::TruncatedInput {
                needed: file_count * 24,
                available: raw.len(),
            }
            .into());
        }

        let mut table = Vec::with_capacity(file_count);
        for _ in 0..file_count {
            let name_len = records.read_u32_le()? as usize;
            let name = decode_name(records.read(name_len)?).replace('\\', "/");
            let offset = records.read_u32_le()? as u64;
            let unpacked_size = records.read_u32_le()?;
            records.skip(4)?;
            let flags = records.read_u32_le()?;
            let compressed_size = records.read_u32_le()?;

            let stored_size = if flags > 0 {
                compressed_size
            } else {
                unpacked_size
            };
            let entry =
                TableEntry::validated(name, data_start + offset, stored_size as u64, input.len())?;
            table.push(entry.with_packing(Packing {
                method: flags,
                unpacked_size,
            }));
        }
        Ok(table)
    }

    fn read_file(&self, input: &RawFile, entry: &TableEntry) -> Result<RawFile> {
        let stored = read_entry_data(input, entry)?;
        let data = match entry.packing {
            Some(packing) if packing.method > 0 => {
                inflate_zlib_sized(&entry.name, stored, packing.unpacked_size as usize)?
            }
            Some(packing) => {
                check_size(&entry.name, packing.unpacked_size as usize, stored.len())?;
                stored.to_vec()
            }
            None => stored.to_vec(),
        };
        Ok(RawFile::new(entry.name.clone(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::deflate_zlib;
    use kura_fmt::MemorySaver;

    /// `(name, payload, compress)`
    fn pak2_with_revision(revision: u32, entries: &[(&str, &[u8], bool)]) -> Vec<u8> {
        let mut table = Vec::new();
        let mut payloads = Vec::new();
        for (name, data, compress) in entries {
            let stored = if *compress {
                deflate_zlib(data)
            } else {
                data.to_vec()
            };
            table.extend_from_slice(&(name.len() as u32).to_le_bytes());
            table.extend_from_slice(name.as_bytes());
            table.extend_from_slice(&(payloads.len() as u32).to_le_bytes());
            table.extend_from_slice(&(data.len() as u32).to_le_bytes());
            table.extend_from_slice(&[0; 4]);
            table.extend_from_slice(&(*compress as u32).to_le_bytes());
            table.extend_from_slice(&(stored.len() as u32).to_le_bytes());
            payloads.extend_from_slice(&stored);
        }
        let compressed_table = deflate_zlib(&table);

        let header = Pak2Header {
            file_count: entries.len() as u32,
            table_size: table.len() as u32,
            compressed_table_size: compressed_table.len() as u32,
        };
        let mut out = revision.to_le_bytes().to_vec();
        out.extend_from_slice(header.as_bytes());
        out.resize(TABLE_OFFSET, 0);
        out.extend_from_slice(&compressed_table);
        out.extend_from_slice(&payloads);
        out
    }

    fn pak2(entries: &[(&str, &[u8], bool)]) -> Vec<u8> {
        pak2_with_revision(REVISION, entries)
    }

    #[test]
    fn test_unpack() {
        let script = b"script script script script".as_slice();
        let input = RawFile::new(
            "system.pak",
            pak2(&[("nss\\boot.nss", script, true), ("cg/bg01.png", b"\x89PNG", false)]),
        );
        assert!(Pak2ArchiveDecoder.is_recognized(&input));

        let mut saver = MemorySaver::new();
        Pak2ArchiveDecoder.unpack(&input, &mut saver).unwrap();
        let files = saver.files();
        assert_eq!(files[0].name, "nss/boot.nss");
        assert_eq!(files[0].data, script);
        assert_eq!(files[1].name, "cg/bg01.png");
        assert_eq!(files[1].data, b"\x89PNG");
    }

    #[test]
    fn test_offsets_follow_compressed_table() {
        let input = RawFile::new("a.pak", pak2(&[("a", b"raw", false)]));
        let table = Pak2ArchiveDecoder.list(&input).unwrap();
        assert_eq!(table[0].offset as usize, input.len() - 3);
        assert_eq!(
            table[0].packing,
            Some(Packing {
                method: 0,
                unpacked_size: 3
            })
        );
    }

    #[test]
    fn test_other_revisions() {
        let input = RawFile::new("a.pak", pak2_with_revision(3, &[("a", b"raw", false)]));
        assert!(!Pak2ArchiveDecoder.is_recognized(&input));
        assert!(matches!(Pak2ArchiveDecoder.list(&input), Err(Error::UnsupportedVariant(_))));

        let input = RawFile::new("a.pak", pak2_with_revision(7, &[]));
        assert!(matches!(
            Pak2ArchiveDecoder.list(&input),
            Err(Error::Common(CommonError::InvalidMagic { .. }))
        ));
    }

    #[test]
    fn test_table_size_mismatch() {
        let mut bytes = pak2(&[("a", b"raw", false)]);
        bytes[8] += 1;
        assert!(matches!(
            Pak2ArchiveDecoder.list(&RawFile::new("a.pak", bytes)),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_payload_past_end() {
        let mut bytes = pak2(&[("a", b"payload", false)]);
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            Pak2ArchiveDecoder.list(&RawFile::new("a.pak", bytes)),
            Err(Error::Common(CommonError::BadDataOffset { .. }))
        ));
    }

    #[test]
    fn test_garbage() {
        assert!(!Pak2ArchiveDecoder.is_recognized(&RawFile::new("a", vec![2, 0, 0, 0])));
        assert!(!Pak2ArchiveDecoder.is_recognized(&RawFile::new("a", vec![2; 0x200])));
    }

    #[test]
    fn test_huge_declared_table_size() {
        let header = Pak2Header {
            file_count: 1,
            table_size: 0xFFFF_FFF0,
            compressed_table_size: 0,
        };
        let mut bytes = REVISION.to_le_bytes().to_vec();
        bytes.extend_from_slice(header.as_bytes());
        bytes.resize(TABLE_OFFSET, 0);

        let input = RawFile::new("a.pak", bytes);
        assert!(!Pak2ArchiveDecoder.is_recognized(&input));
        assert!(Pak2ArchiveDecoder.list(&input).is_err());
    }
}
