//! NScripter NSA archives.
//!
//! All integers are big-endian. The header holds a 16-bit entry count and the
//! offset of the data area, followed by variable-width records:
//!
//! | Field           | Size |
//! |-----------------|------|
//! | name            | zero-terminated |
//! | compression     | 1    |
//! | offset          | 4, relative to the data area |
//! | stored size     | 4    |
//! | unpacked size   | 4    |

use kura_common::{
    decode_name, ByteCursor, Error as CommonError, Packing, RawFile, Table, TableEntry,
};
use kura_fmt::{read_entry_data, ArchiveDecoder, Error, Result};

use super::lzss;
use crate::compression::check_size;

/// Registered format name.
pub const NAME: &str = "nsa";

/// Payload compression methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Compression {
    /// Stored as-is.
    None = 0,
    /// Run-length image packing.
    Spb = 1,
    /// [`lzss`]
    Lzss = 2,
}

impl TryFrom<u32> for Compression {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Spb),
            2 => Ok(Compression::Lzss),
            other => Err(Error::UnsupportedVariant(format!("NSA compression method {other}"))),
        }
    }
}

/// Decoder for NSA archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct NsaArchiveDecoder;

impl ArchiveDecoder for NsaArchiveDecoder {
    fn check_magic(&self, _cursor: &mut ByteCursor<'_>) -> Result<()> {
        Ok(())
    }

    fn read_table(&self, input: &RawFile, cursor: &mut ByteCursor<'_>) -> Result<Table> {
        let count = cursor.read_u16_be()? as usize;
        let data_start = cursor.read_u32_be()? as u64;
        if data_start > input.len() as u64 {
            return Err(CommonError::NotRecognized("data area starts past the end").into());
        }

        // Every record is at least 14 bytes, so a count the header cannot hold
        // is rejected before anything is allocated.
        if count * 14 > cursor.remaining_len() {
            return Err(CommonError::TruncatedInput {
                needed: count * 14,
                available: cursor.remaining_len(),
            }
            .into());
        }

        let mut table = Vec::with_capacity(count);
        for _ in 0..count {
            let name = decode_name(cursor.read_until_zero()?).replace('\\', "/");
            let method = cursor.read_u8()? as u32;
            let offset = cursor.read_u32_be()? as u64;
            let stored_size = cursor.read_u32_be()? as u64;
            let unpacked_size = cursor.read_u32_be()?;

            let entry = TableEntry::validated(name, data_start + offset, stored_size, input.len())?;
            table.push(entry.with_packing(Packing {
                method,
                unpacked_size,
            }));
        }

        if cursor.tell() as u64 > data_start {
            return Err(CommonError::NotRecognized("table overlaps the data area").into());
        }
        Ok(table)
    }

    fn read_file(&self, input: &RawFile, entry: &TableEntry) -> Result<RawFile> {
        let stored = read_entry_data(input, entry)?;
        let (method, unpacked_size) = match entry.packing {
            Some(packing) => (
                Compression::try_from(packing.method)?,
                packing.unpacked_size as usize,
            ),
            None => (Compression::None, stored.len()),
        };

        let data = match method {
            Compression::None => stored.to_vec(),
            Compression::Lzss => {
                log::debug!("{}: LZSS, {} -> {} bytes", entry.name, stored.len(), unpacked_size);
                lzss::decode(stored, unpacked_size)?
            }
            Compression::Spb => {
                return Err(Error::UnsupportedVariant(format!(
                    "{}: SPB-packed entries",
                    entry.name
                )))
            }
        };
        check_size(&entry.name, unpacked_size, data.len())?;

        Ok(RawFile::new(entry.name.clone(), data))
    }
}
