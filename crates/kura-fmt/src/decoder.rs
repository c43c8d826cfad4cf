//! Decoder capability interfaces.
//!
//! A format is either a [`FileDecoder`] (one input, one output) or an
//! [`ArchiveDecoder`] (one input, many outputs). Both expose the same
//! recognition protocol: `recognize` parses as much as it needs and may fail
//! with any error, `is_recognized` turns that into a plain `bool`. Recognition
//! only ever sees `&RawFile`, so it cannot modify the bytes it probes, and every
//! probe starts from a fresh cursor.

use kura_common::{ByteCursor, Error as CommonError, RawFile, Table, TableEntry};

use crate::payload::{apply_payload_rules, PayloadRule};
use crate::{FileSaver, Registry, Result};

/// A decoder that turns one file into one file.
pub trait FileDecoder: Send + Sync {
    /// Parse enough of `input` to decide whether this decoder applies.
    fn recognize(&self, input: &RawFile) -> Result<()>;

    /// Decode `input`.
    ///
    /// Errors are not swallowed here; they reach the caller unchanged.
    fn decode(&self, input: RawFile) -> Result<RawFile>;

    /// Check whether this decoder applies to `input`.
    fn is_recognized(&self, input: &RawFile) -> bool {
        self.recognize(input).is_ok()
    }
}

/// A decoder that unpacks a container into many files.
///
/// Implementors describe the container in three steps: [`check_magic`],
/// [`read_table`] and, optionally, [`read_file`]. The provided methods
/// sequence them; formats only override what differs.
///
/// [`check_magic`]: ArchiveDecoder::check_magic
/// [`read_table`]: ArchiveDecoder::read_table
/// [`read_file`]: ArchiveDecoder::read_file
pub trait ArchiveDecoder: Send + Sync {
    /// Verify the container signature at the cursor position.
    ///
    /// Formats without a signature accept everything here and rely on
    /// [`read_table`](ArchiveDecoder::read_table) for recognition.
    fn check_magic(&self, cursor: &mut ByteCursor<'_>) -> Result<()>;

    /// Read and validate the complete file table.
    ///
    /// Called with the cursor right after the signature. Every returned entry
    /// lies inside the container.
    fn read_table(&self, input: &RawFile, cursor: &mut ByteCursor<'_>) -> Result<Table>;

    /// Name-keyed transforms applied to every extracted payload.
    fn payload_rules(&self) -> &[PayloadRule] {
        &[]
    }

    /// Decoders tried on each extracted payload, in registration order.
    fn sub_decoders(&self) -> Option<&Registry> {
        None
    }

    /// Extract one entry into a new, independently owned file.
    fn read_file(&self, input: &RawFile, entry: &TableEntry) -> Result<RawFile> {
        let mut file = RawFile::new(entry.name.clone(), read_entry_data(input, entry)?.to_vec());
        apply_payload_rules(&mut file, self.payload_rules());
        Ok(file)
    }

    /// Parse enough of `input` to decide whether this decoder applies.
    ///
    /// Defaults to the full table parse; formats with a reliable signature
    /// may narrow it to the magic check.
    fn recognize(&self, input: &RawFile) -> Result<()> {
        self.list(input).map(drop)
    }

    /// Check whether this decoder applies to `input`.
    fn is_recognized(&self, input: &RawFile) -> bool {
        self.recognize(input).is_ok()
    }

    /// Check the signature and read the table.
    fn list(&self, input: &RawFile) -> Result<Table> {
        let mut cursor = input.cursor();
        self.check_magic(&mut cursor)?;
        self.read_table(input, &mut cursor)
    }

    /// Extract every entry, in table order, into `saver`.
    ///
    /// The whole table is read and validated before the first file is
    /// extracted, so a bad entry anywhere in the table means nothing is saved.
    fn unpack(&self, input: &RawFile, saver: &mut dyn FileSaver) -> Result<()> {
        let table = self.list(input)?;
        log::info!("{}: unpacking {} entries", input.name, table.len());

        for entry in &table {
            saver.save(self.read_file(input, entry)?)?;
        }
        Ok(())
    }

    /// Like [`unpack`](ArchiveDecoder::unpack), extracting entries on the
    /// rayon pool.
    ///
    /// Files still reach `saver` in table order, and only once every entry
    /// was extracted; the first failing entry in table order is reported.
    #[cfg(feature = "parallel")]
    fn unpack_parallel(&self, input: &RawFile, saver: &mut dyn FileSaver) -> Result<()> {
        use rayon::prelude::*;

        let table = self.list(input)?;
        log::info!("{}: unpacking {} entries in parallel", input.name, table.len());

        let files: Vec<Result<RawFile>> = table
            .par_iter()
            .map(|entry| self.read_file(input, entry))
            .collect();
        let files = files.into_iter().collect::<Result<Vec<_>>>()?;

        for file in files {
            saver.save(file)?;
        }
        Ok(())
    }
}

/// Borrow the bytes of `entry` from `input`.
///
/// Fails with `BadDataOffset` if the entry does not fit, which can only
/// happen when the entry was not produced by `input`'s own table.
pub fn read_entry_data<'a>(input: &'a RawFile, entry: &TableEntry) -> Result<&'a [u8]> {
    let mut cursor = input.cursor();
    cursor
        .seek(entry.offset as usize)
        .and_then(|()| cursor.read(entry.size as usize))
        .map_err(|_| {
            CommonError::BadDataOffset {
                name: entry.name.clone(),
                offset: entry.offset as u64,
                size: entry.size as u64,
                container_len: input.len(),
            }
            .into()
        })
}

/// A decoder instance, tagged with its capability.
pub enum Decoder {
    /// One file in, one file out.
    File(Box<dyn FileDecoder>),
    /// One container in, many files out.
    Archive(Box<dyn ArchiveDecoder>),
}

impl Decoder {
    /// Check whether the decoder applies to `input`.
    pub fn is_recognized(&self, input: &RawFile) -> bool {
        match self {
            Decoder::File(decoder) => decoder.is_recognized(input),
            Decoder::Archive(decoder) => decoder.is_recognized(input),
        }
    }

    /// Check if this is an archive decoder.
    #[inline]
    pub fn is_archive(&self) -> bool {
        matches!(self, Decoder::Archive(_))
    }

    /// Get the archive capability, if any.
    pub fn as_archive(&self) -> Option<&dyn ArchiveDecoder> {
        match self {
            Decoder::Archive(decoder) => Some(decoder.as_ref()),
            Decoder::File(_) => None,
        }
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decoder::File(_) => f.write_str("Decoder::File"),
            Decoder::Archive(_) => f.write_str("Decoder::Archive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{archive_bytes, TestArchive};
    use crate::MemorySaver;

    #[test]
    fn test_recognition_is_pure() {
        let input = RawFile::new("test.tst", archive_bytes(&[("a", b"1")]));
        let before = input.clone();
        let decoder = TestArchive::default();

        for _ in 0..3 {
            assert!(decoder.is_recognized(&input));
        }
        assert_eq!(input, before);

        let garbage = RawFile::new("junk", vec![0xFF; 3]);
        for _ in 0..3 {
            assert!(!decoder.is_recognized(&garbage));
        }
    }

    #[test]
    fn test_unpack_in_table_order() {
        let input = RawFile::new(
            "test.tst",
            archive_bytes(&[("b", "second"), ("a", "first")]),
        );
        let mut saver = MemorySaver::new();
        TestArchive::default().unpack(&input, &mut saver).unwrap();

        let names: Vec<_> = saver.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(saver.files()[1].data, b"first");
    }

    #[test]
    fn test_bad_entry_saves_nothing() {
        let mut data = archive_bytes(&[("a", "ok"), ("b", "oops")]);
        // header, first record, second name
        let size_pos = 8 + 16 + 8;
        data[size_pos..size_pos + 4].copy_from_slice(&1000u32.to_le_bytes());
        let input = RawFile::new("bad.tst", data);

        let mut saver = MemorySaver::new();
        let err = TestArchive::default().unpack(&input, &mut saver).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Common(CommonError::BadDataOffset { .. })
        ));
        assert!(saver.is_empty());
    }

    #[test]
    fn test_read_entry_data_rejects_foreign_entry() {
        let input = RawFile::new("x", vec![0; 4]);
        let entry = TableEntry {
            name: "far".into(),
            offset: 2,
            size: 8,
            packing: None,
        };
        assert!(read_entry_data(&input, &entry).is_err());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_unpack_parallel_keeps_order() {
        let entries: Vec<(String, Vec<u8>)> = (0..32)
            .map(|i| (format!("f{i:02}"), vec![i as u8; i + 1]))
            .collect();
        let input = RawFile::new("par.tst", archive_bytes(&entries));

        let mut saver = MemorySaver::new();
        TestArchive::default()
            .unpack_parallel(&input, &mut saver)
            .unwrap();

        let names: Vec<_> = saver.files().iter().map(|f| f.name.clone()).collect();
        let expected: Vec<_> = entries.iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names, expected);
    }
}
