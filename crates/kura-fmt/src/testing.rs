//! Small in-memory formats shared by the framework tests.

use kura_common::{ByteCursor, EntryLayout, FieldOrder, OffsetBase, RawFile, Table, TableReader};

use crate::{ArchiveDecoder, Decoder, FileDecoder, Registry, Result};

pub(crate) const ARCHIVE_MAGIC: &[u8; 4] = b"TST\0";

const LAYOUT: EntryLayout = EntryLayout {
    name_width: 8,
    order: FieldOrder::SizeOffset,
    offsets: OffsetBase::Absolute,
    trailer: 0,
};

/// Build a test archive: magic, u32 count, 16-byte records, then the data.
pub(crate) fn archive_bytes<N: AsRef<str>, D: AsRef<[u8]>>(entries: &[(N, D)]) -> Vec<u8> {
    let mut out = ARCHIVE_MAGIC.to_vec();
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());

    let mut offset = out.len() + entries.len() * LAYOUT.width();
    for (name, data) in entries {
        let mut field = [0u8; 8];
        let (name, data) = (name.as_ref().as_bytes(), data.as_ref());
        field[..name.len()].copy_from_slice(name);
        out.extend_from_slice(&field);
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(offset as u32).to_le_bytes());
        offset += data.len();
    }
    for (_, data) in entries {
        out.extend_from_slice(data.as_ref());
    }
    out
}

#[derive(Default)]
pub(crate) struct TestArchive {
    sub: Option<Registry>,
}

impl TestArchive {
    /// An archive whose payloads may be upper-cased text or further archives.
    pub(crate) fn nesting() -> Self {
        let mut sub = Registry::new();
        sub.add_file::<UpperDecoder>("test/upper").unwrap();
        sub.add("test/archive", || Decoder::Archive(Box::new(TestArchive::nesting())))
            .unwrap();
        Self { sub: Some(sub) }
    }
}

impl ArchiveDecoder for TestArchive {
    fn check_magic(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        Ok(cursor.expect_magic(ARCHIVE_MAGIC)?)
    }

    fn read_table(&self, input: &RawFile, cursor: &mut ByteCursor<'_>) -> Result<Table> {
        let count = cursor.read_u32_le()? as usize;
        Ok(TableReader::new(LAYOUT, input.len()).read(cursor, count)?)
    }

    fn sub_decoders(&self) -> Option<&Registry> {
        self.sub.as_ref()
    }
}

/// Recognizes `UP:` and upper-cases the rest.
#[derive(Default)]
pub(crate) struct UpperDecoder;

impl FileDecoder for UpperDecoder {
    fn recognize(&self, input: &RawFile) -> Result<()> {
        Ok(input.cursor().expect_magic(b"UP:")?)
    }

    fn decode(&self, input: RawFile) -> Result<RawFile> {
        self.recognize(&input)?;
        let mut output = RawFile::new(input.name, input.data[3..].to_ascii_uppercase());
        output.change_extension("txt");
        Ok(output)
    }
}

/// Recognizes anything non-empty; used to check registration order.
#[derive(Default)]
pub(crate) struct GreedyDecoder;

impl FileDecoder for GreedyDecoder {
    fn recognize(&self, input: &RawFile) -> Result<()> {
        input.cursor().read_u8()?;
        Ok(())
    }

    fn decode(&self, input: RawFile) -> Result<RawFile> {
        Ok(input)
    }
}
