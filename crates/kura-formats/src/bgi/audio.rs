//! BGI `bw  ` audio wrapper.
//!
//! An Ogg Vorbis stream behind a small header:
//!
//! | Offset | Size | Field                   |
//! |--------|------|-------------------------|
//! | 0x00   | 4    | header size             |
//! | 0x04   | 4    | magic `bw  `            |
//! | 0x08   | 4    | stream size             |
//!
//! The stream starts right after the header.

use kura_common::RawFile;
use kura_fmt::{FileDecoder, Result};

/// Registered format name.
pub const NAME: &str = "bgi/audio";

const MAGIC: &[u8] = b"bw  ";

/// Strips the header and yields the contained `.ogg` stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioDecoder;

impl FileDecoder for AudioDecoder {
    fn recognize(&self, input: &RawFile) -> Result<()> {
        let mut cursor = input.cursor();
        cursor.skip(4)?;
        cursor.expect_magic(MAGIC)?;
        Ok(())
    }

    fn decode(&self, input: RawFile) -> Result<RawFile> {
        let mut cursor = input.cursor();
        let header_size = cursor.read_u32_le()? as usize;
        cursor.expect_magic(MAGIC)?;
        let stream_size = cursor.read_u32_le()? as usize;

        cursor.seek(header_size)?;
        let stream = cursor.read(stream_size)?.to_vec();

        let mut output = RawFile::new(input.name, stream);
        output.change_extension("ogg");
        Ok(output)
    }
}

#[cfg(test)]
pub(crate) fn audio_bytes(stream: &[u8]) -> Vec<u8> {
    let header_size = 0x40u32;
    let mut out = header_size.to_le_bytes().to_vec();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(stream.len() as u32).to_le_bytes());
    out.resize(header_size as usize, 0);
    out.extend_from_slice(stream);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kura_common::Error as CommonError;
    use kura_fmt::Error;

    #[test]
    fn test_decode() {
        let input = RawFile::new("voice/v001", audio_bytes(b"OggS-stream"));
        assert!(AudioDecoder.is_recognized(&input));

        let output = AudioDecoder.decode(input).unwrap();
        assert_eq!(output.name, "voice/v001.ogg");
        assert_eq!(output.data, b"OggS-stream");
    }

    #[test]
    fn test_not_recognized() {
        assert!(!AudioDecoder.is_recognized(&RawFile::new("a", b"OggS".to_vec())));
        assert!(!AudioDecoder.is_recognized(&RawFile::new("a", b"\x40\0\0\0bw".to_vec())));
        assert!(!AudioDecoder.is_recognized(&RawFile::new("a", Vec::new())));
    }

    #[test]
    fn test_truncated_stream() {
        let mut bytes = audio_bytes(b"OggS-stream");
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            AudioDecoder.decode(RawFile::new("a", bytes)),
            Err(Error::Common(CommonError::TruncatedInput { .. }))
        ));
    }

    #[test]
    fn test_header_size_past_end() {
        let mut bytes = audio_bytes(b"");
        bytes[0] = 0xFF;
        assert!(matches!(
            AudioDecoder.decode(RawFile::new("a", bytes)),
            Err(Error::Common(CommonError::OutOfBounds { .. }))
        ));
    }
}
