//! LZSS as used by NScripter archives.
//!
//! The stream is read MSB-first. A 1 bit is followed by an 8-bit literal; a 0
//! bit by an 8-bit dictionary position and a 4-bit length, copying
//! `length + 2` bytes. The 256-byte dictionary starts zero-filled with the
//! write position at 239, and every output byte is also written to it.

use kura_fmt::{Error, Result};

const DICTIONARY_SIZE: usize = 256;
const DICTIONARY_START: usize = 239;
const MIN_MATCH: usize = 2;

/// Most output a single input byte can produce: a 13-bit reference yields
/// up to 17 bytes.
const MAX_EXPANSION: usize = 11;

struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    fn read(&mut self, count: usize) -> Option<usize> {
        let mut value = 0;
        for _ in 0..count {
            let byte = *self.data.get(self.position / 8)?;
            let bit = (byte >> (7 - self.position % 8)) & 1;
            value = (value << 1) | bit as usize;
            self.position += 1;
        }
        Some(value)
    }
}

/// Decode `data` into exactly `output_len` bytes.
pub fn decode(data: &[u8], output_len: usize) -> Result<Vec<u8>> {
    let mut bits = BitReader::new(data);
    let mut dictionary = [0u8; DICTIONARY_SIZE];
    let mut cursor = DICTIONARY_START;
    let capacity = output_len.min(data.len().saturating_mul(MAX_EXPANSION));
    let mut output = Vec::with_capacity(capacity);

    let truncated = || Error::Decompression("LZSS stream ends early".to_string());

    while output.len() < output_len {
        if bits.read(1).ok_or_else(truncated)? == 1 {
            let byte = bits.read(8).ok_or_else(truncated)? as u8;
            output.push(byte);
            dictionary[cursor % DICTIONARY_SIZE] = byte;
            cursor += 1;
        } else {
            let position = bits.read(8).ok_or_else(truncated)?;
            let length = bits.read(4).ok_or_else(truncated)? + MIN_MATCH;
            for k in 0..length {
                if output.len() == output_len {
                    break;
                }
                let byte = dictionary[(position + k) % DICTIONARY_SIZE];
                output.push(byte);
                dictionary[cursor % DICTIONARY_SIZE] = byte;
                cursor += 1;
            }
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_and_overlapping_reference() {
        // 'A', 'B', then 3 bytes from position 239: "ABA"
        let data = [0xA0, 0xD0, 0x9D, 0xE2];
        assert_eq!(decode(&data, 5).unwrap(), b"ABABA");
    }

    #[test]
    fn test_reference_into_zeroed_dictionary() {
        // one reference to position 0, length 0 + 2
        let data = [0x00, 0x00];
        assert_eq!(decode(&data, 2).unwrap(), [0, 0]);
    }

    #[test]
    fn test_stops_at_output_len() {
        let data = [0xA0, 0xD0, 0x9D, 0xE2];
        assert_eq!(decode(&data, 3).unwrap(), b"ABA");
        assert!(decode(&data, 0).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_stream() {
        assert!(matches!(decode(&[0xA0], 2), Err(Error::Decompression(_))));
        assert!(matches!(decode(&[], 1), Err(Error::Decompression(_))));
    }

    #[test]
    fn test_huge_declared_length() {
        let data = [0xA0, 0xD0, 0x9D, 0xE2];
        assert!(matches!(
            decode(&data, u32::MAX as usize),
            Err(Error::Decompression(_))
        ));
    }
}
