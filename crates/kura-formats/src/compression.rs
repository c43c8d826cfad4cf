//! Decompression helpers shared by the formats.

use std::io::Read;

use flate2::read::ZlibDecoder;
use kura_fmt::{Error, Result};

/// Upper bound on how much the buffer is grown ahead of inflating, per
/// input byte. Declared sizes come from untrusted headers.
const MAX_PREALLOCATION_RATIO: usize = 4;

/// Inflate a zlib stream that is declared to unpack to `expected_size` bytes.
///
/// At most one byte more than declared is inflated, so a lying size field
/// cannot make the output grow without bound.
pub fn inflate_zlib_sized(name: &str, data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let capacity = expected_size.min(data.len().saturating_mul(MAX_PREALLOCATION_RATIO));
    let mut output = Vec::with_capacity(capacity);
    ZlibDecoder::new(data)
        .take((expected_size as u64).saturating_add(1))
        .read_to_end(&mut output)
        .map_err(|e| Error::Decompression(format!("{name}: {e}")))?;

    check_size(name, expected_size, output.len())?;
    Ok(output)
}

/// Fail with `SizeMismatch` unless `actual == expected`.
pub fn check_size(name: &str, expected: usize, actual: usize) -> Result<()> {
    if actual != expected {
        return Err(Error::SizeMismatch {
            name: name.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn deflate_zlib(data: &[u8]) -> Vec<u8> {
    use std::io::Write;

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inflate_sized() {
        let packed = deflate_zlib(b"hello hello hello");
        assert_eq!(inflate_zlib_sized("t", &packed, 17).unwrap(), b"hello hello hello");
    }

    #[test]
    fn test_inflate_size_mismatch() {
        let packed = deflate_zlib(b"hello hello hello");
        assert!(matches!(
            inflate_zlib_sized("t", &packed, 4),
            Err(Error::SizeMismatch { expected: 4, actual: 5, .. })
        ));
        assert!(matches!(
            inflate_zlib_sized("t", &packed, 20),
            Err(Error::SizeMismatch { expected: 20, actual: 17, .. })
        ));
    }

    #[test]
    fn test_inflate_huge_declared_size() {
        let packed = deflate_zlib(b"tiny");
        assert!(matches!(
            inflate_zlib_sized("t", &packed, u32::MAX as usize),
            Err(Error::SizeMismatch { actual: 4, .. })
        ));
        assert!(matches!(
            inflate_zlib_sized("t", &[], usize::MAX),
            Err(Error::Decompression(_) | Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_inflate_garbage() {
        assert!(matches!(
            inflate_zlib_sized("t", b"not zlib", 8),
            Err(Error::Decompression(_))
        ));
    }
}
