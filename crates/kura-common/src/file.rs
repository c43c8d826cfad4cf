//! Named payloads travelling between decoders.

use crate::ByteCursor;

/// Signatures used to guess an extension for payloads no decoder claimed.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG", "png"),
    (b"\xFF\xD8\xFF", "jpg"),
    (b"GIF8", "gif"),
    (b"OggS", "ogg"),
    (b"DDS ", "dds"),
    (b"PK\x03\x04", "zip"),
    (b"PackFile", "arc"),
    (b"BURIKO ARC20", "arc"),
    (b"ID3", "mp3"),
];

/// A file recovered from a container or handed in from outside.
///
/// The name may contain `/`-separated segments when the file came out of a
/// nested archive. The buffer is always owned; it never aliases the
/// container it was cut from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    /// File name/path, `/`-separated.
    pub name: String,
    /// File contents.
    pub data: Vec<u8>,
}

impl RawFile {
    /// Create a new file.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// A fresh cursor over the contents, positioned at 0.
    #[inline]
    pub fn cursor(&self) -> ByteCursor<'_> {
        ByteCursor::new(&self.data)
    }

    /// Size of the contents in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the file has no contents.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the file extension, if any, without the leading dot.
    pub fn extension(&self) -> Option<&str> {
        let base = self.base_name();
        match base.rfind('.') {
            Some(dot) if dot > 0 => Some(&base[dot + 1..]),
            _ => None,
        }
    }

    /// Replace (or add) the extension. A leading dot in `extension` is ignored.
    pub fn change_extension(&mut self, extension: &str) {
        let extension = extension.trim_start_matches('.');
        let base_start = self.name.len() - self.base_name().len();
        if let Some(dot) = self.name[base_start..].rfind('.').filter(|&dot| dot > 0) {
            self.name.truncate(base_start + dot);
        }
        if !extension.is_empty() {
            self.name.push('.');
            self.name.push_str(extension);
        }
    }

    /// Set the extension from the content signature, if one is known.
    ///
    /// Returns `true` when a signature matched.
    pub fn guess_extension(&mut self) -> bool {
        match sniff_extension(&self.data) {
            Some(extension) => {
                if self.extension() != Some(extension) {
                    self.change_extension(extension);
                }
                true
            }
            None => false,
        }
    }

    /// Prefix the name with the name of the container it came from.
    pub fn nest_under(&mut self, parent: &str) {
        if !parent.is_empty() {
            self.name = format!("{}/{}", parent.trim_end_matches('/'), self.name);
        }
    }

    fn base_name(&self) -> &str {
        match self.name.rfind(['/', '\\']) {
            Some(slash) => &self.name[slash + 1..],
            None => &self.name,
        }
    }
}

/// Guess a file extension from leading magic bytes.
pub fn sniff_extension(data: &[u8]) -> Option<&'static str> {
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WAVE" {
        return Some("wav");
    }
    if data.len() >= 14 && data.starts_with(b"BM") {
        return Some("bmp");
    }
    SIGNATURES
        .iter()
        .find(|(magic, _)| data.starts_with(magic))
        .map(|&(_, extension)| extension)
}
