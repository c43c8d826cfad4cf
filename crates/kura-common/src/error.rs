//! Error types for kura-common.

use thiserror::Error;

/// Errors raised while reading container bytes.
#[derive(Debug, Error)]
pub enum Error {
    /// Fewer bytes available than a read required.
    #[error("truncated input: needed {needed} bytes but only {available} available")]
    TruncatedInput { needed: usize, available: usize },

    /// Seek target outside the buffer.
    #[error("seek to {position} is out of bounds (length {len})")]
    OutOfBounds { position: usize, len: usize },

    /// A table entry points past the end of the container.
    #[error("bad data offset for {name:?}: {offset:#x}+{size:#x} past end {container_len:#x}")]
    BadDataOffset {
        name: String,
        offset: u64,
        size: u64,
        container_len: usize,
    },

    /// Invalid magic bytes encountered.
    #[error("invalid magic: expected {expected:?}, got {actual:?}")]
    InvalidMagic { expected: Vec<u8>, actual: Vec<u8> },

    /// The input is structurally not the format being probed.
    #[error("not recognized: {0}")]
    NotRecognized(&'static str),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
