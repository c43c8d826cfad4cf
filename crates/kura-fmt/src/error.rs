//! Error types for the decoder framework.

use thiserror::Error;

/// Errors that can occur while decoding or unpacking.
#[derive(Debug, Error)]
pub enum Error {
    /// Cursor, table or recognition error.
    #[error("{0}")]
    Common(#[from] kura_common::Error),

    /// I/O error, typically raised by a sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The container was recognized but uses a revision that is not handled.
    #[error("unsupported variant: {0}")]
    UnsupportedVariant(String),

    /// A format name was registered twice.
    #[error("decoder {0:?} is already registered")]
    DuplicateName(String),

    /// No registered decoder recognized the input.
    #[error("no matching decoder")]
    NoMatchingDecoder,

    /// A format was requested by name but is not registered.
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// An archive-only operation was asked of a file decoder.
    #[error("{0} is not an archive format")]
    NotAnArchive(String),

    /// Archives nested deeper than the configured limit.
    #[error("archive nesting exceeds depth {depth}")]
    NestingTooDeep { depth: usize },

    /// Decompression error.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// A payload did not have the size its table declared.
    #[error("size mismatch for {name:?}: expected {expected}, got {actual}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Result type for decoder operations.
pub type Result<T> = std::result::Result<T, Error>;
