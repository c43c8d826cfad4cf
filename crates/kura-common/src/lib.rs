//! Common utilities for Kura.
//!
//! This crate provides the low-level building blocks every archive format
//! is parsed with:
//!
//! - [`ByteCursor`] - Bounded, seekable reading over a byte slice
//! - [`StreamCipher`] - Rolling-key XOR transform used to obscure tables and payloads
//! - [`TableReader`] - Fixed-width file table parsing with offset validation
//! - [`RawFile`] - A named, owned payload travelling between decoders

mod cipher;
mod error;
mod file;
mod reader;
mod table;

pub use cipher::{transform, StreamCipher};
pub use error::{Error, Result};
pub use file::{sniff_extension, RawFile};
pub use reader::{decode_name, ByteCursor};
pub use table::{EntryLayout, FieldOrder, OffsetBase, Packing, Table, TableEntry, TableReader};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
