//! Decoder framework for game resource containers.
//!
//! This crate defines how formats plug in and how inputs flow through them:
//!
//! - [`FileDecoder`] / [`ArchiveDecoder`] - the two decoder capabilities
//! - [`Registry`] - ordered, named decoder factories with first-match probing
//! - [`Dispatcher`] - selects a decoder, unpacks, and re-dispatches payloads
//!   through the owning archive's sub-decoders
//! - [`FileSaver`] - the sink outputs are delivered to
//! - [`PayloadRule`] - name-keyed payload decryption
//!
//! Recognition never fails loudly: `is_recognized` converts any parse error
//! into `false`. Decoding never hides errors: `decode` and `unpack` return
//! them unchanged and the dispatcher aborts on the first one.
//!
//! # Example
//!
//! ```no_run
//! use kura_common::RawFile;
//! use kura_fmt::{BufferedSaver, Dispatcher, MemorySaver, Registry};
//!
//! # fn formats() -> Registry { Registry::new() }
//! let registry = formats();
//! let input = RawFile::new("data.pak", std::fs::read("data.pak")?);
//!
//! let mut memory = MemorySaver::new();
//! let mut buffered = BufferedSaver::new(&mut memory);
//! Dispatcher::new(&registry).dispatch(input, &mut buffered)?;
//! buffered.commit()?;
//!
//! for file in memory.files() {
//!     println!("{}: {} bytes", file.name, file.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod decoder;
mod dispatch;
mod error;
mod payload;
mod registry;
mod saver;

#[cfg(test)]
mod testing;

pub use decoder::{read_entry_data, ArchiveDecoder, Decoder, FileDecoder};
pub use dispatch::{DispatchOptions, Dispatcher, DEFAULT_MAX_DEPTH};
pub use error::{Error, Result};
pub use payload::{apply_payload_rules, PayloadRule};
pub use registry::{DecoderDescriptor, DecoderFactory, Registry};
pub use saver::{BufferedSaver, FileSaver, MemorySaver};
