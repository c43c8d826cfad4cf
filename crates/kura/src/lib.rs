//! Kura - game resource container extraction library.
//!
//! This crate provides a unified interface to the Kura library ecosystem.
//!
//! # Crates
//!
//! - [`kura_common`] - Byte cursor, rolling cipher, fixed-width table reader
//! - [`kura_fmt`] - Decoder traits, registry, recursive dispatcher, sinks
//! - [`kura_formats`] - Touhou, BGI, NScripter and Nitroplus containers
//!
//! # Example
//!
//! ```no_run
//! use kura::prelude::*;
//!
//! let registry = default_registry()?;
//! let input = RawFile::new("data.arc", std::fs::read("data.arc")?);
//!
//! let mut saver = MemorySaver::new();
//! let format = Dispatcher::new(&registry).dispatch(input, &mut saver)?;
//! println!("{format}: {} files", saver.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use kura_common as common;
pub use kura_fmt as fmt;
pub use kura_formats as formats;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use kura_common::{ByteCursor, RawFile, StreamCipher, Table, TableEntry, TableReader};
    pub use kura_fmt::{
        ArchiveDecoder, BufferedSaver, Decoder, DispatchOptions, Dispatcher, FileDecoder,
        FileSaver, MemorySaver, Registry,
    };
    pub use kura_formats::default_registry;
}

pub use kura_formats::default_registry;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
