//! Buriko General Interpreter containers.

pub mod arc;
pub mod audio;

pub use arc::{ArcArchiveDecoder, ArcVersion};
pub use audio::AudioDecoder;

use kura_fmt::{Registry, Result};

/// Decoders tried on payloads extracted from BGI archives.
pub fn payload_registry() -> Result<Registry> {
    let mut registry = Registry::new();
    registry.add_file::<AudioDecoder>(audio::NAME)?;
    Ok(registry)
}
