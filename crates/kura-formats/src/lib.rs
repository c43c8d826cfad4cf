//! Container formats.
//!
//! | Name             | Container                  |
//! |------------------|----------------------------|
//! | `bgi/arc`        | BGI `PackFile    ` archive |
//! | `bgi/arc20`      | BGI `BURIKO ARC20` archive |
//! | `nitroplus/pak2` | Nitroplus PAK, revision 2  |
//! | `bgi/audio`      | BGI `bw  ` audio wrapper   |
//! | `th/pak1`        | Touhou PAK1 archive        |
//! | `nsa`            | NScripter NSA archive      |
//!
//! [`default_registry`] registers them in this order: formats with a
//! signature first, formats recognized by their table alone last.

use std::sync::Arc;

use kura_fmt::{Decoder, Registry, Result};

pub mod bgi;
mod compression;
pub mod nitroplus;
pub mod nscripter;
pub mod touhou;

use bgi::{ArcArchiveDecoder, ArcVersion};

/// Build a registry holding every supported format.
pub fn default_registry() -> Result<Registry> {
    let bgi_payloads = Arc::new(bgi::payload_registry()?);
    let mut registry = Registry::new();

    let arc_versions = [
        (bgi::arc::NAME, ArcVersion::V1),
        (bgi::arc::NAME_ARC20, ArcVersion::Arc20),
    ];
    for (name, version) in arc_versions {
        let payloads = Arc::clone(&bgi_payloads);
        registry.add(name, move || {
            Decoder::Archive(Box::new(ArcArchiveDecoder::new(version, Arc::clone(&payloads))))
        })?;
    }
    registry.add_archive::<nitroplus::Pak2ArchiveDecoder>(nitroplus::pak2::NAME)?;
    registry.add_file::<bgi::AudioDecoder>(bgi::audio::NAME)?;
    registry.add_archive::<touhou::Pak1ArchiveDecoder>(touhou::pak1::NAME)?;
    registry.add_archive::<nscripter::NsaArchiveDecoder>(nscripter::nsa::NAME)?;

    Ok(registry)
}
