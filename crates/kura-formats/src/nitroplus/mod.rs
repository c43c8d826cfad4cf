//! Nitroplus containers.

pub mod pak2;

pub use pak2::Pak2ArchiveDecoder;
