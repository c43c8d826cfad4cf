//! Touhou Project containers.

pub mod pak1;

pub use pak1::Pak1ArchiveDecoder;
