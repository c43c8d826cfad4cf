//! NScripter containers.

pub mod lzss;
pub mod nsa;

pub use nsa::NsaArchiveDecoder;
