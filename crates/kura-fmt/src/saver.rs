//! Sinks receiving decoded files.

use kura_common::RawFile;

use crate::Result;

/// Receives files as they are decoded.
///
/// A failing `save` aborts the unpack it is part of.
pub trait FileSaver {
    /// Take ownership of one output file.
    fn save(&mut self, file: RawFile) -> Result<()>;
}

impl<S: FileSaver + ?Sized> FileSaver for &mut S {
    fn save(&mut self, file: RawFile) -> Result<()> {
        (**self).save(file)
    }
}

/// Collects files in memory, in the order they were saved.
#[derive(Debug, Default)]
pub struct MemorySaver {
    files: Vec<RawFile>,
}

impl MemorySaver {
    /// Create an empty saver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the saved files.
    #[inline]
    pub fn files(&self) -> &[RawFile] {
        &self.files
    }

    /// Take the saved files.
    #[inline]
    pub fn into_files(self) -> Vec<RawFile> {
        self.files
    }

    /// Get the number of saved files.
    #[inline]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if nothing was saved.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileSaver for MemorySaver {
    fn save(&mut self, file: RawFile) -> Result<()> {
        self.files.push(file);
        Ok(())
    }
}

/// Holds files back until [`commit`](BufferedSaver::commit) is called.
///
/// Wrapping a sink in this gives all-or-nothing output: if the unpack fails,
/// the buffered saver is dropped and the inner sink never sees a file.
pub struct BufferedSaver<'a> {
    inner: &'a mut dyn FileSaver,
    pending: Vec<RawFile>,
}

impl<'a> BufferedSaver<'a> {
    /// Buffer files destined for `inner`.
    pub fn new(inner: &'a mut dyn FileSaver) -> Self {
        Self {
            inner,
            pending: Vec::new(),
        }
    }

    /// Get the number of files waiting for commit.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Forward every buffered file to the inner sink, in order.
    pub fn commit(self) -> Result<()> {
        let Self { inner, pending } = self;
        for file in pending {
            inner.save(file)?;
        }
        Ok(())
    }
}

impl FileSaver for BufferedSaver<'_> {
    fn save(&mut self, file: RawFile) -> Result<()> {
        self.pending.push(file);
        Ok(())
    }
}
