//! Ordered registry of named decoder factories.

use kura_common::RawFile;
use rustc_hash::FxHashMap;

use crate::{ArchiveDecoder, Decoder, Error, FileDecoder, Result};

/// Builds a fresh decoder instance.
pub type DecoderFactory = Box<dyn Fn() -> Decoder + Send + Sync>;

/// A registered format: its name and how to instantiate its decoder.
pub struct DecoderDescriptor {
    name: String,
    factory: DecoderFactory,
}

impl DecoderDescriptor {
    /// Get the format name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a new decoder instance.
    #[inline]
    pub fn instantiate(&self) -> Decoder {
        (self.factory)()
    }
}

/// Maps format names to decoders, in registration order.
///
/// When several formats recognize the same input, the one registered first
/// wins. The registry holds no mutable state after construction and can be
/// shared across threads.
///
/// # Example
///
/// ```
/// use kura_common::RawFile;
/// use kura_fmt::{FileDecoder, Registry, Result};
///
/// #[derive(Default)]
/// struct Plain;
///
/// impl FileDecoder for Plain {
///     fn recognize(&self, input: &RawFile) -> Result<()> {
///         Ok(input.cursor().expect_magic(b"TXT")?)
///     }
///
///     fn decode(&self, input: RawFile) -> Result<RawFile> {
///         Ok(input)
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry.add_file::<Plain>("plain")?;
///
/// let input = RawFile::new("a", b"TXT hello".to_vec());
/// let (name, _) = registry.resolve(&input).unwrap();
/// assert_eq!(name, "plain");
/// # Ok::<(), kura_fmt::Error>(())
/// ```
#[derive(Default)]
pub struct Registry {
    descriptors: Vec<DecoderDescriptor>,
    index: FxHashMap<String, usize>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a format.
    ///
    /// Fails with [`Error::DuplicateName`] if `name` is already taken.
    pub fn add<F>(&mut self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn() -> Decoder + Send + Sync + 'static,
    {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateName(name));
        }
        self.index.insert(name.clone(), self.descriptors.len());
        self.descriptors.push(DecoderDescriptor {
            name,
            factory: Box::new(factory),
        });
        Ok(())
    }

    /// Register a default-constructible file decoder.
    pub fn add_file<D>(&mut self, name: impl Into<String>) -> Result<()>
    where
        D: FileDecoder + Default + 'static,
    {
        self.add(name, || Decoder::File(Box::new(D::default())))
    }

    /// Register a default-constructible archive decoder.
    pub fn add_archive<A>(&mut self, name: impl Into<String>) -> Result<()>
    where
        A: ArchiveDecoder + Default + 'static,
    {
        self.add(name, || Decoder::Archive(Box::new(A::default())))
    }

    /// Instantiate the decoder registered as `name`.
    pub fn get(&self, name: &str) -> Option<Decoder> {
        self.index
            .get(name)
            .map(|&i| self.descriptors[i].instantiate())
    }

    /// Find the first registered decoder that recognizes `input`.
    pub fn resolve(&self, input: &RawFile) -> Option<(&str, Decoder)> {
        self.descriptors.iter().find_map(|descriptor| {
            let decoder = descriptor.instantiate();
            let recognized = decoder.is_recognized(input);
            log::debug!(
                "{}: {} {}",
                input.name,
                descriptor.name(),
                if recognized { "recognized" } else { "rejected" }
            );
            recognized.then(|| (descriptor.name(), decoder))
        })
    }

    /// Like [`resolve`](Registry::resolve), probing all candidates on the
    /// rayon pool.
    ///
    /// The earliest registered match is returned regardless of which probe
    /// finishes first.
    #[cfg(feature = "parallel")]
    pub fn resolve_parallel(&self, input: &RawFile) -> Option<(&str, Decoder)> {
        use rayon::prelude::*;

        let index = self
            .descriptors
            .par_iter()
            .position_first(|descriptor| descriptor.instantiate().is_recognized(input))?;
        let descriptor = &self.descriptors[index];
        Some((descriptor.name(), descriptor.instantiate()))
    }

    /// Check if `name` is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate over format names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.descriptors.iter().map(DecoderDescriptor::name)
    }

    /// Iterate over descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &DecoderDescriptor> + '_ {
        self.descriptors.iter()
    }

    /// Get the number of registered formats.
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if no format is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
