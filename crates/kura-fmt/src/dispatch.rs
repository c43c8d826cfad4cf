//! Recursive dispatch of inputs and extracted payloads.
//!
//! The [`Dispatcher`] picks a decoder for the input (by name, or by probing
//! the registry), runs it, and passes every payload an archive produces
//! through that archive's own sub-registry before it reaches the sink.
//! Payloads recognized as archives are unpacked in turn, with their outputs
//! named `<payload name>/<entry name>`.

use kura_common::{RawFile, Table};

use crate::{ArchiveDecoder, Decoder, Error, FileSaver, Registry, Result};

/// Default limit on nested archive depth.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Options controlling a dispatch.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Decode with this format instead of probing the registry.
    pub format: Option<String>,
    /// Run extracted payloads through the owning archive's sub-decoders.
    pub recurse: bool,
    /// Maximum archive nesting depth; the input archive is depth 1.
    pub max_depth: usize,
    /// Guess extensions of payloads no sub-decoder claimed.
    pub guess_extensions: bool,
    /// Try registry candidates and extract entries on the rayon pool (needs the
    /// `parallel` feature).
    pub parallel: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            format: None,
            recurse: true,
            max_depth: DEFAULT_MAX_DEPTH,
            guess_extensions: true,
            parallel: false,
        }
    }
}

impl DispatchOptions {
    /// Force a format by name.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Enable or disable payload sub-decoding.
    pub fn with_recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    /// Set the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable extension guessing.
    pub fn with_guess_extensions(mut self, guess: bool) -> Self {
        self.guess_extensions = guess;
        self
    }

    /// Enable or disable parallel entry extraction.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Drives decoding of one input at a time against a registry.
///
/// # Example
///
/// ```no_run
/// use kura_common::RawFile;
/// use kura_fmt::{Dispatcher, MemorySaver, Registry};
///
/// let registry = Registry::new();
/// let input = RawFile::new("data.arc", std::fs::read("data.arc")?);
///
/// let mut saver = MemorySaver::new();
/// let format = Dispatcher::new(&registry).dispatch(input, &mut saver)?;
/// println!("{format}: {} files", saver.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Dispatcher<'r> {
    registry: &'r Registry,
    options: DispatchOptions,
}

impl<'r> Dispatcher<'r> {
    /// Create a dispatcher with default options.
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_options(registry, DispatchOptions::default())
    }

    /// Create a dispatcher with explicit options.
    pub fn with_options(registry: &'r Registry, options: DispatchOptions) -> Self {
        Self { registry, options }
    }

    /// Choose the decoder for `input`.
    ///
    /// Uses the forced format when one is set, otherwise the first decoder in
    /// the registry that recognizes the input.
    pub fn select(&self, input: &RawFile) -> Result<(String, Decoder)> {
        match &self.options.format {
            Some(format) => self
                .registry
                .get(format)
                .map(|decoder| (format.clone(), decoder))
                .ok_or_else(|| Error::UnknownFormat(format.clone())),
            None => self
                .resolve(input)
                .map(|(name, decoder)| (name.to_string(), decoder))
                .ok_or(Error::NoMatchingDecoder),
        }
    }

    #[cfg(feature = "parallel")]
    fn resolve(&self, input: &RawFile) -> Option<(&'r str, Decoder)> {
        if self.options.parallel {
            self.registry.resolve_parallel(input)
        } else {
            self.registry.resolve(input)
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn resolve(&self, input: &RawFile) -> Option<(&'r str, Decoder)> {
        self.registry.resolve(input)
    }

    /// Decode `input` into `saver`, returning the name of the format used.
    ///
    /// Any error aborts the whole operation. Files already handed to `saver`
    /// stay there; wrap it in a [`BufferedSaver`](crate::BufferedSaver) for
    /// all-or-nothing output.
    pub fn dispatch(&self, input: RawFile, saver: &mut dyn FileSaver) -> Result<String> {
        let (format, decoder) = self.select(&input)?;
        log::info!("{}: decoding as {}", input.name, format);

        match decoder {
            Decoder::Archive(archive) => {
                let mut payloads = PayloadSaver {
                    dispatcher: self,
                    sub_decoders: archive.sub_decoders(),
                    parent: None,
                    depth: 1,
                    inner: saver,
                };
                self.unpack_archive(archive.as_ref(), &input, &mut payloads)?;
            }
            Decoder::File(decoder) => saver.save(decoder.decode(input)?)?,
        }
        Ok(format)
    }

    /// Read the table of an archive input without extracting anything.
    pub fn list(&self, input: &RawFile) -> Result<(String, Table)> {
        let (format, decoder) = self.select(input)?;
        match decoder.as_archive() {
            Some(archive) => Ok((format, archive.list(input)?)),
            None => Err(Error::NotAnArchive(format)),
        }
    }

    #[cfg(feature = "parallel")]
    fn unpack_archive(
        &self,
        archive: &dyn ArchiveDecoder,
        input: &RawFile,
        saver: &mut dyn FileSaver,
    ) -> Result<()> {
        if self.options.parallel {
            archive.unpack_parallel(input, saver)
        } else {
            archive.unpack(input, saver)
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn unpack_archive(
        &self,
        archive: &dyn ArchiveDecoder,
        input: &RawFile,
        saver: &mut dyn FileSaver,
    ) -> Result<()> {
        archive.unpack(input, saver)
    }

    fn process_payload(
        &self,
        mut file: RawFile,
        sub_decoders: Option<&Registry>,
        parent: Option<&str>,
        depth: usize,
        inner: &mut dyn FileSaver,
    ) -> Result<()> {
        if let Some(parent) = parent {
            file.nest_under(parent);
        }

        let matched = match sub_decoders {
            Some(registry) if self.options.recurse => registry.resolve(&file),
            _ => None,
        };

        match matched {
            Some((name, Decoder::File(decoder))) => {
                log::debug!("{}: decoding payload as {}", file.name, name);
                inner.save(decoder.decode(file)?)
            }
            Some((name, Decoder::Archive(archive))) => {
                if depth >= self.options.max_depth {
                    return Err(Error::NestingTooDeep {
                        depth: self.options.max_depth,
                    });
                }
                log::debug!("{}: unpacking nested {} archive", file.name, name);
                let mut nested = PayloadSaver {
                    dispatcher: self,
                    sub_decoders: archive.sub_decoders(),
                    parent: Some(&file.name),
                    depth: depth + 1,
                    inner,
                };
                archive.unpack(&file, &mut nested)
            }
            None => {
                if self.options.guess_extensions
                    && !file.guess_extension()
                    && file.extension().is_none()
                {
                    log::warn!("{}: unknown payload type", file.name);
                }
                inner.save(file)
            }
        }
    }
}

/// Sink handed to an archive: post-processes payloads, then forwards them.
struct PayloadSaver<'d, 's> {
    dispatcher: &'d Dispatcher<'d>,
    sub_decoders: Option<&'d Registry>,
    parent: Option<&'d str>,
    depth: usize,
    inner: &'s mut dyn FileSaver,
}

impl FileSaver for PayloadSaver<'_, '_> {
    fn save(&mut self, file: RawFile) -> Result<()> {
        self.dispatcher.process_payload(
            file,
            self.sub_decoders,
            self.parent,
            self.depth,
            &mut *self.inner,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{archive_bytes, TestArchive, UpperDecoder};
    use crate::{BufferedSaver, MemorySaver};
    use kura_common::Error as CommonError;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.add_file::<UpperDecoder>("test/upper").unwrap();
        registry
            .add("test/archive", || Decoder::Archive(Box::new(TestArchive::nesting())))
            .unwrap();
        registry
    }

    fn names(saver: &MemorySaver) -> Vec<&str> {
        saver.files().iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_dispatch_file_decoder() {
        let registry = registry();
        let mut saver = MemorySaver::new();
        let format = Dispatcher::new(&registry)
            .dispatch(RawFile::new("note", b"UP:hi".to_vec()), &mut saver)
            .unwrap();

        assert_eq!(format, "test/upper");
        assert_eq!(saver.files()[0].data, b"HI");
        assert_eq!(saver.files()[0].name, "note.txt");
    }

    #[test]
    fn test_no_matching_decoder() {
        let registry = registry();
        let mut saver = MemorySaver::new();
        let err = Dispatcher::new(&registry)
            .dispatch(RawFile::new("x", b"???".to_vec()), &mut saver)
            .unwrap_err();
        assert!(matches!(err, Error::NoMatchingDecoder));
    }

    #[test]
    fn test_unknown_forced_format() {
        let registry = registry();
        let options = DispatchOptions::default().with_format("nope");
        let mut saver = MemorySaver::new();
        let err = Dispatcher::with_options(&registry, options)
            .dispatch(RawFile::new("x", b"UP:a".to_vec()), &mut saver)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFormat(name) if name == "nope"));
    }

    #[test]
    fn test_payloads_are_sub_decoded_and_nested() {
        let inner = archive_bytes(&[("deep", "UP:deep")]);
        let outer = archive_bytes(&[
            ("a", b"UP:abc".to_vec()),
            ("inner", inner),
            ("raw", b"\x89PNG....".to_vec()),
        ]);

        let registry = registry();
        let mut saver = MemorySaver::new();
        Dispatcher::new(&registry)
            .dispatch(RawFile::new("outer.tst", outer), &mut saver)
            .unwrap();

        assert_eq!(names(&saver), ["a.txt", "inner/deep.txt", "raw.png"]);
        assert_eq!(saver.files()[1].data, b"DEEP");
    }

    #[test]
    fn test_no_recurse_keeps_payloads() {
        let outer = archive_bytes(&[("a", "UP:abc")]);
        let registry = registry();
        let options = DispatchOptions::default()
            .with_recurse(false)
            .with_guess_extensions(false);

        let mut saver = MemorySaver::new();
        Dispatcher::with_options(&registry, options)
            .dispatch(RawFile::new("outer.tst", outer), &mut saver)
            .unwrap();

        assert_eq!(names(&saver), ["a"]);
        assert_eq!(saver.files()[0].data, b"UP:abc");
    }

    #[test]
    fn test_nesting_depth_limit() {
        let mut data = archive_bytes(&[("leaf", "UP:x")]);
        for level in 0..4 {
            data = archive_bytes(&[(format!("l{level}"), data)]);
        }

        let registry = registry();
        let mut saver = MemorySaver::new();
        Dispatcher::new(&registry)
            .dispatch(RawFile::new("top", data.clone()), &mut saver)
            .unwrap();
        assert_eq!(names(&saver), ["l3/l2/l1/l0/leaf.txt"]);

        let options = DispatchOptions::default().with_max_depth(3);
        let mut saver = MemorySaver::new();
        let err = Dispatcher::with_options(&registry, options)
            .dispatch(RawFile::new("top", data), &mut saver)
            .unwrap_err();
        assert!(matches!(err, Error::NestingTooDeep { depth: 3 }));
    }

    #[test]
    fn test_failed_unpack_with_buffered_saver_emits_nothing() {
        let mut data = archive_bytes(&[("a", "UP:a"), ("b", "UP:b")]);
        // header, first record, second name
        let size_pos = 8 + 16 + 8;
        data[size_pos..size_pos + 4].copy_from_slice(&u32::MAX.to_le_bytes());

        let registry = registry();
        let options = DispatchOptions::default().with_format("test/archive");
        let mut memory = MemorySaver::new();
        let mut buffered = BufferedSaver::new(&mut memory);
        let err = Dispatcher::with_options(&registry, options)
            .dispatch(RawFile::new("bad", data), &mut buffered)
            .unwrap_err();
        drop(buffered);

        assert!(matches!(
            err,
            Error::Common(CommonError::BadDataOffset { .. })
        ));
        assert!(memory.is_empty());
    }

    #[test]
    fn test_list() {
        let registry = registry();
        let dispatcher = Dispatcher::new(&registry);
        let input = RawFile::new("a.tst", archive_bytes(&[("x", "12"), ("y", "345")]));

        let (format, table) = dispatcher.list(&input).unwrap();
        assert_eq!(format, "test/archive");
        assert_eq!(table.len(), 2);
        assert_eq!(table[1].size, 3);

        let err = dispatcher.list(&RawFile::new("n", b"UP:a".to_vec())).unwrap_err();
        assert!(matches!(err, Error::NotAnArchive(_)));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_dispatch_matches_sequential() {
        let entries: Vec<(String, String)> = (0..20)
            .map(|i| (format!("f{i}"), format!("UP:{i}")))
            .collect();
        let data = archive_bytes(&entries);
        let registry = registry();

        let mut sequential = MemorySaver::new();
        Dispatcher::new(&registry)
            .dispatch(RawFile::new("a", data.clone()), &mut sequential)
            .unwrap();

        let mut parallel = MemorySaver::new();
        Dispatcher::with_options(&registry, DispatchOptions::default().with_parallel(true))
            .dispatch(RawFile::new("a", data), &mut parallel)
            .unwrap();

        assert_eq!(sequential.files(), parallel.files());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_select_matches_sequential() {
        let registry = registry();
        let sequential = Dispatcher::new(&registry);
        let parallel =
            Dispatcher::with_options(&registry, DispatchOptions::default().with_parallel(true));

        let inputs = [
            RawFile::new("n", b"UP:a".to_vec()),
            RawFile::new("a.tst", archive_bytes(&[("x", "12")])),
        ];
        for input in &inputs {
            assert_eq!(
                parallel.select(input).unwrap().0,
                sequential.select(input).unwrap().0
            );
        }
        assert!(matches!(
            parallel.select(&RawFile::new("x", b"???".to_vec())),
            Err(Error::NoMatchingDecoder)
        ));
    }
}
