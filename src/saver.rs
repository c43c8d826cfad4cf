//! Filesystem sink for extracted files.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use kura::common::RawFile;
use kura::fmt::{FileSaver, Result};

/// Writes files below a root directory.
///
/// Names come from untrusted archives, so they are rebuilt component by
/// component: `\` is treated as a separator, empty and `.` segments are
/// dropped, and anything that would leave the root is rejected.
pub struct FsSaver {
    root: PathBuf,
    filter: Option<glob::Pattern>,
    written: usize,
    skipped: usize,
}

impl FsSaver {
    /// Create a saver writing below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            filter: None,
            written: 0,
            skipped: 0,
        }
    }

    /// Only write files whose name matches `pattern`.
    pub fn with_filter(mut self, pattern: Option<glob::Pattern>) -> Self {
        self.filter = pattern;
        self
    }

    /// Number of files written.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Number of files the filter rejected.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Resolve an archive name to a path below the root.
    pub fn target_path(&self, name: &str) -> io::Result<PathBuf> {
        let mut path = self.root.clone();
        let mut depth = 0;

        for segment in name.split(['/', '\\']) {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (None, _) | (Some(Component::CurDir), None) => continue,
                (Some(Component::Normal(part)), None) => {
                    path.push(part);
                    depth += 1;
                }
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("refusing to write {name:?} outside the output directory"),
                    ))
                }
            }
        }

        if depth == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("empty file name {name:?}"),
            ));
        }
        Ok(path)
    }
}

impl FileSaver for FsSaver {
    fn save(&mut self, file: RawFile) -> Result<()> {
        if let Some(pattern) = &self.filter {
            if !pattern.matches(&file.name) {
                self.skipped += 1;
                return Ok(());
            }
        }

        let path = self.target_path(&file.name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &file.data)?;
        self.written += 1;
        Ok(())
    }
}
