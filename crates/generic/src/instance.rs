use fileformats_core::FormatId;
use std::fmt;
use std::path::{Path, PathBuf};

/// Paths validated against a format.
///
/// Only a [`Recognizer`](crate::Recognizer) creates instances, so holding one means the
/// paths satisfied the format when it was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsInstance {
    format: FormatId,
    paths: Vec<PathBuf>,
}

impl FsInstance {
    pub(crate) const fn new(format: FormatId, paths: Vec<PathBuf>) -> Self {
        Self { format, paths }
    }

    #[must_use]
    pub const fn format(&self) -> FormatId {
        self.format
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The primary path: the file of a file format, the directory of a directory format.
    #[must_use]
    pub fn fspath(&self) -> &Path {
        // Instances are never built from an empty path list.
        self.paths.first().map_or_else(|| Path::new(""), PathBuf::as_path)
    }
}

impl fmt::Display for FsInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths = self.paths.iter();
        if let Some(first) = paths.next() {
            write!(f, "{}", first.display())?;
        }
        for path in paths {
            write!(f, ", {}", path.display())?;
        }
        Ok(())
    }
}
