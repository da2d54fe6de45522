//! Resolution of report-relative source paths to file content.

use std::path::PathBuf;

use crate::error::{ProcessingError, ReportError};
use crate::ports::filesystem::FileSystem;
use crate::source::SourceFile;

/// Resolves logical source paths against an ordered list of source
/// directories.
///
/// Parsers hand this the paths their report references; the first
/// directory containing the file wins. Whether a miss is fatal is the
/// parser's policy, so a miss is `Ok(None)` here rather than an error.
pub struct SourceLoader<'a> {
    fs: &'a dyn FileSystem,
    source_dirs: Vec<PathBuf>,
    encoding: String,
}

impl<'a> SourceLoader<'a> {
    /// Creates a loader over `source_dirs`, tried in order.
    pub fn new(fs: &'a dyn FileSystem, source_dirs: Vec<PathBuf>, encoding: &str) -> Self {
        Self { fs, source_dirs, encoding: encoding.to_string() }
    }

    /// Directories this loader searches, in order.
    #[must_use]
    pub fn source_dirs(&self) -> &[PathBuf] {
        &self.source_dirs
    }

    /// Loads the source file referenced as `name` by a report.
    ///
    /// Returns `Ok(None)` when no source directory contains the file.
    ///
    /// # Errors
    ///
    /// Returns a processing error when the file exists but is not valid
    /// UTF-8, or an I/O error when it exists and cannot be read.
    pub fn load(&self, name: &str) -> Result<Option<SourceFile>, ReportError> {
        let relative = name.replace('\\', "/");
        for dir in &self.source_dirs {
            let candidate = dir.join(&relative);
            if !self.fs.exists(&candidate) {
                continue;
            }
            let bytes = self
                .fs
                .read(&candidate)
                .map_err(|err| std::io::Error::other(err.to_string()))?;
            let text = String::from_utf8(bytes).map_err(|_| ProcessingError::SourceDecode {
                source_path: relative.clone(),
                encoding: self.encoding.clone(),
            })?;
            return Ok(Some(SourceFile::new(&relative, text, &self.encoding)));
        }
        Ok(None)
    }
}
