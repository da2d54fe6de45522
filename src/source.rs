//! Per-file coverage records and the callback chain that consumes them.
//!
//! Every parser pushes complete [`SourceFile`] records into a
//! [`SourceCallback`]. The callback is composed as a linear chain of
//! decorators: deduplication first, optional tracing in the middle, the
//! payload writer last. Each stage holds the next as a plain value and
//! forwards.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use md5::{Digest, Md5};

use crate::error::{ProcessingError, ReportError};

/// Line coverage for one source file.
///
/// The coverage array has exactly one entry per source line; index 0 is
/// line 1. `None` marks a line the report did not instrument.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceFile {
    /// Normalized source path, `/`-separated.
    name: String,
    /// Hex MD5 digest of the source text, as the coverage service expects.
    source_digest: String,
    /// Per-line hit counts.
    coverage: Vec<Option<u32>>,
    /// Full source text. Not part of the payload.
    #[serde(skip)]
    source: String,
    /// Encoding the source was decoded with. Not part of the payload.
    #[serde(skip)]
    encoding: String,
}

impl SourceFile {
    /// Builds an uninstrumented record for `source` text.
    #[must_use]
    pub fn new(name: &str, source: String, encoding: &str) -> Self {
        let mut hasher = Md5::new();
        hasher.update(source.as_bytes());
        let source_digest = hex::encode(hasher.finalize());
        let line_count = source.lines().count();
        Self {
            name: name.replace('\\', "/"),
            source_digest,
            coverage: vec![None; line_count],
            source,
            encoding: encoding.to_string(),
        }
    }

    /// Normalized source path identifying this record.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hex MD5 digest of the source text.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.source_digest
    }

    /// Encoding label the source was decoded with.
    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Per-line hit counts; `None` means not instrumented.
    #[must_use]
    pub fn coverage(&self) -> &[Option<u32>] {
        &self.coverage
    }

    /// Records `hits` executions of 1-based `line`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::InvalidCoverage`] when `line` is zero or
    /// past the end of the source text: the report and the source tree
    /// disagree, which the pipeline never papers over.
    pub fn add_coverage(&mut self, line: usize, hits: u32) -> Result<(), ProcessingError> {
        if line == 0 || line > self.coverage.len() {
            return Err(ProcessingError::InvalidCoverage {
                source_path: self.name.clone(),
                line,
                line_count: self.coverage.len(),
            });
        }
        self.coverage[line - 1] = Some(hits);
        Ok(())
    }
}

/// Consumer contract for coverage records.
///
/// Parsers call this once per source file they find coverage data for;
/// each call carries a complete record.
pub trait SourceCallback {
    /// Receives one complete coverage record.
    ///
    /// # Errors
    ///
    /// Returns an error when the record cannot be accepted (write failure,
    /// duplicate in fail mode); the pipeline aborts on the first error.
    fn on_source(&mut self, source: SourceFile) -> Result<(), ReportError>;
}

impl<C: SourceCallback + ?Sized> SourceCallback for &mut C {
    fn on_source(&mut self, source: SourceFile) -> Result<(), ReportError> {
        (**self).on_source(source)
    }
}

impl<C: SourceCallback + ?Sized> SourceCallback for Box<C> {
    fn on_source(&mut self, source: SourceFile) -> Result<(), ReportError> {
        (**self).on_source(source)
    }
}

/// How the dedup stage treats a record whose path was already seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateMode {
    /// Drop the later record; the first parser to emit a path wins.
    #[default]
    FirstWins,
    /// Fail the run. Stricter than the historical behavior; useful when
    /// module report paths are expected to be disjoint.
    Fail,
}

/// Dedup stage: guarantees at most one record per source path per run.
///
/// Must be the outermost stage so nothing downstream ever sees a
/// duplicate. The seen-set lives in this value and dies with the run.
pub struct UniqueSourceCallback<C> {
    seen: HashSet<String>,
    mode: DuplicateMode,
    next: C,
}

impl<C: SourceCallback> UniqueSourceCallback<C> {
    /// Wraps `next` with first-write-wins deduplication.
    pub fn new(next: C) -> Self {
        Self::with_mode(next, DuplicateMode::FirstWins)
    }

    /// Wraps `next` with the given duplicate handling.
    pub fn with_mode(next: C, mode: DuplicateMode) -> Self {
        Self { seen: HashSet::new(), mode, next }
    }
}

impl<C: SourceCallback> SourceCallback for UniqueSourceCallback<C> {
    fn on_source(&mut self, source: SourceFile) -> Result<(), ReportError> {
        if self.seen.contains(source.name()) {
            return match self.mode {
                DuplicateMode::FirstWins => Ok(()),
                DuplicateMode::Fail => Err(ProcessingError::DuplicateSource(
                    source.name().to_string(),
                )
                .into()),
            };
        }
        self.seen.insert(source.name().to_string());
        self.next.on_source(source)
    }
}

/// Running totals accumulated by the tracing stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageTotals {
    /// Number of source files reported.
    pub files: usize,
    /// Number of instrumented lines.
    pub lines_relevant: usize,
    /// Number of instrumented lines with at least one hit.
    pub lines_covered: usize,
}

/// Tracing stage: forwards every record unchanged while accumulating
/// totals for end-of-run reporting. Removing it changes nothing about the
/// payload.
pub struct CoverageTracingCallback<C> {
    totals: Rc<RefCell<CoverageTotals>>,
    next: C,
}

impl<C: SourceCallback> CoverageTracingCallback<C> {
    /// Wraps `next`, accumulating into the shared `totals`.
    pub fn new(next: C, totals: Rc<RefCell<CoverageTotals>>) -> Self {
        Self { totals, next }
    }
}

impl<C: SourceCallback> SourceCallback for CoverageTracingCallback<C> {
    fn on_source(&mut self, source: SourceFile) -> Result<(), ReportError> {
        {
            let mut totals = self.totals.borrow_mut();
            totals.files += 1;
            for hits in source.coverage().iter().flatten() {
                totals.lines_relevant += 1;
                if *hits > 0 {
                    totals.lines_covered += 1;
                }
            }
        }
        self.next.on_source(source)
    }
}
