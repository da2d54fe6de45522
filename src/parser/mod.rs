//! Format-polymorphic coverage report parsers.
//!
//! Each supported report dialect implements [`CoverageParser`] behind the
//! same single-method contract: read the whole report, resolve every
//! referenced source through the loader, and push one complete record per
//! file into the callback. Parsers never deduplicate; that is the callback
//! chain's concern. New dialects are added as new variants, not by
//! modifying existing ones.

pub mod cobertura;
pub mod factory;
pub mod jacoco;
pub mod lcov;

use std::path::Path;

use quick_xml::events::BytesStart;

use crate::error::{ProcessingError, ReportError};
use crate::source::{SourceCallback, SourceFile};
use crate::source_loader::SourceLoader;

pub use cobertura::CoberturaParser;
pub use factory::{CoverageParsersFactory, CoverageReport, ReportFormat};
pub use jacoco::JacocoParser;
pub use lcov::LcovParser;

/// How a parser treats a source referenced by its report but absent from
/// the source tree.
///
/// Each dialect fixes one policy and keeps it explicit instead of silently
/// swallowing the gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePolicy {
    /// A dangling reference fails the run.
    Strict,
    /// A dangling reference skips the file; the skip is recorded on the
    /// parser for the caller to surface.
    Lenient,
}

/// Reads one report file and emits per-file line coverage.
pub trait CoverageParser {
    /// Reads the whole associated report, invoking `callback` once per
    /// source file with coverage data.
    ///
    /// # Errors
    ///
    /// Returns a processing error for malformed report content or (under
    /// [`SourcePolicy::Strict`]) an unresolvable source reference, and
    /// propagates callback failures.
    fn parse(&mut self, callback: &mut dyn SourceCallback) -> Result<(), ReportError>;

    /// The report file this parser consumes.
    fn report_path(&self) -> &Path;

    /// Source references skipped under [`SourcePolicy::Lenient`].
    fn skipped_sources(&self) -> &[String] {
        &[]
    }
}

/// Reads the report file to a string. A configured report that cannot be
/// read is bad input data, not an environment problem, so failures land in
/// the processing taxonomy.
pub(crate) fn read_report(path: &Path) -> Result<String, ReportError> {
    std::fs::read_to_string(path).map_err(|err| {
        ProcessingError::MalformedReport {
            file: path.to_path_buf(),
            detail: format!("cannot read report: {err}"),
        }
        .into()
    })
}

/// Resolves `name` through the loader, applying the parser's policy to a
/// miss. `Ok(None)` is only possible under [`SourcePolicy::Lenient`].
pub(crate) fn resolve_source(
    loader: &SourceLoader<'_>,
    report: &Path,
    name: &str,
    policy: SourcePolicy,
    skipped: &mut Vec<String>,
) -> Result<Option<SourceFile>, ReportError> {
    match loader.load(name)? {
        Some(source) => Ok(Some(source)),
        None => match policy {
            SourcePolicy::Strict => Err(ProcessingError::SourceNotFound {
                file: report.to_path_buf(),
                source_path: name.to_string(),
            }
            .into()),
            SourcePolicy::Lenient => {
                skipped.push(name.to_string());
                Ok(None)
            }
        },
    }
}

fn malformed(path: &Path, detail: impl Into<String>) -> ReportError {
    ProcessingError::MalformedReport { file: path.to_path_buf(), detail: detail.into() }.into()
}

/// Maps a quick-xml error into the malformed-report taxonomy.
pub(crate) fn xml_error(path: &Path, err: &quick_xml::Error) -> ReportError {
    malformed(path, err.to_string())
}

/// Returns the unescaped value of attribute `name` on `element`.
pub(crate) fn attr_value(
    path: &Path,
    element: &BytesStart<'_>,
    name: &str,
) -> Result<Option<String>, ReportError> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|err| malformed(path, err.to_string()))?;
    match attr {
        Some(attr) => {
            let value =
                attr.unescape_value().map_err(|err| malformed(path, err.to_string()))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

/// Like [`attr_value`], for attributes a dialect requires.
pub(crate) fn required_attr(
    path: &Path,
    element: &BytesStart<'_>,
    name: &str,
) -> Result<String, ReportError> {
    attr_value(path, element, name)?
        .ok_or_else(|| malformed(path, format!("missing required attribute {name}")))
}

/// Parses a numeric attribute value.
pub(crate) fn numeric_attr<T: std::str::FromStr>(
    path: &Path,
    attr: &str,
    value: &str,
) -> Result<T, ReportError> {
    value
        .parse()
        .map_err(|_| malformed(path, format!("attribute {attr} is not numeric: {value:?}")))
}
