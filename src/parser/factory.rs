//! Discovery and construction of coverage parsers.

use std::path::PathBuf;

use super::{CoberturaParser, CoverageParser, JacocoParser, LcovParser};
use crate::error::{ProcessingError, ReportError};
use crate::ports::filesystem::FileSystem;
use crate::source_loader::SourceLoader;

/// Supported report dialects, in deterministic construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Cobertura XML.
    Cobertura,
    /// JaCoCo XML.
    Jacoco,
    /// LCOV tracefile.
    Lcov,
}

impl ReportFormat {
    /// Conventional file name looked for when scanning report directories.
    #[must_use]
    pub fn conventional_file(self) -> &'static str {
        match self {
            Self::Cobertura => "cobertura.xml",
            Self::Jacoco => "jacoco.xml",
            Self::Lcov => "lcov.info",
        }
    }
}

const SCAN_ORDER: [ReportFormat; 3] =
    [ReportFormat::Cobertura, ReportFormat::Jacoco, ReportFormat::Lcov];

/// One discovered report file and its declared dialect.
///
/// Ephemeral: produced during discovery, consumed by exactly one parser
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageReport {
    /// Report file path.
    pub path: PathBuf,
    /// Dialect the file is declared or conventionally assumed to be in.
    pub format: ReportFormat,
}

/// Builds the ordered parser sequence for one run.
///
/// Explicitly listed reports come first (Cobertura, then JaCoCo, then
/// LCOV, each preserving list order), followed by conventionally named
/// files found in the scanned report directories, in directory-list
/// order. Identical inputs always yield identical parser order, so the
/// dedup stage's first-write-wins tie-break is reproducible.
pub struct CoverageParsersFactory<'a> {
    fs: &'a dyn FileSystem,
    loader: &'a SourceLoader<'a>,
    base_dir: PathBuf,
    cobertura_reports: Vec<PathBuf>,
    jacoco_reports: Vec<PathBuf>,
    lcov_reports: Vec<PathBuf>,
    report_dirs: Vec<PathBuf>,
}

impl<'a> CoverageParsersFactory<'a> {
    /// Creates a factory scanning relative to `base_dir`.
    pub fn new(fs: &'a dyn FileSystem, loader: &'a SourceLoader<'a>, base_dir: PathBuf) -> Self {
        Self {
            fs,
            loader,
            base_dir,
            cobertura_reports: Vec::new(),
            jacoco_reports: Vec::new(),
            lcov_reports: Vec::new(),
            report_dirs: Vec::new(),
        }
    }

    /// Adds explicitly configured Cobertura reports.
    #[must_use]
    pub fn with_cobertura_reports(mut self, reports: Vec<PathBuf>) -> Self {
        self.cobertura_reports = reports;
        self
    }

    /// Adds explicitly configured JaCoCo reports.
    #[must_use]
    pub fn with_jacoco_reports(mut self, reports: Vec<PathBuf>) -> Self {
        self.jacoco_reports = reports;
        self
    }

    /// Adds explicitly configured LCOV reports.
    #[must_use]
    pub fn with_lcov_reports(mut self, reports: Vec<PathBuf>) -> Self {
        self.lcov_reports = reports;
        self
    }

    /// Adds per-module directories, relative to the base dir, to scan for
    /// conventionally named report files.
    #[must_use]
    pub fn with_report_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.report_dirs = dirs;
        self
    }

    /// Discovers report files without constructing parsers.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::MissingReport`] for any explicitly
    /// configured report that does not exist; explicitly configured
    /// reports are load-bearing. Conventionally scanned files are simply
    /// included when present.
    pub fn discover(&self) -> Result<Vec<CoverageReport>, ReportError> {
        let mut reports = Vec::new();

        let explicit = [
            (ReportFormat::Cobertura, &self.cobertura_reports),
            (ReportFormat::Jacoco, &self.jacoco_reports),
            (ReportFormat::Lcov, &self.lcov_reports),
        ];
        for (format, paths) in explicit {
            for path in paths {
                if !self.fs.exists(path) {
                    return Err(ProcessingError::MissingReport(path.clone()).into());
                }
                reports.push(CoverageReport { path: path.clone(), format });
            }
        }

        for dir in &self.report_dirs {
            let dir = self.base_dir.join(dir);
            for format in SCAN_ORDER {
                let path = dir.join(format.conventional_file());
                if self.fs.exists(&path) {
                    reports.push(CoverageReport { path, format });
                }
            }
        }

        Ok(reports)
    }

    /// Creates one parser per discovered report, in discovery order.
    ///
    /// # Errors
    ///
    /// Propagates discovery failures; see [`Self::discover`].
    pub fn create_parsers(&self) -> Result<Vec<Box<dyn CoverageParser + 'a>>, ReportError> {
        let loader = self.loader;
        Ok(self
            .discover()?
            .into_iter()
            .map(|report| -> Box<dyn CoverageParser + 'a> {
                match report.format {
                    ReportFormat::Cobertura => Box::new(CoberturaParser::new(report.path, loader)),
                    ReportFormat::Jacoco => Box::new(JacocoParser::new(report.path, loader)),
                    ReportFormat::Lcov => Box::new(LcovParser::new(report.path, loader)),
                }
            })
            .collect())
    }
}
