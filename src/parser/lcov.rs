//! LCOV tracefile dialect.

use std::path::{Path, PathBuf};

use super::{read_report, resolve_source, CoverageParser, SourcePolicy};
use crate::error::{ProcessingError, ReportError};
use crate::source::{SourceCallback, SourceFile};
use crate::source_loader::SourceLoader;

/// Parser for LCOV tracefiles.
///
/// `SF:` opens a record, `DA:<line>,<hits>` accumulates, `end_of_record`
/// closes and emits; all other directives are ignored. Tracefiles
/// routinely reference generated files that are not part of the source
/// tree, so the resolution policy is [`SourcePolicy::Lenient`]: an
/// unresolvable `SF:` entry skips the whole record and is listed in
/// [`CoverageParser::skipped_sources`].
pub struct LcovParser<'a> {
    report: PathBuf,
    loader: &'a SourceLoader<'a>,
    policy: SourcePolicy,
    skipped: Vec<String>,
}

enum Record {
    Outside,
    Active(SourceFile),
    Skipped,
}

impl<'a> LcovParser<'a> {
    /// Creates a parser for `report`.
    pub fn new(report: PathBuf, loader: &'a SourceLoader<'a>) -> Self {
        Self { report, loader, policy: SourcePolicy::Lenient, skipped: Vec::new() }
    }

    fn malformed(&self, detail: impl Into<String>) -> ReportError {
        ProcessingError::MalformedReport {
            file: self.report.clone(),
            detail: detail.into(),
        }
        .into()
    }
}

impl CoverageParser for LcovParser<'_> {
    fn parse(&mut self, callback: &mut dyn SourceCallback) -> Result<(), ReportError> {
        let text = read_report(&self.report)?;
        let mut record = Record::Outside;

        for line in text.lines() {
            let line = line.trim();
            if let Some(name) = line.strip_prefix("SF:") {
                if !matches!(record, Record::Outside) {
                    return Err(self.malformed(format!("SF:{name} before end_of_record")));
                }
                record = match resolve_source(
                    self.loader,
                    &self.report,
                    name.trim(),
                    self.policy,
                    &mut self.skipped,
                )? {
                    Some(source) => Record::Active(source),
                    None => Record::Skipped,
                };
            } else if let Some(data) = line.strip_prefix("DA:") {
                match &mut record {
                    Record::Outside => {
                        return Err(self.malformed(format!("DA:{data} outside a record")));
                    }
                    Record::Skipped => {}
                    Record::Active(source) => {
                        let mut fields = data.split(',');
                        let number = fields.next().unwrap_or_default().trim();
                        let hits = fields.next().map(str::trim);
                        let number: usize = number
                            .parse()
                            .map_err(|_| self.malformed(format!("bad DA line number: {data}")))?;
                        let hits: u32 = hits
                            .ok_or_else(|| self.malformed(format!("DA without hit count: {data}")))?
                            .parse()
                            .map_err(|_| self.malformed(format!("bad DA hit count: {data}")))?;
                        source.add_coverage(number, hits)?;
                    }
                }
            } else if line == "end_of_record" {
                match std::mem::replace(&mut record, Record::Outside) {
                    Record::Outside => {
                        return Err(self.malformed("end_of_record outside a record"));
                    }
                    Record::Skipped => {}
                    Record::Active(source) => callback.on_source(source)?,
                }
            }
        }

        if !matches!(record, Record::Outside) {
            return Err(self.malformed("unterminated record at end of file"));
        }
        Ok(())
    }

    fn report_path(&self) -> &Path {
        &self.report
    }

    fn skipped_sources(&self) -> &[String] {
        &self.skipped
    }
}
