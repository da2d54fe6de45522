//! Reporter hook points rendered around the pipeline run.
//!
//! The core exposes facts; the command layer decides where the rendered
//! lines go. Reporters declare whether they run before or after the
//! pipeline.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::job::Job;
use crate::source::CoverageTotals;

/// When a reporter's output is rendered relative to the pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Rendered before any report is parsed.
    Before,
    /// Rendered after the payload is complete.
    After,
}

/// A hook point rendering one human-readable summary.
pub trait Reporter {
    /// Whether this reporter runs before or after the pipeline.
    fn position(&self) -> Position;

    /// Renders the summary lines.
    fn render(&self) -> String;
}

/// Describes the job before the run starts.
pub struct JobReporter {
    job: Job,
}

impl JobReporter {
    /// Creates a reporter for `job`.
    #[must_use]
    pub fn new(job: &Job) -> Self {
        Self { job: job.clone() }
    }
}

impl Reporter for JobReporter {
    fn position(&self) -> Position {
        Position::Before
    }

    fn render(&self) -> String {
        let mut parts = Vec::new();
        if let Some(service) = &self.job.service_name {
            parts.push(format!("service {service}"));
        }
        if let Some(branch) = &self.job.branch {
            parts.push(format!("branch {branch}"));
        }
        if let Some(pull_request) = &self.job.pull_request {
            parts.push(format!("pull request {pull_request}"));
        }
        if let Some(git) = &self.job.git {
            parts.push(format!("commit {}", git.head.id));
        }
        if self.job.dry_run {
            parts.push("dry run".to_string());
        }
        if parts.is_empty() {
            "Starting coverage job".to_string()
        } else {
            format!("Starting coverage job ({})", parts.join(", "))
        }
    }
}

/// Summarizes the gathered coverage after the run.
pub struct CoverageTracingReporter {
    totals: Rc<RefCell<CoverageTotals>>,
}

impl CoverageTracingReporter {
    /// Creates a reporter over the totals shared with the tracing
    /// callback stage.
    #[must_use]
    pub fn new(totals: Rc<RefCell<CoverageTotals>>) -> Self {
        Self { totals }
    }
}

impl Reporter for CoverageTracingReporter {
    fn position(&self) -> Position {
        Position::After
    }

    fn render(&self) -> String {
        let totals = self.totals.borrow();
        format!(
            "Gathered coverage data for {} source files: {} of {} relevant lines covered",
            totals.files, totals.lines_covered, totals.lines_relevant
        )
    }
}

/// Announces where the payload landed when submission is skipped.
pub struct DryRunReporter {
    payload: PathBuf,
}

impl DryRunReporter {
    /// Creates a reporter for the payload at `payload`.
    #[must_use]
    pub fn new(payload: PathBuf) -> Self {
        Self { payload }
    }
}

impl Reporter for DryRunReporter {
    fn position(&self) -> Position {
        Position::After
    }

    fn render(&self) -> String {
        let size = std::fs::metadata(&self.payload).map(|m| m.len()).unwrap_or(0);
        format!(
            "Dry run enabled; payload written to {} ({size} bytes), skipping submission",
            self.payload.display()
        )
    }
}
