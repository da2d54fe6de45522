//! Error taxonomy for the report pipeline.
//!
//! Three failure families are kept distinct so the command layer can tell
//! the operator whether the data was bad, the environment was bad, or the
//! job could not be attributed to a build at all: [`ProcessingError`] for
//! input/output data problems, `std::io::Error` for local file and network
//! transport problems, and [`ValidationError`] for job identity problems.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal job validation failure: the job carries too little identity to be
/// attributed to a CI build.
#[derive(Debug, Error)]
#[error("job cannot be attributed to a build: {}", .problems.join("; "))]
pub struct ValidationError {
    /// Human-readable descriptions of every fatal problem found.
    pub problems: Vec<String>,
}

/// A data-processing failure: the inputs or outputs of the pipeline could
/// not be interpreted. Never silently absorbed.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// An explicitly configured report file does not exist.
    #[error("coverage report not found: {}", .0.display())]
    MissingReport(PathBuf),

    /// A report file exists but its content could not be parsed.
    #[error("malformed coverage report {}: {detail}", .file.display())]
    MalformedReport {
        /// The report file that failed to parse.
        file: PathBuf,
        /// What went wrong.
        detail: String,
    },

    /// A report references a source file absent from every source directory.
    #[error("source file {source_path} referenced by {} not found in source directories", .file.display())]
    SourceNotFound {
        /// The report containing the dangling reference.
        file: PathBuf,
        /// The referenced source path.
        source_path: String,
    },

    /// A resolved source file could not be decoded with the configured
    /// encoding.
    #[error("source file {source_path} is not valid {encoding}")]
    SourceDecode {
        /// The source file that failed to decode.
        source_path: String,
        /// The encoding it was expected to be in.
        encoding: String,
    },

    /// Two reports covered the same source file while duplicate handling
    /// was set to fail.
    #[error("duplicate coverage for source file {0}")]
    DuplicateSource(String),

    /// A report claims coverage for a line past the end of the source.
    #[error("line {line} out of range for {source_path} ({line_count} lines)")]
    InvalidCoverage {
        /// The source file the report refers to.
        source_path: String,
        /// The 1-based line number claimed by the report.
        line: usize,
        /// The actual number of lines in the loaded source.
        line_count: usize,
    },
}

/// Failure of a single submission attempt.
///
/// The two variants separate "the service rejected the data" from "the
/// service could not be reached"; operators act on them differently.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The endpoint responded, but the response was not a success: the body
    /// was unparseable, reported an error, or carried a failure status.
    #[error("coverage service rejected the submission: {0}")]
    Processing(String),

    /// The connection could not be established, timed out, or was
    /// interrupted mid-transfer; includes local payload read failures.
    #[error("i/o failure during submission: {0}")]
    Io(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Umbrella error for the whole report run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Job validation failed before any parsing started.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Processing of input or output data failed.
    #[error("processing of input or output data failed: {0}")]
    Processing(#[from] ProcessingError),

    /// A local file operation failed.
    #[error("i/o operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// The submission attempt failed.
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_joins_problems() {
        let err = ValidationError {
            problems: vec!["no token".to_string(), "no service".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "job cannot be attributed to a build: no token; no service"
        );
    }

    #[test]
    fn missing_report_names_the_file() {
        let err = ProcessingError::MissingReport(PathBuf::from("target/cobertura.xml"));
        assert!(err.to_string().contains("target/cobertura.xml"));
    }

    #[test]
    fn report_error_wraps_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ReportError::from(io);
        assert!(matches!(err, ReportError::Io(_)));
        assert!(err.to_string().starts_with("i/o operation failed"));
    }

    #[test]
    fn submit_error_kinds_render_distinctly() {
        let processing = SubmitError::Processing("bad payload".to_string());
        let io = SubmitError::Io("connection refused".into());
        assert!(processing.to_string().contains("rejected"));
        assert!(io.to_string().contains("i/o failure"));
    }
}
