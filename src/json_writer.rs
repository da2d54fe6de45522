//! Streaming writer for the coverage payload file.
//!
//! The payload is written incrementally: job metadata first, then one
//! source-file element per accepted record, never holding more than one
//! record in memory. Calling the lifecycle out of order is a programming
//! error and panics; everything the environment can get wrong surfaces as
//! a `Result`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ReportError;
use crate::job::Job;
use crate::source::{SourceCallback, SourceFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Created,
    Started,
    Ended,
    Closed,
}

/// Terminal callback stage that streams the payload to a file.
pub struct JsonWriter {
    out: BufWriter<File>,
    path: PathBuf,
    job: Job,
    state: WriterState,
    wrote_source: bool,
}

impl JsonWriter {
    /// Opens the payload file for `job`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be created.
    pub fn create(job: &Job, path: &Path) -> Result<Self, ReportError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let out = BufWriter::new(File::create(path)?);
        Ok(Self {
            out,
            path: path.to_path_buf(),
            job: job.clone(),
            state: WriterState::Created,
            wrote_source: false,
        })
    }

    /// Path of the payload file, for the submission stage.
    #[must_use]
    pub fn payload_path(&self) -> &Path {
        &self.path
    }

    fn field<T: Serialize>(
        out: &mut BufWriter<File>,
        key: &str,
        value: &T,
    ) -> Result<(), ReportError> {
        write!(out, "\"{key}\":")?;
        serde_json::to_writer(&mut *out, value)
            .map_err(|err| std::io::Error::other(err.to_string()))?;
        out.write_all(b",")?;
        Ok(())
    }

    /// Emits the job metadata header and opens the source-file sequence.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be written.
    ///
    /// # Panics
    ///
    /// Panics when called more than once or after `write_end`.
    pub fn write_start(&mut self) -> Result<(), ReportError> {
        assert!(
            self.state == WriterState::Created,
            "JsonWriter::write_start called out of order"
        );
        self.state = WriterState::Started;

        let out = &mut self.out;
        let job = &self.job;
        out.write_all(b"{")?;
        if let Some(token) = &job.repo_token {
            Self::field(out, "repo_token", token)?;
        }
        if let Some(name) = &job.service_name {
            Self::field(out, "service_name", name)?;
        }
        if let Some(job_id) = &job.service_job_id {
            Self::field(out, "service_job_id", job_id)?;
        }
        if let Some(number) = &job.service_build_number {
            Self::field(out, "service_number", number)?;
        }
        if let Some(url) = &job.service_build_url {
            Self::field(out, "service_build_url", url)?;
        }
        if let Some(branch) = &job.branch {
            Self::field(out, "service_branch", branch)?;
        }
        if let Some(pull_request) = &job.pull_request {
            Self::field(out, "service_pull_request", pull_request)?;
        }
        if let Some(timestamp) = &job.timestamp {
            Self::field(out, "run_at", &timestamp.format("%Y-%m-%d %H:%M:%S %z").to_string())?;
        }
        if !job.service_environment.is_empty() {
            Self::field(out, "environment", &job.service_environment)?;
        }
        if let Some(git) = &job.git {
            Self::field(out, "git", git)?;
        }
        out.write_all(b"\"source_files\":[")?;
        Ok(())
    }

    /// Closes the source-file sequence and the payload object.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be written.
    ///
    /// # Panics
    ///
    /// Panics when called before `write_start` or more than once.
    pub fn write_end(&mut self) -> Result<(), ReportError> {
        assert!(
            self.state == WriterState::Started,
            "JsonWriter::write_end called out of order"
        );
        self.state = WriterState::Ended;
        self.out.write_all(b"]}")?;
        Ok(())
    }

    /// Flushes and releases the payload file. Idempotent, and callable in
    /// any state so error paths can always release the handle.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when buffered output cannot be flushed.
    pub fn close(&mut self) -> Result<(), ReportError> {
        if self.state == WriterState::Closed {
            return Ok(());
        }
        self.state = WriterState::Closed;
        self.out.flush()?;
        Ok(())
    }
}

impl SourceCallback for JsonWriter {
    fn on_source(&mut self, source: SourceFile) -> Result<(), ReportError> {
        assert!(
            self.state == WriterState::Started,
            "JsonWriter::on_source outside write_start/write_end"
        );
        if self.wrote_source {
            self.out.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.out, &source)
            .map_err(|err| std::io::Error::other(err.to_string()))?;
        self.wrote_source = true;
        Ok(())
    }
}
