//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for `covsub`.
#[derive(Debug, Parser)]
#[command(name = "covsub", version, about = "Submit code coverage reports to a Coveralls-compatible API")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Assemble the coverage payload and submit it.
    Report(ReportArgs),
}

/// Arguments of the `report` subcommand.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Explicit Cobertura XML report file (repeatable).
    #[arg(long = "cobertura-report", value_name = "FILE")]
    pub cobertura_reports: Vec<PathBuf>,

    /// Explicit JaCoCo XML report file (repeatable).
    #[arg(long = "jacoco-report", value_name = "FILE")]
    pub jacoco_reports: Vec<PathBuf>,

    /// Explicit LCOV tracefile (repeatable).
    #[arg(long = "lcov-report", value_name = "FILE")]
    pub lcov_reports: Vec<PathBuf>,

    /// Per-module directory, relative to the base dir, scanned for
    /// conventionally named report files (repeatable).
    #[arg(long = "report-dir", value_name = "DIR")]
    pub report_dirs: Vec<PathBuf>,

    /// Project base directory.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub base_dir: PathBuf,

    /// Source directory (repeatable); defaults to `src` under the base
    /// dir, then the base dir itself.
    #[arg(long = "source-dir", value_name = "DIR")]
    pub source_dirs: Vec<PathBuf>,

    /// Source file encoding; only UTF-8 is supported.
    #[arg(long, value_name = "ENCODING", default_value = "UTF-8")]
    pub source_encoding: String,

    /// Payload output file, relative to the base dir unless absolute.
    #[arg(long, value_name = "FILE", default_value = "target/coveralls.json")]
    pub output: PathBuf,

    /// Submission endpoint; defaults to the Coveralls API.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Repository token; falls back to the COVERALLS_REPO_TOKEN
    /// environment variable, then `.coveralls.yml`.
    #[arg(long, value_name = "TOKEN")]
    pub repo_token: Option<String>,

    /// CI service name.
    #[arg(long, value_name = "NAME")]
    pub service_name: Option<String>,

    /// CI service job id.
    #[arg(long, value_name = "ID")]
    pub service_job_id: Option<String>,

    /// CI service build number.
    #[arg(long, value_name = "NUMBER")]
    pub service_build_number: Option<String>,

    /// CI service build URL.
    #[arg(long, value_name = "URL")]
    pub service_build_url: Option<String>,

    /// Service-specific environment entry as KEY=VALUE (repeatable).
    #[arg(long = "service-env", value_name = "KEY=VALUE")]
    pub service_environment: Vec<String>,

    /// Branch name override.
    #[arg(long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Pull-request identifier.
    #[arg(long, value_name = "ID")]
    pub pull_request: Option<String>,

    /// Write the payload file but skip submission.
    #[arg(long)]
    pub dry_run: bool,

    /// Fail when two reports cover the same source file instead of
    /// keeping the first.
    #[arg(long)]
    pub fail_on_duplicate: bool,

    /// Skip coverage reporting entirely.
    #[arg(long)]
    pub skip: bool,
}
