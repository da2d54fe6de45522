//! Build submission metadata and its validation.
//!
//! A [`Job`] is accumulated once per run through fluent `with_*` setters,
//! validated once, and read-only for the rest of the pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::git_info::GitInfo;

/// Build, service, and VCS metadata attached to the payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Job {
    /// Repository token authenticating the submission.
    pub repo_token: Option<String>,
    /// CI service name (e.g. `travis-ci`).
    pub service_name: Option<String>,
    /// CI service job identifier.
    pub service_job_id: Option<String>,
    /// CI service build number.
    pub service_build_number: Option<String>,
    /// CI service build URL.
    pub service_build_url: Option<String>,
    /// Free-form service-specific environment values.
    pub service_environment: BTreeMap<String, String>,
    /// Branch name, when known.
    pub branch: Option<String>,
    /// Pull-request identifier, when the build covers one.
    pub pull_request: Option<String>,
    /// Build timestamp.
    pub timestamp: Option<DateTime<Utc>>,
    /// When set, the payload is written but never submitted.
    pub dry_run: bool,
    /// VCS snapshot, when a repository was found.
    pub git: Option<GitInfo>,
}

impl Job {
    /// Starts an empty job.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the repository token.
    #[must_use]
    pub fn with_repo_token(mut self, token: Option<String>) -> Self {
        self.repo_token = token;
        self
    }

    /// Sets the CI service name.
    #[must_use]
    pub fn with_service_name(mut self, name: Option<String>) -> Self {
        self.service_name = name;
        self
    }

    /// Sets the CI service job id.
    #[must_use]
    pub fn with_service_job_id(mut self, job_id: Option<String>) -> Self {
        self.service_job_id = job_id;
        self
    }

    /// Sets the CI service build number.
    #[must_use]
    pub fn with_service_build_number(mut self, number: Option<String>) -> Self {
        self.service_build_number = number;
        self
    }

    /// Sets the CI service build URL.
    #[must_use]
    pub fn with_service_build_url(mut self, url: Option<String>) -> Self {
        self.service_build_url = url;
        self
    }

    /// Sets the service-specific environment values.
    #[must_use]
    pub fn with_service_environment(mut self, env: BTreeMap<String, String>) -> Self {
        self.service_environment = env;
        self
    }

    /// Sets the branch name.
    #[must_use]
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    /// Sets the pull-request identifier.
    #[must_use]
    pub fn with_pull_request(mut self, pull_request: Option<String>) -> Self {
        self.pull_request = pull_request;
        self
    }

    /// Sets the build timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Attaches the VCS snapshot.
    #[must_use]
    pub fn with_git(mut self, git: Option<GitInfo>) -> Self {
        self.git = git;
        self
    }

    /// Inspects the accumulated state and reports every problem found.
    ///
    /// A job is attributable when it carries a repo token, or a service
    /// name plus at least one of job id, build number, or pull request.
    /// Missing attribution is fatal unless the job is a dry run.
    #[must_use]
    pub fn validate(&self) -> JobValidation {
        let mut problems = Vec::new();

        let service_identity = self.service_name.is_some()
            && (self.service_job_id.is_some()
                || self.service_build_number.is_some()
                || self.pull_request.is_some());
        if self.repo_token.is_none() && !service_identity {
            let severity = if self.dry_run { Severity::Warning } else { Severity::Fatal };
            problems.push(ValidationProblem {
                severity,
                message: "no repo token and no service name with job id, build number, or \
                          pull request; the submission cannot be attributed to a build"
                    .to_string(),
            });
        }

        if self.service_name.is_none()
            && (self.service_job_id.is_some()
                || self.service_build_number.is_some()
                || self.service_build_url.is_some())
        {
            problems.push(ValidationProblem {
                severity: Severity::Warning,
                message: "service job fields are set but the service name is not".to_string(),
            });
        }

        if self.git.is_none() {
            problems.push(ValidationProblem {
                severity: Severity::Warning,
                message: "no git repository metadata; the report will carry no commit info"
                    .to_string(),
            });
        }

        JobValidation { problems }
    }
}

/// Severity of a single validation problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The run may proceed with best-effort metadata.
    Warning,
    /// The run must abort before any parsing.
    Fatal,
}

/// One problem found while validating a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationProblem {
    /// Whether the problem aborts the run.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

/// Result of validating a job: zero or more problems, each fatal or
/// advisory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobValidation {
    problems: Vec<ValidationProblem>,
}

impl JobValidation {
    /// All problems found, fatal and advisory.
    #[must_use]
    pub fn problems(&self) -> &[ValidationProblem] {
        &self.problems
    }

    /// Messages of the advisory problems.
    #[must_use]
    pub fn warnings(&self) -> Vec<&str> {
        self.problems
            .iter()
            .filter(|p| p.severity == Severity::Warning)
            .map(|p| p.message.as_str())
            .collect()
    }

    /// Converts fatal problems into a [`ValidationError`].
    ///
    /// # Errors
    ///
    /// Returns an error holding every fatal problem; advisory problems are
    /// the caller's to print.
    pub fn into_result(self) -> Result<(), ValidationError> {
        let fatal: Vec<String> = self
            .problems
            .into_iter()
            .filter(|p| p.severity == Severity::Fatal)
            .map(|p| p.message)
            .collect();
        if fatal.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { problems: fatal })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git_info::{GitHead, GitInfo};

    fn git_stub() -> GitInfo {
        GitInfo {
            branch: Some("main".to_string()),
            head: GitHead {
                id: "abc".to_string(),
                author_name: None,
                author_email: None,
                committer_name: None,
                committer_email: None,
                message: None,
            },
            remotes: vec![],
        }
    }

    #[test]
    fn job_without_identity_fails_validation() {
        let job = Job::new().with_git(Some(git_stub()));
        assert!(job.validate().into_result().is_err());
    }

    #[test]
    fn same_job_with_dry_run_passes_validation() {
        let job = Job::new().with_git(Some(git_stub())).with_dry_run(true);
        let validation = job.validate();
        assert!(!validation.warnings().is_empty());
        assert!(validation.into_result().is_ok());
    }

    #[test]
    fn repo_token_alone_is_sufficient_identity() {
        let job = Job::new()
            .with_repo_token(Some("token".to_string()))
            .with_git(Some(git_stub()));
        let validation = job.validate();
        assert!(validation.warnings().is_empty());
        assert!(validation.into_result().is_ok());
    }

    #[test]
    fn service_name_needs_a_job_reference() {
        let name_only = Job::new()
            .with_service_name(Some("ci".to_string()))
            .with_git(Some(git_stub()));
        assert!(name_only.validate().into_result().is_err());

        let with_build = Job::new()
            .with_service_name(Some("ci".to_string()))
            .with_service_build_number(Some("42".to_string()))
            .with_git(Some(git_stub()));
        assert!(with_build.validate().into_result().is_ok());

        let with_pr = Job::new()
            .with_service_name(Some("ci".to_string()))
            .with_pull_request(Some("7".to_string()))
            .with_git(Some(git_stub()));
        assert!(with_pr.validate().into_result().is_ok());
    }

    #[test]
    fn job_fields_without_service_name_warn() {
        let job = Job::new()
            .with_repo_token(Some("token".to_string()))
            .with_service_build_number(Some("42".to_string()))
            .with_git(Some(git_stub()));
        let validation = job.validate();
        assert!(validation
            .warnings()
            .iter()
            .any(|w| w.contains("service name is not")));
        assert!(validation.into_result().is_ok());
    }

    #[test]
    fn missing_git_is_advisory_only() {
        let job = Job::new().with_repo_token(Some("token".to_string()));
        let validation = job.validate();
        assert!(validation.warnings().iter().any(|w| w.contains("git")));
        assert!(validation.into_result().is_ok());
    }
}
