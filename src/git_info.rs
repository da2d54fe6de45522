//! Git snapshot types embedded in the job metadata.
//!
//! Produced once by the [`GitRepo`](crate::ports::GitRepo) port and owned by
//! the job for the rest of the run. Field names follow the wire format of
//! the coverage service's `git` payload object.

use serde::{Deserialize, Serialize};

/// Snapshot of the repository state a coverage run was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    /// Checked-out branch name, when one could be determined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// The HEAD commit.
    pub head: GitHead,
    /// Configured remotes.
    #[serde(default)]
    pub remotes: Vec<GitRemote>,
}

/// The commit a coverage run was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHead {
    /// Full commit hash.
    pub id: String,
    /// Commit author name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// Commit author email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    /// Committer name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committer_name: Option<String>,
    /// Committer email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committer_email: Option<String>,
    /// First line of the commit message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A named remote and its fetch URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRemote {
    /// Remote name (e.g. `origin`).
    pub name: String,
    /// Fetch URL of the remote.
    pub url: String,
}
