//! Git repository port for the VCS snapshot embedded in the job.

use std::path::Path;

use crate::git_info::GitInfo;

/// Provides a one-shot snapshot of a git repository.
///
/// The pipeline treats the snapshot as opaque, already-validated data; how
/// it is extracted (CLI, library, replay) is the adapter's concern.
pub trait GitRepo: Send + Sync {
    /// Loads branch, HEAD commit, and remotes for the repository at
    /// `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_dir` is not inside a git repository or the
    /// repository has no commits.
    fn snapshot(
        &self,
        base_dir: &Path,
    ) -> Result<GitInfo, Box<dyn std::error::Error + Send + Sync>>;
}
