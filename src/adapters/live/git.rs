//! Live git adapter using `git` CLI commands.

use std::path::Path;
use std::process::Command;

use crate::git_info::{GitHead, GitInfo, GitRemote};
use crate::ports::git::GitRepo;

/// Live git adapter that shells out to the `git` CLI.
pub struct LiveGitRepo;

fn run_git(
    base_dir: &Path,
    args: &[&str],
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let output = Command::new("git").current_dir(base_dir).args(args).output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("git {} failed: {}", args.join(" "), stderr.trim()).into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl GitRepo for LiveGitRepo {
    fn snapshot(
        &self,
        base_dir: &Path,
    ) -> Result<GitInfo, Box<dyn std::error::Error + Send + Sync>> {
        // %s strips newlines from the subject, so line-per-field is safe.
        let head_raw = run_git(base_dir, &["log", "-1", "--pretty=format:%H%n%an%n%ae%n%cn%n%ce%n%s"])?;
        let mut lines = head_raw.lines();
        let id = lines
            .next()
            .and_then(non_empty)
            .ok_or("git log returned no commit hash")?;
        let head = GitHead {
            id,
            author_name: lines.next().and_then(non_empty),
            author_email: lines.next().and_then(non_empty),
            committer_name: lines.next().and_then(non_empty),
            committer_email: lines.next().and_then(non_empty),
            message: lines.next().and_then(non_empty),
        };

        let branch = run_git(base_dir, &["rev-parse", "--abbrev-ref", "HEAD"])
            .ok()
            .and_then(|out| non_empty(&out))
            .filter(|name| name != "HEAD");

        let mut remotes = Vec::new();
        if let Ok(raw) = run_git(base_dir, &["remote", "-v"]) {
            for line in raw.lines() {
                // Lines look like: "origin\tgit@host:repo.git (fetch)"
                let mut fields = line.split_whitespace();
                if let (Some(name), Some(url), Some("(fetch)")) =
                    (fields.next(), fields.next(), fields.next())
                {
                    remotes.push(GitRemote { name: name.to_string(), url: url.to_string() });
                }
            }
        }

        Ok(GitInfo { branch, head, remotes })
    }
}

#[cfg(test)]
mod tests {
    use super::non_empty;

    #[test]
    fn non_empty_trims_and_filters() {
        assert_eq!(non_empty("  main \n"), Some("main".to_string()));
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty(""), None);
    }
}
