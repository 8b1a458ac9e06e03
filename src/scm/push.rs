//! Pushing via the system `git` binary.
//!
//! Shelling out inherits the user's git config, SSH agent and credential
//! store, none of which libgit2 picks up on its own.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::ScmError;

/// Build the `git push` arguments for an optional explicit remote.
///
/// Without a remote the branch's configured upstream is used.
pub fn push_args(remote: Option<&str>) -> Vec<String> {
    match remote {
        Some(remote) => vec!["push".to_string(), remote.to_string(), "HEAD".to_string()],
        None => vec!["push".to_string()],
    }
}

/// Push the current branch of the repository at `workdir`.
pub async fn push(workdir: &Path, remote: Option<&str>) -> Result<(), ScmError> {
    let args = push_args(remote);
    debug!("Running git {}", args.join(" "));
    run_git(workdir, &args, "push").await
}

/// Run a git command and return success or a descriptive error.
pub(crate) async fn run_git(workdir: &Path, args: &[String], operation: &str) -> Result<(), ScmError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| ScmError::SpawnFailed {
            operation: operation.to_string(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ScmError::GitFailed {
            operation: operation.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_args_default_upstream() {
        assert_eq!(push_args(None), vec!["push"]);
    }

    #[test]
    fn test_push_args_explicit_remote() {
        assert_eq!(push_args(Some("origin")), vec!["push", "origin", "HEAD"]);
    }

    #[tokio::test]
    async fn test_run_git_version_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_git(dir.path(), &["--version".to_string()], "version check").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_run_git_invalid_command_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_git(dir.path(), &["not-a-real-command".to_string()], "invalid").await;
        assert!(matches!(result, Err(ScmError::GitFailed { .. })));
    }

    #[tokio::test]
    async fn test_push_without_remote_fails_with_stderr() {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();

        let err = push(dir.path(), Some("nowhere")).await.unwrap_err();
        match err {
            ScmError::GitFailed { operation, stderr } => {
                assert_eq!(operation, "push");
                assert!(!stderr.is_empty());
            }
            other => panic!("Expected GitFailed, got {other:?}"),
        }
    }
}
