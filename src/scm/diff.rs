//! Staged diff collection using git2.

use std::fmt;

use git2::{Delta, Diff, DiffFormat, ErrorCode, Repository, Tree};
use tracing::warn;

use crate::error::ScmError;

/// Maximum characters for the unified diff text before truncation.
const MAX_DIFF_LENGTH: usize = 30_000;

/// Status of a file in the staged diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "Added"),
            FileStatus::Modified => write!(f, "Modified"),
            FileStatus::Deleted => write!(f, "Deleted"),
            FileStatus::Renamed => write!(f, "Renamed"),
        }
    }
}

/// A file in the staged diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffFile {
    pub path: String,
    pub status: FileStatus,
}

/// Summary of what is about to be committed.
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    pub diff_text: String,
    pub files: Vec<DiffFile>,
    pub truncated: bool,
    pub additions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found).
pub(crate) fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, ScmError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(ScmError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(ScmError::DiffFailed)?;
    Ok(Some(tree))
}

/// Collect the diff between HEAD and the index.
pub fn collect_staged_diff(repo: &Repository) -> Result<DiffSummary, ScmError> {
    let head_tree = resolve_head_tree(repo)?;

    let staged = repo
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(ScmError::DiffFailed)?;

    let mut summary = DiffSummary {
        files: collect_files(&staged),
        ..Default::default()
    };
    append_diff_text(&staged, &mut summary);

    Ok(summary)
}

fn collect_files(diff: &Diff<'_>) -> Vec<DiffFile> {
    diff.deltas()
        .filter_map(|delta| {
            let status = match delta.status() {
                Delta::Added | Delta::Untracked => FileStatus::Added,
                Delta::Deleted => FileStatus::Deleted,
                Delta::Renamed => FileStatus::Renamed,
                _ => FileStatus::Modified,
            };
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().to_string())?;
            Some(DiffFile { path, status })
        })
        .collect()
}

/// Append unified diff text, respecting the max length.
fn append_diff_text(diff: &Diff<'_>, summary: &mut DiffSummary) {
    let result = diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if summary.truncated {
            return true;
        }

        let origin = line.origin();
        match origin {
            '+' => summary.additions += 1,
            '-' => summary.deletions += 1,
            _ => {}
        }

        let content = std::str::from_utf8(line.content()).unwrap_or("");
        if summary.diff_text.len() + content.len() + 2 > MAX_DIFF_LENGTH {
            summary.truncated = true;
            return true;
        }

        if origin == '+' || origin == '-' || origin == ' ' {
            summary.diff_text.push(origin);
        }
        summary.diff_text.push_str(content);
        true
    });

    if let Err(e) = result {
        warn!("Failed to collect diff text: {e}");
        summary.truncated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn commit_all(repo: &Repository, message: &str) {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Test", "test@test.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    #[test]
    fn test_file_status_display() {
        assert_eq!(FileStatus::Added.to_string(), "Added");
        assert_eq!(FileStatus::Modified.to_string(), "Modified");
        assert_eq!(FileStatus::Deleted.to_string(), "Deleted");
        assert_eq!(FileStatus::Renamed.to_string(), "Renamed");
    }

    #[test]
    fn test_unstaged_changes_are_not_in_staged_diff() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("file.txt"), "one\n").unwrap();
        commit_all(&repo, "init");

        std::fs::write(dir.path().join("file.txt"), "two\n").unwrap();

        let summary = collect_staged_diff(&repo).unwrap();
        assert!(summary.is_empty());
        assert!(summary.diff_text.is_empty());
    }

    #[test]
    fn test_staged_modification_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("file.txt"), "original\n").unwrap();
        commit_all(&repo, "init");

        std::fs::write(dir.path().join("file.txt"), "modified\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("file.txt")).unwrap();
        index.write().unwrap();

        let summary = collect_staged_diff(&repo).unwrap();
        assert_eq!(
            summary.files,
            vec![DiffFile {
                path: "file.txt".to_string(),
                status: FileStatus::Modified,
            }]
        );
        assert_eq!(summary.additions, 1);
        assert_eq!(summary.deletions, 1);
        assert!(summary.diff_text.contains("+modified"));
        assert!(!summary.truncated);
    }

    #[test]
    fn test_staged_diff_on_unborn_branch() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("new.txt"), "hello\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("new.txt")).unwrap();
        index.write().unwrap();

        let summary = collect_staged_diff(&repo).unwrap();
        assert_eq!(summary.files.len(), 1);
        assert_eq!(summary.files[0].status, FileStatus::Added);
    }

    #[test]
    fn test_large_diff_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let big: String = (0..5_000).map(|i| format!("line number {i}\n")).collect();
        std::fs::write(dir.path().join("big.txt"), big).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("big.txt")).unwrap();
        index.write().unwrap();

        let summary = collect_staged_diff(&repo).unwrap();
        assert!(summary.truncated);
        assert!(summary.diff_text.len() <= MAX_DIFF_LENGTH);
    }
}
