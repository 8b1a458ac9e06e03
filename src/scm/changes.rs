//! Changed-file enumeration from `git status`.

use std::fmt;
use std::path::Path;

use git2::{Repository, Status, StatusOptions};

use crate::error::ScmError;

/// Which change set a file was listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    WorkingTree,
    Index,
    Untracked,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::WorkingTree => write!(f, "working tree"),
            ChangeKind::Index => write!(f, "index"),
            ChangeKind::Untracked => write!(f, "untracked"),
        }
    }
}

/// A file with pending changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// Repository-relative path, `/`-separated.
    pub path: String,
    pub kind: ChangeKind,
}

impl ChangedFile {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Last path component, or the whole path if it has none.
    pub fn file_name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.path)
    }
}

const WORKING_TREE_FLAGS: Status = Status::WT_MODIFIED
    .union(Status::WT_DELETED)
    .union(Status::WT_TYPECHANGE)
    .union(Status::WT_RENAMED);

const INDEX_FLAGS: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);

/// Enumerate pending changes.
///
/// Working-tree changes come first, then index changes, then untracked
/// files. A path that appears in several sets is listed once, under the
/// first set it appears in. Renames are reported as a deletion plus an
/// addition so per-file commits can stage each half.
pub fn collect_changes(repo: &Repository) -> Result<Vec<ChangedFile>, ScmError> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);

    let statuses = repo.statuses(Some(&mut opts)).map_err(ScmError::StatusFailed)?;

    let mut working_tree = Vec::new();
    let mut index = Vec::new();
    let mut untracked = Vec::new();

    for entry in statuses.iter() {
        let status = entry.status();
        if status.contains(Status::IGNORED) {
            continue;
        }

        // No rename detection: a staged rename lists both its old and new path
        let Some(path) = entry.path().map(str::to_string) else {
            continue;
        };

        if status.intersects(WORKING_TREE_FLAGS) {
            working_tree.push(ChangedFile::new(path.clone(), ChangeKind::WorkingTree));
        }
        if status.intersects(INDEX_FLAGS) {
            index.push(ChangedFile::new(path.clone(), ChangeKind::Index));
        }
        if status.contains(Status::WT_NEW) {
            untracked.push(ChangedFile::new(path, ChangeKind::Untracked));
        }
    }

    Ok(merge_change_sets(working_tree, index, untracked))
}

/// Concatenate the three change sets, keeping the first entry per path.
pub fn merge_change_sets(
    working_tree: Vec<ChangedFile>,
    index: Vec<ChangedFile>,
    untracked: Vec<ChangedFile>,
) -> Vec<ChangedFile> {
    let mut merged: Vec<ChangedFile> = Vec::new();
    for file in working_tree.into_iter().chain(index).chain(untracked) {
        if !merged.iter().any(|f| f.path == file.path) {
            merged.push(file);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_repo_with_commit(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        std::fs::write(dir.join("tracked.txt"), "original\n").unwrap();
        {
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("tracked.txt")).unwrap();
            index.write().unwrap();
            let tree_id = index.write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            let sig = git2::Signature::now("Test", "test@test.com").unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
                .unwrap();
        }
        repo
    }

    #[test]
    fn test_file_name_is_last_component() {
        let file = ChangedFile::new("src/scm/changes.rs", ChangeKind::Index);
        assert_eq!(file.file_name(), "changes.rs");

        let top = ChangedFile::new("README.md", ChangeKind::Untracked);
        assert_eq!(top.file_name(), "README.md");
    }

    #[test]
    fn test_merge_keeps_first_occurrence() {
        let merged = merge_change_sets(
            vec![ChangedFile::new("a.txt", ChangeKind::WorkingTree)],
            vec![
                ChangedFile::new("a.txt", ChangeKind::Index),
                ChangedFile::new("b.txt", ChangeKind::Index),
            ],
            vec![ChangedFile::new("c.txt", ChangeKind::Untracked)],
        );

        assert_eq!(
            merged,
            vec![
                ChangedFile::new("a.txt", ChangeKind::WorkingTree),
                ChangedFile::new("b.txt", ChangeKind::Index),
                ChangedFile::new("c.txt", ChangeKind::Untracked),
            ]
        );
    }

    #[test]
    fn test_clean_repo_has_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path());

        assert!(collect_changes(&repo).unwrap().is_empty());
    }

    #[test]
    fn test_collect_changes_orders_sets() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path());

        // Staged new file
        std::fs::write(dir.path().join("staged.txt"), "staged\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("staged.txt")).unwrap();
        index.write().unwrap();

        // Unstaged modification and an untracked file
        std::fs::write(dir.path().join("tracked.txt"), "changed\n").unwrap();
        std::fs::write(dir.path().join("new.txt"), "new\n").unwrap();

        let changes = collect_changes(&repo).unwrap();
        assert_eq!(
            changes,
            vec![
                ChangedFile::new("tracked.txt", ChangeKind::WorkingTree),
                ChangedFile::new("staged.txt", ChangeKind::Index),
                ChangedFile::new("new.txt", ChangeKind::Untracked),
            ]
        );
    }

    #[test]
    fn test_collect_changes_lists_deleted_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path());

        std::fs::remove_file(dir.path().join("tracked.txt")).unwrap();

        let changes = collect_changes(&repo).unwrap();
        assert_eq!(
            changes,
            vec![ChangedFile::new("tracked.txt", ChangeKind::WorkingTree)]
        );
    }

    #[test]
    fn test_collect_changes_recurses_untracked_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path());

        std::fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        std::fs::write(dir.path().join("nested/deeper/file.rs"), "fn main() {}\n").unwrap();

        let changes = collect_changes(&repo).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "nested/deeper/file.rs");
        assert_eq!(changes[0].file_name(), "file.rs");
    }

    #[test]
    fn test_staged_rename_lists_both_paths() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path());

        // git mv tracked.txt moved.txt
        std::fs::rename(dir.path().join("tracked.txt"), dir.path().join("moved.txt")).unwrap();
        let mut index = repo.index().unwrap();
        index.remove_path(Path::new("tracked.txt")).unwrap();
        index.add_path(Path::new("moved.txt")).unwrap();
        index.write().unwrap();

        let changes = collect_changes(&repo).unwrap();
        assert_eq!(
            changes,
            vec![
                ChangedFile::new("moved.txt", ChangeKind::Index),
                ChangedFile::new("tracked.txt", ChangeKind::Index),
            ]
        );
    }
}
