//! git2-backed [`SourceControl`] implementation.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use git2::{ErrorCode, IndexAddOption, Repository, ResetType};
use tracing::debug;

use crate::error::ScmError;

use super::SourceControl;
use super::changes::{ChangedFile, collect_changes};
use super::diff::{DiffSummary, collect_staged_diff, resolve_head_tree};
use super::push;

/// The single repository a run operates on.
pub struct GitRepository {
    repo: Mutex<Repository>,
    workdir: PathBuf,
    remote: Option<String>,
}

/// Discover the repository containing `path`.
///
/// Searches upward from `path`; the first repository found is used.
pub fn open_repository(path: &Path) -> Result<GitRepository, ScmError> {
    let repo = Repository::discover(path).map_err(ScmError::RepositoryNotFound)?;
    let workdir = repo
        .workdir()
        .ok_or(ScmError::BareRepository)?
        .to_path_buf();

    debug!("Opened repository at {}", workdir.display());

    Ok(GitRepository {
        repo: Mutex::new(repo),
        workdir,
        remote: None,
    })
}

impl GitRepository {
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Push to `remote` instead of the branch's upstream.
    pub fn with_remote(mut self, remote: Option<String>) -> Self {
        self.remote = remote;
        self
    }

    fn with_repo<T>(
        &self,
        f: impl FnOnce(&Repository) -> Result<T, ScmError>,
    ) -> Result<T, ScmError> {
        let repo = self
            .repo
            .lock()
            .map_err(|_| ScmError::TaskFailed("repository lock poisoned".to_string()))?;
        f(&repo)
    }
}

fn stage_everything(repo: &Repository) -> Result<(), ScmError> {
    let pathspecs = ["*"];
    let mut index = repo.index().map_err(ScmError::StagingFailed)?;
    index
        .add_all(pathspecs, IndexAddOption::DEFAULT, None)
        .map_err(ScmError::StagingFailed)?;
    // add_all never records removals; update_all picks up deleted tracked files
    index
        .update_all(pathspecs, None)
        .map_err(ScmError::StagingFailed)?;
    index.write().map_err(ScmError::StagingFailed)
}

/// Stage each path as written; no pathspec matching.
fn stage_exact(repo: &Repository, workdir: &Path, paths: &[String]) -> Result<(), ScmError> {
    let mut index = repo.index().map_err(ScmError::StagingFailed)?;
    for path in paths {
        let relative = Path::new(path);
        if workdir.join(relative).symlink_metadata().is_ok() {
            index.add_path(relative).map_err(ScmError::StagingFailed)?;
        } else {
            // Gone from disk: stage the removal
            index.remove_path(relative).map_err(ScmError::StagingFailed)?;
        }
    }
    index.write().map_err(ScmError::StagingFailed)
}

fn unstage(repo: &Repository) -> Result<(), ScmError> {
    match repo.head().and_then(|h| h.peel_to_commit()) {
        Ok(head) => repo
            .reset(head.as_object(), ResetType::Mixed, None)
            .map_err(ScmError::StagingFailed),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            let mut index = repo.index().map_err(ScmError::StagingFailed)?;
            index.clear().map_err(ScmError::StagingFailed)?;
            index.write().map_err(ScmError::StagingFailed)
        }
        Err(e) => Err(ScmError::StagingFailed(e)),
    }
}

fn commit_index(repo: &Repository, message: &str) -> Result<String, ScmError> {
    let mut index = repo.index().map_err(ScmError::CommitFailed)?;
    let tree_id = index.write_tree().map_err(ScmError::CommitFailed)?;
    let tree = repo.find_tree(tree_id).map_err(ScmError::CommitFailed)?;

    let head_tree = resolve_head_tree(repo).map_err(|e| match e {
        ScmError::DiffFailed(inner) => ScmError::CommitFailed(inner),
        other => other,
    })?;
    let unchanged = match &head_tree {
        Some(head_tree) => head_tree.id() == tree_id,
        None => index.is_empty(),
    };
    if unchanged {
        return Err(ScmError::CommitFailed(git2::Error::from_str(
            "nothing staged to commit",
        )));
    }

    let sig = repo.signature().map_err(ScmError::ConfigError)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(ScmError::CommitFailed)?),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(ScmError::CommitFailed(e)),
    };
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(ScmError::CommitFailed)?;

    Ok(oid.to_string())
}

fn current_branch(repo: &Repository) -> Result<String, ScmError> {
    match repo.head() {
        Ok(head) if head.is_branch() => Ok(head.shorthand().unwrap_or("HEAD").to_string()),
        Ok(_) => Ok("HEAD".to_string()),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            // Unborn: HEAD still names the branch-to-be
            let name = repo
                .find_reference("HEAD")
                .ok()
                .and_then(|r| r.symbolic_target().map(str::to_string))
                .and_then(|t| t.strip_prefix("refs/heads/").map(str::to_string));
            Ok(name.unwrap_or_else(|| "HEAD".to_string()))
        }
        Err(e) => Err(ScmError::StatusFailed(e)),
    }
}

#[async_trait]
impl SourceControl for GitRepository {
    async fn stage_all(&self) -> Result<(), ScmError> {
        self.with_repo(stage_everything)
    }

    async fn stage_paths(&self, paths: &[String]) -> Result<(), ScmError> {
        self.with_repo(|repo| stage_exact(repo, &self.workdir, paths))
    }

    async fn unstage_all(&self) -> Result<(), ScmError> {
        self.with_repo(unstage)
    }

    async fn commit(&self, message: &str) -> Result<String, ScmError> {
        self.with_repo(|repo| commit_index(repo, message))
    }

    async fn push(&self) -> Result<(), ScmError> {
        push::push(&self.workdir, self.remote.as_deref()).await
    }

    async fn changes(&self) -> Result<Vec<ChangedFile>, ScmError> {
        self.with_repo(collect_changes)
    }

    async fn staged_diff(&self) -> Result<DiffSummary, ScmError> {
        self.with_repo(collect_staged_diff)
    }

    async fn branch_name(&self) -> Result<String, ScmError> {
        self.with_repo(current_branch)
    }
}
