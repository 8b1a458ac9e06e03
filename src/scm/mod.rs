//! Source-control provider: staging, committing, pushing and change enumeration.

pub mod changes;
pub mod diff;
pub mod push;
pub mod repository;

use async_trait::async_trait;

use crate::error::ScmError;

pub use changes::{ChangeKind, ChangedFile};
pub use diff::{DiffSummary, FileStatus};
pub use repository::{GitRepository, open_repository};

/// Operations the orchestrator needs from a single repository.
///
/// This abstraction allows mocking the provider in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Stage every change in the working tree, including deletions.
    async fn stage_all(&self) -> Result<(), ScmError>;

    /// Stage exactly the given repository-relative paths.
    async fn stage_paths(&self, paths: &[String]) -> Result<(), ScmError>;

    /// Reset the index to HEAD without touching the working tree.
    async fn unstage_all(&self) -> Result<(), ScmError>;

    /// Commit the index on HEAD. Returns the new commit id.
    async fn commit(&self, message: &str) -> Result<String, ScmError>;

    /// Push the current branch.
    async fn push(&self) -> Result<(), ScmError>;

    /// Working-tree, index and untracked changes, in that order.
    async fn changes(&self) -> Result<Vec<ChangedFile>, ScmError>;

    /// Diff of the index against HEAD.
    async fn staged_diff(&self) -> Result<DiffSummary, ScmError>;

    /// Short name of the checked-out branch.
    async fn branch_name(&self) -> Result<String, ScmError>;
}
