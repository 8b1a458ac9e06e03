//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

use autocommit::error::GeneratorError;
use autocommit::generate::{GenerationHandle, GenerationRequest, InputBox, MessageGenerator};

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository with a committer identity.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config
                .set_str("user.name", "Test User")
                .expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Get the test signature for commits.
    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write a file relative to the work directory, creating parent dirs.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&path, content).expect("Failed to write test file");
    }

    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.dir.path().join(relative)).expect("Failed to remove file");
    }

    /// Rename a tracked file and stage the rename, like `git mv`.
    pub fn stage_rename(&self, from: &str, to: &str) {
        std::fs::rename(self.dir.path().join(from), self.dir.path().join(to))
            .expect("Failed to rename file");
        let mut index = self.repo.index().expect("Failed to get index");
        index.remove_path(Path::new(from)).expect("Failed to remove path");
        index.add_path(Path::new(to)).expect("Failed to add path");
        index.write().expect("Failed to write index");
    }

    /// Write the given files and commit them directly. Returns the commit OID.
    pub fn commit_files(&self, files: &[(&str, &str)], message: &str) -> Oid {
        let sig = self.signature();

        let mut index = self.repo.index().expect("Failed to get index");
        for (path, content) in files {
            self.write(path, content);
            index.add_path(Path::new(path)).expect("Failed to add file");
        }
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        // Get parent commit if exists
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Number of commits reachable from HEAD (0 on an unborn branch).
    pub fn commit_count(&self) -> usize {
        let Ok(head) = self.repo.head() else {
            return 0;
        };
        let mut walk = self.repo.revwalk().expect("Failed to create revwalk");
        walk.push(head.target().expect("HEAD has no target"))
            .expect("Failed to push HEAD");
        walk.count()
    }

    /// Messages of commits reachable from HEAD, newest first.
    pub fn messages(&self) -> Vec<String> {
        let Ok(head) = self.repo.head() else {
            return Vec::new();
        };
        let mut walk = self.repo.revwalk().expect("Failed to create revwalk");
        walk.push(head.target().expect("HEAD has no target"))
            .expect("Failed to push HEAD");
        walk.map(|oid| {
            let commit = self
                .repo
                .find_commit(oid.expect("Invalid oid"))
                .expect("Failed to find commit");
            commit.message().unwrap_or_default().trim_end().to_string()
        })
        .collect()
    }

    /// Paths changed by a commit relative to its first parent.
    pub fn paths_in_commit(&self, id: &str) -> Vec<String> {
        let commit = self
            .repo
            .find_commit(Oid::from_str(id).expect("Invalid commit id"))
            .expect("Failed to find commit");
        let tree = commit.tree().expect("Failed to read tree");
        let parent_tree = commit.parent(0).ok().map(|p| p.tree().expect("Failed to read tree"));
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .expect("Failed to diff commit");

        let mut paths: Vec<String> = diff
            .deltas()
            .filter_map(|d| {
                d.new_file()
                    .path()
                    .or_else(|| d.old_file().path())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
            })
            .collect();
        paths.sort();
        paths
    }

    /// Short name of the checked-out branch.
    pub fn branch(&self) -> String {
        let head = self.repo.find_reference("HEAD").expect("Failed to read HEAD");
        head.symbolic_target()
            .and_then(|t| t.strip_prefix("refs/heads/"))
            .unwrap_or("HEAD")
            .to_string()
    }

    /// Add a bare repository as remote `name`. Returns the bare repo's dir.
    pub fn add_bare_remote(&self, name: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        Repository::init_bare(dir.path()).expect("Failed to init bare repo");
        self.repo
            .remote(name, &dir.path().to_string_lossy())
            .expect("Failed to add remote");
        dir
    }
}

/// Writes a fixed value, or `<prefix> <focus file>` per file, into the box.
pub struct ScriptedGenerator {
    reply: Reply,
    pub calls: Mutex<Vec<GenerationRequest>>,
}

pub enum Reply {
    /// Never write anything.
    Silent,
    /// Always write this value.
    Fixed(&'static str),
    /// Write `<prefix> <focus file>`.
    PerFile(&'static str),
}

impl ScriptedGenerator {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

#[async_trait]
impl MessageGenerator for ScriptedGenerator {
    async fn trigger(
        &self,
        request: GenerationRequest,
        input: InputBox,
    ) -> Result<GenerationHandle, GeneratorError> {
        match &self.reply {
            Reply::Silent => {}
            Reply::Fixed(value) => input.set(*value),
            Reply::PerFile(prefix) => input.set(format!(
                "{} {}",
                prefix,
                request.focus_file.as_deref().unwrap_or("everything")
            )),
        }
        self.calls.lock().expect("calls lock").push(request);
        Ok(GenerationHandle::finished())
    }
}
