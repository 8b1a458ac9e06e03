//! Stage, generate, commit and push.
//!
//! Every step reports its own failure through a [`Notifier`] and the run
//! carries on with a fallback; nothing here returns an error to the caller.

pub mod notify;
pub mod poll;

use tracing::debug;

use crate::config::Config;
use crate::generate::{GenerationRequest, InputBox, MessageGenerator};
use crate::message::{BATCH_FALLBACK_MESSAGE, apply_conventional, is_generated, per_file_fallback};
use crate::scm::{ChangedFile, SourceControl};

pub use notify::{ConsoleNotifier, MemoryNotifier, Notice, Notifier};
pub use poll::{PollOutcome, wait_for_message};

const GENERATION_FAILED_HINT: &str =
    "Failed to generate commit message. Make sure the generator is available and try again.";

/// A commit created during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// The file it holds in per-file mode; `None` for a batch commit.
    pub path: Option<String>,
    pub message: String,
    pub id: String,
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub committed: Vec<CommitRecord>,
    /// Files whose stage or commit failed; `None` for the batch commit.
    pub failed: Vec<Option<String>>,
    pub pushed: bool,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One run over a single repository.
pub struct AutoCommit<'a> {
    scm: &'a dyn SourceControl,
    generator: &'a dyn MessageGenerator,
    notifier: &'a dyn Notifier,
    config: &'a Config,
    input: InputBox,
}

impl<'a> AutoCommit<'a> {
    pub fn new(
        scm: &'a dyn SourceControl,
        generator: &'a dyn MessageGenerator,
        notifier: &'a dyn Notifier,
        config: &'a Config,
    ) -> Self {
        Self {
            scm,
            generator,
            notifier,
            config,
            input: InputBox::new(),
        }
    }

    /// The message field generators write into.
    pub fn input(&self) -> &InputBox {
        &self.input
    }

    pub async fn stage_all_changes(&self) -> bool {
        match self.scm.stage_all().await {
            Ok(()) => true,
            Err(e) => {
                self.notifier
                    .error(&format!("Failed to stage changes: {}", e));
                false
            }
        }
    }

    pub async fn stage_file(&self, path: &str) -> bool {
        match self.scm.stage_paths(&[path.to_string()]).await {
            Ok(()) => true,
            Err(e) => {
                self.notifier
                    .error(&format!("Failed to stage {}: {}", path, e));
                false
            }
        }
    }

    /// Message for all changes. Falls back to [`BATCH_FALLBACK_MESSAGE`].
    pub async fn generate_commit_message(&self) -> String {
        if let Err(e) = self.scm.stage_all().await {
            self.notifier
                .error(&format!("Failed to generate commit message: {}", e));
            return BATCH_FALLBACK_MESSAGE.to_string();
        }

        let request = self.request(None).await;
        self.input.clear();
        let mut handle = match self.generator.trigger(request, self.input.clone()).await {
            Ok(handle) => handle,
            Err(e) => {
                self.notifier
                    .error(&format!("Failed to generate commit message: {}", e));
                return BATCH_FALLBACK_MESSAGE.to_string();
            }
        };

        let outcome = wait_for_message(
            &self.input,
            &mut handle,
            self.config.poll_interval,
            self.config.poll_attempts,
            is_generated,
        )
        .await;
        drop(handle);

        match outcome {
            PollOutcome::Message(message) => message,
            PollOutcome::Failed(e) => {
                self.notifier
                    .error(&format!("Failed to generate commit message: {}", e));
                BATCH_FALLBACK_MESSAGE.to_string()
            }
            PollOutcome::NotGenerated | PollOutcome::Exhausted => {
                self.notifier.error(GENERATION_FAILED_HINT);
                BATCH_FALLBACK_MESSAGE.to_string()
            }
        }
    }

    /// Message for one file. Falls back to `update: changes in <name>`
    /// without reporting anything.
    pub async fn generate_commit_message_for_file(&self, file: &ChangedFile) -> String {
        let fallback = per_file_fallback(file);

        if let Err(e) = self.scm.stage_paths(&[file.path.clone()]).await {
            debug!("Staging {} for generation failed: {}", file.path, e);
            return fallback;
        }

        let request = self.request(Some(&file.path)).await;
        self.input.clear();
        let mut handle = match self.generator.trigger(request, self.input.clone()).await {
            Ok(handle) => handle,
            Err(e) => {
                debug!("Generator did not start for {}: {}", file.path, e);
                return fallback;
            }
        };

        // A box still holding the batch fallback was not written for this file
        let outcome = wait_for_message(
            &self.input,
            &mut handle,
            self.config.poll_interval,
            self.config.poll_attempts,
            |value| is_generated(value) && value.trim() != BATCH_FALLBACK_MESSAGE,
        )
        .await;
        drop(handle);

        match outcome {
            PollOutcome::Message(message) => message,
            PollOutcome::Failed(e) => {
                debug!("Generation failed for {}: {}", file.path, e);
                fallback
            }
            PollOutcome::NotGenerated | PollOutcome::Exhausted => fallback,
        }
    }

    /// Commit the index. Returns the new commit id.
    pub async fn commit_changes(&self, message: &str) -> Option<String> {
        match self.scm.commit(message).await {
            Ok(id) => Some(id),
            Err(e) => {
                self.notifier.error(&format!("Failed to commit: {}", e));
                None
            }
        }
    }

    pub async fn push_changes(&self) -> bool {
        match self.scm.push().await {
            Ok(()) => {
                self.notifier.info("Changes pushed successfully!");
                true
            }
            Err(e) => {
                self.notifier.error(&format!("Failed to push: {}", e));
                false
            }
        }
    }

    pub async fn get_changed_files(&self) -> Vec<ChangedFile> {
        match self.scm.changes().await {
            Ok(files) => files,
            Err(e) => {
                self.notifier
                    .error(&format!("Failed to read changes: {}", e));
                Vec::new()
            }
        }
    }

    /// Run the whole pipeline once.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();

        let files = self.get_changed_files().await;
        if files.is_empty() {
            self.notifier.info("No changes to commit");
            return report;
        }
        debug!(
            "{} changed file(s), batch={}",
            files.len(),
            self.config.batch_commit
        );

        if self.config.batch_commit {
            self.run_batch(&mut report).await;
        } else {
            self.run_per_file(&files, &mut report).await;
        }

        if self.config.auto_push && !report.committed.is_empty() && report.failed.is_empty() {
            report.pushed = self.push_changes().await;
        } else if self.config.auto_push {
            debug!(
                "Skipping push: {} committed, {} failed",
                report.committed.len(),
                report.failed.len()
            );
        }

        report
    }

    async fn run_batch(&self, report: &mut RunReport) {
        if !self.stage_all_changes().await {
            report.failed.push(None);
            return;
        }

        let message = self.finalize(self.generate_commit_message().await);
        match self.commit_changes(&message).await {
            Some(id) => {
                self.notifier.info(&format!("Committed all changes: {}", subject(&message)));
                report.committed.push(CommitRecord {
                    path: None,
                    message,
                    id,
                });
            }
            None => report.failed.push(None),
        }
    }

    async fn run_per_file(&self, files: &[ChangedFile], report: &mut RunReport) {
        // Each commit must hold exactly one file
        if let Err(e) = self.scm.unstage_all().await {
            self.notifier
                .error(&format!("Failed to reset staged changes: {}", e));
            report
                .failed
                .extend(files.iter().map(|f| Some(f.path.clone())));
            return;
        }

        for file in files {
            if !self.stage_file(&file.path).await {
                report.failed.push(Some(file.path.clone()));
                continue;
            }

            let message = self.finalize(self.generate_commit_message_for_file(file).await);
            match self.commit_changes(&message).await {
                Some(id) => {
                    self.notifier.info(&format!("Committed {}", file.path));
                    report.committed.push(CommitRecord {
                        path: Some(file.path.clone()),
                        message,
                        id,
                    });
                }
                None => {
                    report.failed.push(Some(file.path.clone()));
                    // Keep the failed file out of the next commit
                    if let Err(e) = self.scm.unstage_all().await {
                        debug!("Could not unstage {}: {}", file.path, e);
                    }
                }
            }
        }
    }

    async fn request(&self, focus_file: Option<&str>) -> GenerationRequest {
        let diff = self.scm.staged_diff().await.unwrap_or_else(|e| {
            debug!("No staged diff for the generator: {}", e);
            Default::default()
        });
        let branch = self.scm.branch_name().await.unwrap_or_else(|e| {
            debug!("Could not read branch name: {}", e);
            "HEAD".to_string()
        });

        GenerationRequest {
            diff,
            branch,
            focus_file: focus_file.map(str::to_string),
            conventional_type: self.config.conventional_type().map(str::to_string),
        }
    }

    fn finalize(&self, message: String) -> String {
        match self.config.conventional_type() {
            Some(default_type) => apply_conventional(&message, default_type),
            None => message,
        }
    }
}

fn subject(message: &str) -> &str {
    message.lines().next().unwrap_or_default()
}

/// Run once with the given collaborators.
pub async fn run(
    scm: &dyn SourceControl,
    generator: &dyn MessageGenerator,
    notifier: &dyn Notifier,
    config: &Config,
) -> RunReport {
    AutoCommit::new(scm, generator, notifier, config).run().await
}
