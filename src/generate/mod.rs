//! Commit message generators.
//!
//! A generator is triggered, runs in the background, and writes its result
//! into an [`InputBox`]. The orchestrator polls the box; it never waits on
//! the generator directly.

pub mod command;
pub mod input_box;
pub mod llm;
pub mod prompt;

use std::future::Future;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::error::GeneratorError;
use crate::scm::DiffSummary;

pub use command::CommandGenerator;
pub use input_box::InputBox;
pub use llm::LlmGenerator;
pub use prompt::build_commit_prompt;

/// Context handed to a generator.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub diff: DiffSummary,
    pub branch: String,
    /// Set in per-file mode.
    pub focus_file: Option<String>,
    /// Default type when Conventional Commits formatting is enabled.
    pub conventional_type: Option<String>,
}

/// An in-flight generation. Dropping it cancels the work.
#[derive(Debug)]
pub struct GenerationHandle {
    task: Option<JoinHandle<Result<(), GeneratorError>>>,
}

impl GenerationHandle {
    /// Run `work` in the background.
    pub fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = Result<(), GeneratorError>> + Send + 'static,
    {
        Self {
            task: Some(tokio::spawn(work)),
        }
    }

    /// A handle for work that already finished.
    pub fn finished() -> Self {
        Self { task: None }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    /// The error the work ended with, if it has ended with one.
    ///
    /// Returns `None` while the work is still running, after success, and
    /// on every call after the outcome was first collected.
    pub async fn failure(&mut self) -> Option<GeneratorError> {
        if !self.is_finished() {
            return None;
        }
        let task = self.task.take()?;
        match task.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(join_error) if join_error.is_cancelled() => None,
            Err(join_error) => Some(GeneratorError::InvalidResponse(format!(
                "generator task panicked: {join_error}"
            ))),
        }
    }

    pub fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Drop for GenerationHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Something that can fill the input box with a commit message.
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    /// Start generating a message for `request`.
    ///
    /// Returns as soon as the work is started; the message lands in `input`.
    async fn trigger(
        &self,
        request: GenerationRequest,
        input: InputBox,
    ) -> Result<GenerationHandle, GeneratorError>;
}
