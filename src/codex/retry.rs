//! Codex generation with retry.

use async_trait::async_trait;

use crate::error::CodexError;
use crate::llm::retry::{RetryPolicy, retry_with_backoff};

use super::subprocess::run_codex;

/// Trait for executing Codex CLI commands.
///
/// This abstraction allows mocking the Codex subprocess in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodexExecutor: Send + Sync {
    /// Run Codex with the given prompt and return its final message.
    async fn run(&self, prompt: &str) -> Result<String, CodexError>;
}

/// Default executor that calls the real Codex CLI.
pub struct DefaultExecutor;

#[async_trait]
impl CodexExecutor for DefaultExecutor {
    async fn run(&self, prompt: &str) -> Result<String, CodexError> {
        run_codex(prompt).await
    }
}

/// Generate a response with retry.
pub async fn generate_with_retry(prompt: &str) -> Result<String, CodexError> {
    generate_with_retry_impl(prompt, &DefaultExecutor, RetryPolicy::default()).await
}

/// Internal implementation that accepts any executor (for testing).
pub(crate) async fn generate_with_retry_impl<E: CodexExecutor>(
    prompt: &str,
    executor: &E,
    policy: RetryPolicy,
) -> Result<String, CodexError> {
    retry_with_backoff(
        policy,
        || async {
            let response = executor.run(prompt).await?;
            if response.trim().is_empty() {
                return Err(CodexError::ExecutionFailed("empty response".to_string()));
            }
            Ok(response)
        },
        |e: &CodexError| !matches!(e, CodexError::NotInstalled),
        |e| CodexError::RetriesExhausted(Box::new(e)),
    )
    .await
}
