//! Claude generation with retry and response-envelope parsing.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ClaudeError;
use crate::llm::retry::{RetryPolicy, retry_with_backoff};

use super::subprocess::run_claude;

/// Trait for executing Claude CLI commands.
///
/// This abstraction allows mocking the Claude subprocess in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClaudeExecutor: Send + Sync {
    /// Run Claude with the given prompt and return the raw stdout.
    async fn run(&self, prompt: &str) -> Result<String, ClaudeError>;
}

/// Default executor that calls the real Claude CLI.
pub struct DefaultExecutor;

#[async_trait]
impl ClaudeExecutor for DefaultExecutor {
    async fn run(&self, prompt: &str) -> Result<String, ClaudeError> {
        run_claude(prompt).await
    }
}

/// Generate a response with retry, returning Claude's result text.
pub async fn generate_with_retry(prompt: &str) -> Result<String, ClaudeError> {
    generate_with_retry_impl(prompt, &DefaultExecutor, RetryPolicy::default()).await
}

/// Internal implementation that accepts any executor (for testing).
pub(crate) async fn generate_with_retry_impl<E: ClaudeExecutor>(
    prompt: &str,
    executor: &E,
    policy: RetryPolicy,
) -> Result<String, ClaudeError> {
    retry_with_backoff(
        policy,
        || async {
            let response = executor.run(prompt).await?;
            parse_claude_response(&response)
        },
        // Retrying cannot install the CLI
        |e: &ClaudeError| !matches!(e, ClaudeError::NotInstalled),
        |e| ClaudeError::RetriesExhausted(Box::new(e)),
    )
    .await
}

/// Claude CLI JSON envelope when using `--output-format json`.
#[derive(Deserialize)]
struct ClaudeCliResponse {
    result: String,
    #[serde(default)]
    is_error: bool,
}

/// Unwrap the CLI envelope; raw text passes through unchanged.
fn parse_claude_response(response: &str) -> Result<String, ClaudeError> {
    let content = match serde_json::from_str::<ClaudeCliResponse>(response) {
        Ok(envelope) if envelope.is_error => {
            return Err(ClaudeError::ExecutionFailed(envelope.result));
        }
        Ok(envelope) => envelope.result,
        Err(_) => response.to_string(),
    };

    if content.trim().is_empty() {
        return Err(ClaudeError::InvalidJson("empty result".to_string()));
    }

    Ok(content)
}
