//! Provider selection and fallback orchestration.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::claude;
use crate::codex;
use crate::error::{ClaudeError, CodexError};

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Claude,
    Codex,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Claude => "Claude",
            Provider::Codex => "Codex",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(Provider::Claude),
            "codex" => Ok(Provider::Codex),
            other => Err(format!("Unknown provider: {other}")),
        }
    }
}

/// Primary + fallback selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSelection {
    pub primary: Provider,
    pub fallback: Provider,
}

impl ProviderSelection {
    pub fn from_primary(primary: Provider) -> Self {
        let fallback = match primary {
            Provider::Claude => Provider::Codex,
            Provider::Codex => Provider::Claude,
        };
        Self { primary, fallback }
    }

    fn swapped(self) -> Self {
        Self {
            primary: self.fallback,
            fallback: self.primary,
        }
    }
}

impl Default for ProviderSelection {
    fn default() -> Self {
        ProviderSelection::from_primary(Provider::Claude)
    }
}

/// Provider-specific error wrapper.
#[derive(Debug)]
pub enum LlmProviderError {
    Claude(ClaudeError),
    Codex(CodexError),
}

impl LlmProviderError {
    pub fn provider(&self) -> Provider {
        match self {
            LlmProviderError::Claude(_) => Provider::Claude,
            LlmProviderError::Codex(_) => Provider::Codex,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            LlmProviderError::Claude(err) => summarize_claude_error(err),
            LlmProviderError::Codex(err) => summarize_codex_error(err),
        }
    }

    pub fn detail(&self) -> String {
        match self {
            LlmProviderError::Claude(err) => err.to_string(),
            LlmProviderError::Codex(err) => err.to_string(),
        }
    }
}

impl fmt::Display for LlmProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for LlmProviderError {}

impl From<ClaudeError> for LlmProviderError {
    fn from(err: ClaudeError) -> Self {
        LlmProviderError::Claude(err)
    }
}

impl From<CodexError> for LlmProviderError {
    fn from(err: CodexError) -> Self {
        LlmProviderError::Codex(err)
    }
}

/// Both providers failed.
#[derive(Debug)]
pub struct LlmError {
    pub primary: Provider,
    pub primary_error: LlmProviderError,
    pub fallback: Provider,
    pub fallback_error: LlmProviderError,
}

impl LlmError {
    pub fn summary(&self) -> String {
        format!(
            "Both LLM providers failed. {} error: {}. {} error: {}.",
            self.primary,
            self.primary_error.summary(),
            self.fallback,
            self.fallback_error.summary()
        )
    }

    pub fn detailed(&self) -> String {
        format!(
            "Both LLM providers failed. {} error: {}. {} error: {}.",
            self.primary,
            self.primary_error.detail(),
            self.fallback,
            self.fallback_error.detail()
        )
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for LlmError {}

/// Successful generation with the provider that produced it.
#[derive(Debug)]
pub struct LlmCompletion {
    pub output: String,
    pub provider: Provider,
    pub primary_error: Option<LlmProviderError>,
}

#[async_trait]
pub(crate) trait ProviderRunner: Send + Sync {
    async fn run(&self, provider: Provider, prompt: &str) -> Result<String, LlmProviderError>;
}

pub(crate) struct DefaultRunner;

#[async_trait]
impl ProviderRunner for DefaultRunner {
    async fn run(&self, provider: Provider, prompt: &str) -> Result<String, LlmProviderError> {
        match provider {
            Provider::Claude => claude::generate_with_retry(prompt)
                .await
                .map_err(LlmProviderError::from),
            Provider::Codex => codex::generate_with_retry(prompt)
                .await
                .map_err(LlmProviderError::from),
        }
    }
}

/// Provider router with fallback and stickiness.
///
/// After the fallback succeeds it becomes the primary for later calls, so a
/// per-file run does not pay for a broken provider on every file.
pub struct LlmRouter {
    selection: Mutex<ProviderSelection>,
}

impl LlmRouter {
    pub fn new(selection: ProviderSelection) -> Self {
        Self {
            selection: Mutex::new(selection),
        }
    }

    pub fn selection(&self) -> ProviderSelection {
        self.selection
            .lock()
            .map(|s| *s)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    fn set_selection(&self, selection: ProviderSelection) {
        match self.selection.lock() {
            Ok(mut guard) => *guard = selection,
            Err(poisoned) => *poisoned.into_inner() = selection,
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<LlmCompletion, LlmError> {
        self.generate_with_runner(prompt, &DefaultRunner).await
    }

    pub(crate) async fn generate_with_runner<R: ProviderRunner>(
        &self,
        prompt: &str,
        runner: &R,
    ) -> Result<LlmCompletion, LlmError> {
        let selection = self.selection();

        let primary_error = match runner.run(selection.primary, prompt).await {
            Ok(output) => {
                return Ok(LlmCompletion {
                    output,
                    provider: selection.primary,
                    primary_error: None,
                });
            }
            Err(e) => e,
        };

        warn!(
            "{} failed ({}), trying {}",
            selection.primary,
            primary_error.summary(),
            selection.fallback
        );
        debug!("{} error detail: {}", selection.primary, primary_error.detail());

        match runner.run(selection.fallback, prompt).await {
            Ok(output) => {
                self.set_selection(selection.swapped());
                Ok(LlmCompletion {
                    output,
                    provider: selection.fallback,
                    primary_error: Some(primary_error),
                })
            }
            Err(fallback_error) => Err(LlmError {
                primary: selection.primary,
                primary_error,
                fallback: selection.fallback,
                fallback_error,
            }),
        }
    }
}

fn summarize_claude_error(err: &ClaudeError) -> String {
    match err {
        ClaudeError::NotInstalled => "Claude CLI not found".to_string(),
        ClaudeError::ExecutionFailed(_) => "Claude CLI reported an error".to_string(),
        ClaudeError::SpawnFailed(_) => "Failed to start Claude CLI".to_string(),
        ClaudeError::InvalidJson(_) => "Claude returned an empty result".to_string(),
        ClaudeError::Timeout(secs) => format!("Claude timed out after {}s", secs),
        ClaudeError::NonZeroExit { code, .. } => format!("Claude CLI exited with code {}", code),
        ClaudeError::RetriesExhausted(_) => "Claude failed after retries".to_string(),
    }
}

fn summarize_codex_error(err: &CodexError) -> String {
    match err {
        CodexError::NotInstalled => "Codex CLI not found".to_string(),
        CodexError::ExecutionFailed(_) => "Codex CLI reported an error".to_string(),
        CodexError::SpawnFailed(_) => "Failed to start Codex CLI".to_string(),
        CodexError::Timeout(secs) => format!("Codex timed out after {}s", secs),
        CodexError::NonZeroExit { code, .. } => format!("Codex CLI exited with code {}", code),
        CodexError::RetriesExhausted(_) => "Codex failed after retries".to_string(),
    }
}
