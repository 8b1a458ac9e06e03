//! Error types for autocommit modules using thiserror.

use thiserror::Error;

/// Errors from source-control operations.
#[derive(Error, Debug)]
pub enum ScmError {
    #[error("No git repository found: {0}")]
    RepositoryNotFound(#[source] git2::Error),

    #[error("Bare repositories are not supported")]
    BareRepository,

    #[error("Failed to read repository status: {0}")]
    StatusFailed(#[source] git2::Error),

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("{0}")]
    StagingFailed(#[source] git2::Error),

    #[error("{0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    ConfigError(#[source] git2::Error),

    #[error("Failed to run git {operation}: {source}")]
    SpawnFailed {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {operation} failed: {stderr}")]
    GitFailed { operation: String, stderr: String },

    #[error("Source-control task failed: {0}")]
    TaskFailed(String),
}

/// Errors from Claude CLI operations.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Claude Code CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Claude returned invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Claude process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<ClaudeError>),
}

/// Errors from Codex CLI operations.
#[derive(Error, Debug)]
pub enum CodexError {
    #[error(
        "Codex CLI not found. Install with: npm install -g @openai/codex (then run `codex` or set CODEX_API_KEY)"
    )]
    NotInstalled,

    #[error("Codex CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Codex process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Codex process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Codex CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<CodexError>),
}

/// Errors from commit message generators.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("{0}")]
    Llm(#[from] crate::llm::LlmError),

    #[error("Generator command is empty")]
    EmptyCommand,

    #[error("Failed to spawn generator command: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Generator command timed out after {0} seconds")]
    Timeout(u64),

    #[error("Generator command exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Generator returned an unusable message: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Scm(#[from] ScmError),
}

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseFailed { path: String, message: String },

    #[error("Invalid value for {key}: '{value}' ({expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Generator 'command' requires generator_command to be set")]
    MissingGeneratorCommand,
}
