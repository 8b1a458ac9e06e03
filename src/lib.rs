//! autocommit - stage changes, commit them with AI-generated messages, and
//! optionally push.
//!
//! # Overview
//!
//! autocommit enumerates the changes in a git working tree, asks a message
//! generator (Claude CLI, Codex CLI or any shell command) for a commit
//! message, and commits either everything at once or one file at a time.
//! Every step falls back to a default message instead of failing the run.

pub mod claude;
pub mod codex;
pub mod commit;
pub mod config;
pub mod error;
pub mod generate;
pub mod llm;
pub mod message;
pub mod scm;

// Re-export commonly used types
pub use commit::{AutoCommit, CommitRecord, ConsoleNotifier, MemoryNotifier, Notifier, RunReport, run};
pub use config::{Config, ConfigOverrides, GeneratorKind};
pub use error::{ClaudeError, CodexError, ConfigError, GeneratorError, ScmError};
pub use generate::{CommandGenerator, InputBox, LlmGenerator, MessageGenerator};
pub use scm::{ChangeKind, ChangedFile, GitRepository, SourceControl, open_repository};
