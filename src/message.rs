//! Commit message policy: fallbacks, generated-message parsing and
//! conventional-commit formatting.

use std::str::FromStr;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::Deserialize;

use crate::llm::extract_json_object;
use crate::scm::ChangedFile;

/// Message used when batch generation produces nothing.
pub const BATCH_FALLBACK_MESSAGE: &str = "feat: automatic commit";

/// Default conventional type when none is configured.
pub const DEFAULT_COMMIT_TYPE: &str = "feat";

/// Fallback for a single file: `update: changes in <file name>`.
pub fn per_file_fallback(file: &ChangedFile) -> String {
    format!("update: changes in {}", file.file_name())
}

/// Whether an input-box value counts as a generated message.
pub fn is_generated(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Conventional commit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
    Revert,
}

impl CommitType {
    pub const ALL: [CommitType; 11] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Perf,
        CommitType::Test,
        CommitType::Build,
        CommitType::Ci,
        CommitType::Chore,
        CommitType::Revert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Test => "test",
            CommitType::Build => "build",
            CommitType::Ci => "ci",
            CommitType::Chore => "chore",
            CommitType::Revert => "revert",
        }
    }
}

impl FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommitType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown commit type: {}", s))
    }
}

fn subject_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // type(scope)!: description
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\w+)(\([^)]*\))?(!)?:\s+(.+)$").expect("subject pattern is valid")
    })
}

/// Rewrite a message so its subject line follows Conventional Commits.
///
/// - `fix(api): handle timeout` is kept as is.
/// - `update: changes in main.rs` has its unknown type replaced:
///   `<default_type>: changes in main.rs`.
/// - `Handle timeout` gets the default type prepended:
///   `<default_type>: Handle timeout`.
///
/// Only the subject line changes; the body is kept verbatim.
pub fn apply_conventional(message: &str, default_type: &str) -> String {
    let (subject, rest) = match message.split_once('\n') {
        Some((subject, rest)) => (subject, Some(rest)),
        None => (message, None),
    };

    let trimmed = subject.trim();
    if trimmed.is_empty() {
        return message.to_string();
    }

    let new_subject = match subject_pattern().captures(trimmed) {
        Some(caps) => {
            let commit_type = caps.get(1).map_or("", |m| m.as_str());
            if commit_type.parse::<CommitType>().is_ok() {
                trimmed.to_string()
            } else {
                format!(
                    "{}{}{}: {}",
                    default_type,
                    caps.get(2).map_or("", |m| m.as_str()),
                    caps.get(3).map_or("", |m| m.as_str()),
                    caps.get(4).map_or("", |m| m.as_str()),
                )
            }
        }
        None => format!("{}: {}", default_type, trimmed),
    };

    match rest {
        Some(rest) => format!("{}\n{}", new_subject, rest),
        None => new_subject,
    }
}

/// A message returned by a generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedMessage {
    pub subject: String,
    pub body: Option<String>,
    #[serde(default)]
    pub breaking: bool,
}

impl GeneratedMessage {
    /// Parse generator output.
    ///
    /// Accepts the requested JSON object (optionally fenced or surrounded by
    /// text) and falls back to treating the output as a plain commit
    /// message. Returns `None` when nothing usable is left.
    pub fn parse(output: &str) -> Option<Self> {
        if let Some(json) = extract_json_object(output)
            && let Ok(message) = serde_json::from_str::<GeneratedMessage>(&json)
            && !message.subject.trim().is_empty()
        {
            return Some(message);
        }

        let text = strip_fences(output.trim());
        let mut lines = text.lines();
        let subject = lines.next()?.trim().to_string();
        if subject.is_empty() {
            return None;
        }
        let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();

        Some(GeneratedMessage {
            subject,
            body: (!body.is_empty()).then_some(body),
            breaking: false,
        })
    }

    /// Format for git: subject, blank line, body.
    pub fn format(&self) -> String {
        let subject = self.subject.trim();
        match self.body.as_deref().map(str::trim) {
            Some(body) if !body.is_empty() => format!("{subject}\n\n{body}"),
            _ => subject.to_string(),
        }
    }
}

fn strip_fences(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an info string such as ```text
    let inner = inner.split_once('\n').map_or("", |(_, rest)| rest);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
