//! Prompt construction for AI-generated commit messages.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::message::CommitType;

use super::GenerationRequest;

/// Maximum length for sanitized diff text.
const MAX_DIFF_SANITIZED_LENGTH: usize = 30_000;

/// Build the prompt for one commit message.
///
/// Lists the staged files, the sanitized diff and the branch, and asks for
/// a JSON object so the reply can be parsed reliably.
pub fn build_commit_prompt(request: &GenerationRequest) -> String {
    let diff = &request.diff;

    let files_section = if diff.files.is_empty() {
        "(no staged files)".to_string()
    } else {
        diff.files
            .iter()
            .map(|f| format!("- {} ({})", f.path, f.status))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let sanitized_diff = sanitize_diff(&diff.diff_text, MAX_DIFF_SANITIZED_LENGTH);

    let truncation_note = if diff.truncated {
        "\n\nNote: The diff was truncated due to size. Focus on the visible changes."
    } else {
        ""
    };

    let focus_section = match &request.focus_file {
        Some(path) => format!(
            "\n\n## Scope\nThis commit contains only `{path}`. Describe the change to that file."
        ),
        None => String::new(),
    };

    let subject_rules = match &request.conventional_type {
        Some(default_type) => format!(
            "- Format: `type(scope): description` (Conventional Commits)\n\
             - Type: one of {types}. If unsure, use `{default_type}`.\n\
             - Description: imperative mood, lowercase after the colon, no period at the end",
            types = CommitType::ALL
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        None => "- Imperative mood (\"add\", \"fix\", \"remove\"), no period at the end".to_string(),
    };

    format!(
        r#"You are writing a Git commit message for the staged changes below.

## Staged Files ({additions} additions, {deletions} deletions)
{files_section}

## Diff
```
{sanitized_diff}
```{truncation_note}{focus_section}

## Branch
{branch}

## Subject Line Rules
{subject_rules}
- Keep the whole subject line at or under 72 characters

## Body Rules
The diff already shows WHAT changed; the body explains WHY. Wrap at 72
characters. For trivial changes the body may be null.

## Output Format
Respond with ONLY a JSON object (no markdown, no explanation):
{{"subject": "...", "body": "... or null", "breaking": false}}"#,
        additions = diff.additions,
        deletions = diff.deletions,
        branch = request.branch,
    )
}

fn ansi_escape_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("ANSI pattern is valid")
    })
}

/// Sanitize diff text for inclusion in a prompt.
///
/// Strips ANSI escapes and control characters (newlines and tabs stay),
/// neutralizes code fences so the diff cannot close the prompt's block,
/// and truncates on a char boundary.
pub fn sanitize_diff(text: &str, max_len: usize) -> String {
    let without_ansi = ansi_escape_pattern().replace_all(text, "");

    let mut result: String = without_ansi
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    result = result.replace("```", "'''");

    if result.len() > max_len {
        let mut end = max_len;
        while end > 0 && !result.is_char_boundary(end) {
            end -= 1;
        }
        result.truncate(end);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scm::{DiffSummary, FileStatus, diff::DiffFile};

    fn request() -> GenerationRequest {
        GenerationRequest {
            diff: DiffSummary {
                diff_text: "+fn main() {}\n".to_string(),
                files: vec![DiffFile {
                    path: "src/main.rs".to_string(),
                    status: FileStatus::Added,
                }],
                truncated: false,
                additions: 1,
                deletions: 0,
            },
            branch: "feature/pager".to_string(),
            focus_file: None,
            conventional_type: None,
        }
    }

    #[test]
    fn test_prompt_lists_files_diff_and_branch() {
        let prompt = build_commit_prompt(&request());
        assert!(prompt.contains("- src/main.rs (Added)"));
        assert!(prompt.contains("+fn main() {}"));
        assert!(prompt.contains("feature/pager"));
        assert!(prompt.contains("1 additions, 0 deletions"));
        assert!(!prompt.contains("truncated"));
        assert!(!prompt.contains("Conventional Commits"));
    }

    #[test]
    fn test_prompt_includes_focus_file() {
        let mut req = request();
        req.focus_file = Some("src/main.rs".to_string());
        let prompt = build_commit_prompt(&req);
        assert!(prompt.contains("This commit contains only `src/main.rs`"));
    }

    #[test]
    fn test_prompt_includes_conventional_rules() {
        let mut req = request();
        req.conventional_type = Some("chore".to_string());
        let prompt = build_commit_prompt(&req);
        assert!(prompt.contains("Conventional Commits"));
        assert!(prompt.contains("If unsure, use `chore`"));
        assert!(prompt.contains("feat, fix, docs"));
    }

    #[test]
    fn test_prompt_notes_truncation() {
        let mut req = request();
        req.diff.truncated = true;
        assert!(build_commit_prompt(&req).contains("The diff was truncated"));
    }

    #[test]
    fn test_sanitize_removes_ansi_and_control_chars() {
        let text = "\x1b[31m-old\x1b[0m\n+new\x07\tline";
        assert_eq!(sanitize_diff(text, 1_000), "-old\n+new\tline");
    }

    #[test]
    fn test_sanitize_neutralizes_fences() {
        assert_eq!(sanitize_diff("+```rust", 1_000), "+'''rust");
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let text = "ééééé";
        let result = sanitize_diff(text, 3);
        assert_eq!(result, "é");
    }
}
