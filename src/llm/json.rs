//! JSON extraction from free-form LLM output.
//!
//! Providers often wrap the requested object in a markdown fence or
//! surround it with chatter. Brace matching is string-literal aware so
//! commit bodies containing `{` or `}` survive.

/// Find the first JSON object in an LLM response.
///
/// Tries a ` ```json ` fence, then a bare fence whose content starts with
/// `{`, then every `{` in the text. Returns `None` when nothing parses.
pub fn extract_json_object(response: &str) -> Option<String> {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json")
        && let Some(end) = trimmed[start + 7..].find("```")
    {
        let inner = trimmed[start + 7..start + 7 + end].trim();
        if is_json_object(inner) {
            return Some(inner.to_string());
        }
    }

    if let Some(start) = trimmed.find("```")
        && let Some(end) = trimmed[start + 3..].find("```")
    {
        let inner = trimmed[start + 3..start + 3 + end].trim();
        if inner.starts_with('{') && is_json_object(inner) {
            return Some(inner.to_string());
        }
    }

    for (start_idx, _) in trimmed.match_indices('{') {
        if let Some(candidate) = balanced_object(&trimmed[start_idx..])
            && is_json_object(candidate)
        {
            return Some(candidate.to_string());
        }
    }

    None
}

fn is_json_object(text: &str) -> bool {
    matches!(
        serde_json::from_str::<serde_json::Value>(text),
        Ok(serde_json::Value::Object(_))
    )
}

/// Slice from the leading `{` to its matching `}`.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_json_fence() {
        let response = "Here you go:\n```json\n{\"subject\": \"fix: typo\"}\n```";
        assert_eq!(
            extract_json_object(response).unwrap(),
            r#"{"subject": "fix: typo"}"#
        );
    }

    #[test]
    fn test_extract_from_bare_fence() {
        let response = "```\n{\"subject\": \"docs: readme\", \"body\": null}\n```";
        let json = extract_json_object(response).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["subject"], "docs: readme");
    }

    #[test]
    fn test_extract_with_surrounding_text() {
        let response = r#"Sure! {"subject": "feat: add flag"} Let me know."#;
        assert_eq!(
            extract_json_object(response).unwrap(),
            r#"{"subject": "feat: add flag"}"#
        );
    }

    #[test]
    fn test_braces_inside_strings_do_not_end_object() {
        let response = r#"{"subject": "fix: escape }", "body": "use { and } carefully"} tail"#;
        let json = extract_json_object(response).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["body"], "use { and } carefully");
    }

    #[test]
    fn test_escaped_quotes_survive() {
        let response = r#"{"subject": "fix: handle \"quoted\" names"}"#;
        let json = extract_json_object(response).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["subject"].as_str().unwrap().contains("\"quoted\""));
    }

    #[test]
    fn test_plain_text_has_no_object() {
        assert!(extract_json_object("fix: correct off-by-one in pager").is_none());
    }

    #[test]
    fn test_stray_closing_braces() {
        assert!(extract_json_object("}} {").is_none());
    }

    #[test]
    fn test_json_array_is_not_an_object() {
        assert!(extract_json_object("```json\n[1, 2]\n```").is_none());
    }
}
