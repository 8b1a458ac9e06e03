//! Codex CLI spawning.

use std::env;
use std::process::Stdio;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::CodexError;

/// Default timeout for Codex subprocess execution (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable to override the default timeout.
const TIMEOUT_ENV_VAR: &str = "AUTOCOMMIT_CODEX_TIMEOUT";

/// Get the configured timeout duration.
///
/// Reads from AUTOCOMMIT_CODEX_TIMEOUT if set, otherwise 300 seconds.
fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// Check if Codex CLI is installed and accessible.
pub async fn check_codex_installed() -> Result<(), CodexError> {
    if which::which("codex").is_err() {
        return Err(CodexError::NotInstalled);
    }

    let version_check = Command::new("codex")
        .arg("--version")
        .output()
        .await
        .map_err(CodexError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(CodexError::NotInstalled);
    }

    Ok(())
}

/// Run `codex exec` with a prompt and return the agent's final message.
///
/// `codex exec` interleaves progress output on stdout, so the last message
/// is captured through `--output-last-message` into a temp file instead.
pub async fn run_codex(prompt: &str) -> Result<String, CodexError> {
    if which::which("codex").is_err() {
        return Err(CodexError::NotInstalled);
    }

    let last_message = NamedTempFile::new().map_err(|e| {
        CodexError::ExecutionFailed(format!("Failed to create output file: {}", e))
    })?;
    let last_message_path = last_message.path().display().to_string();

    let timeout_duration = get_timeout();

    let output = timeout(
        timeout_duration,
        Command::new("codex")
            .arg("exec")
            .arg("--output-last-message")
            .arg(&last_message_path)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| CodexError::Timeout(timeout_duration.as_secs()))?
    .map_err(CodexError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(CodexError::NonZeroExit { code, stderr });
    }

    let message = tokio::fs::read_to_string(last_message.path())
        .await
        .unwrap_or_default();
    if message.trim().is_empty() {
        debug!("Codex wrote no last message; using stdout");
        return Ok(String::from_utf8_lossy(&output.stdout).to_string());
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_timeout_default() {
        temp_env::with_var_unset(TIMEOUT_ENV_VAR, || {
            assert_eq!(get_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        });
    }

    #[test]
    fn test_get_timeout_from_env() {
        temp_env::with_var(TIMEOUT_ENV_VAR, Some("45"), || {
            assert_eq!(get_timeout(), Duration::from_secs(45));
        });
    }

    #[test]
    fn test_get_timeout_invalid_env_uses_default() {
        temp_env::with_var(TIMEOUT_ENV_VAR, Some("-3"), || {
            assert_eq!(get_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        });
    }
}
