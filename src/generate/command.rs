//! Generator that runs a user-supplied shell command.
//!
//! The prompt is written to the command's stdin and its stdout becomes the
//! message. Branch and focus file are also exported as environment
//! variables so simple scripts need not parse the prompt.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::GeneratorError;
use crate::message::GeneratedMessage;

use super::prompt::build_commit_prompt;
use super::{GenerationHandle, GenerationRequest, InputBox, MessageGenerator};

/// Default timeout for the generator command (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub struct CommandGenerator {
    command: String,
    timeout: Duration,
}

impl CommandGenerator {
    pub fn new(command: impl Into<String>) -> Result<Self, GeneratorError> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(GeneratorError::EmptyCommand);
        }
        Ok(Self {
            command,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

/// Run the command once and return its stdout.
async fn run_command(
    command: &str,
    prompt: &str,
    request: &GenerationRequest,
    limit: Duration,
) -> Result<String, GeneratorError> {
    let mut cmd = shell_command(command);
    cmd.env("AUTOCOMMIT_BRANCH", &request.branch)
        .env("AUTOCOMMIT_FILE", request.focus_file.as_deref().unwrap_or(""))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(GeneratorError::SpawnFailed)?;

    if let Some(mut stdin) = child.stdin.take() {
        // A command that ignores stdin may close it early
        if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
            debug!("Generator command did not read the prompt: {e}");
        }
    }

    let output = timeout(limit, child.wait_with_output())
        .await
        .map_err(|_| GeneratorError::Timeout(limit.as_secs()))?
        .map_err(GeneratorError::SpawnFailed)?;

    if !output.status.success() {
        return Err(GeneratorError::NonZeroExit {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[async_trait]
impl MessageGenerator for CommandGenerator {
    async fn trigger(
        &self,
        request: GenerationRequest,
        input: InputBox,
    ) -> Result<GenerationHandle, GeneratorError> {
        let prompt = build_commit_prompt(&request);
        let command = self.command.clone();
        let limit = self.timeout;

        Ok(GenerationHandle::spawn(async move {
            let stdout = run_command(&command, &prompt, &request, limit).await?;
            let message = GeneratedMessage::parse(&stdout)
                .ok_or_else(|| GeneratorError::InvalidResponse("empty output".to_string()))?;
            input.set(message.format());
            Ok(())
        }))
    }
}
