//! Generator backed by the Claude / Codex CLIs.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::GeneratorError;
use crate::llm::{LlmRouter, ProviderSelection};
use crate::message::GeneratedMessage;

use super::prompt::build_commit_prompt;
use super::{GenerationHandle, GenerationRequest, InputBox, MessageGenerator};

/// Asks an LLM CLI for the message, falling back to the other provider.
pub struct LlmGenerator {
    router: Arc<LlmRouter>,
}

impl LlmGenerator {
    pub fn new(selection: ProviderSelection) -> Self {
        Self {
            router: Arc::new(LlmRouter::new(selection)),
        }
    }
}

#[async_trait]
impl MessageGenerator for LlmGenerator {
    async fn trigger(
        &self,
        request: GenerationRequest,
        input: InputBox,
    ) -> Result<GenerationHandle, GeneratorError> {
        let prompt = build_commit_prompt(&request);
        debug!(
            "Commit prompt: {} chars, {} files, truncated={}",
            prompt.len(),
            request.diff.files.len(),
            request.diff.truncated
        );

        let router = Arc::clone(&self.router);
        Ok(GenerationHandle::spawn(async move {
            let completion = router.generate(&prompt).await?;
            debug!("Message generated by {}", completion.provider);

            let message = GeneratedMessage::parse(&completion.output)
                .ok_or_else(|| GeneratorError::InvalidResponse(completion.output.clone()))?;
            input.set(message.format());
            Ok(())
        }))
    }
}
