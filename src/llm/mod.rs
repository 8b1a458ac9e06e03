//! LLM provider routing, retry and response parsing.

pub mod json;
pub mod retry;
pub mod router;

pub use json::extract_json_object;
pub use router::{LlmCompletion, LlmError, LlmProviderError, LlmRouter, Provider, ProviderSelection};
