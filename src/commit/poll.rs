//! Polling the input box while a generator runs.

use std::time::Duration;

use tracing::debug;

use crate::error::GeneratorError;
use crate::generate::{GenerationHandle, InputBox};

/// How a wait for a generated message ended.
#[derive(Debug)]
pub enum PollOutcome {
    /// The box held an accepted value (trimmed).
    Message(String),
    /// The generator stopped with an error.
    Failed(GeneratorError),
    /// The generator finished without leaving an accepted value.
    NotGenerated,
    /// Every attempt was used up.
    Exhausted,
}

/// Sleep `interval`, then check the box; at most `attempts` times.
///
/// Stops early once the generator has finished, since nothing else will
/// write to the box. The handle is left for the caller to drop.
pub async fn wait_for_message<F>(
    input: &InputBox,
    handle: &mut GenerationHandle,
    interval: Duration,
    attempts: u32,
    accept: F,
) -> PollOutcome
where
    F: Fn(&str) -> bool,
{
    for attempt in 1..=attempts {
        tokio::time::sleep(interval).await;

        // Read completion before the value so a write that lands in between
        // is still seen on this attempt.
        let done = handle.is_finished();
        let value = input.value();
        if accept(&value) {
            debug!("Message ready after {} poll attempt(s)", attempt);
            return PollOutcome::Message(value.trim().to_string());
        }
        if done {
            return match handle.failure().await {
                Some(e) => PollOutcome::Failed(e),
                None => PollOutcome::NotGenerated,
            };
        }
    }

    debug!("No message after {} poll attempts", attempts);
    PollOutcome::Exhausted
}
