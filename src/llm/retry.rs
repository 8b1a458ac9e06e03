//! Exponential backoff retry shared by the generator subprocesses.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::debug;

/// How many times to run an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    /// 3 total attempts, base 1s, max 30s.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
        }
    }
}

/// Retry an async operation with exponential backoff.
///
/// `attempt` runs up to `policy.max_attempts` times. An error for which
/// `is_retryable` returns false is returned at once, unwrapped. The last
/// retryable error is handed to `wrap_exhausted` so callers can produce
/// their own `RetriesExhausted` variant.
pub async fn retry_with_backoff<T, E, Fut, F, P, W>(
    policy: RetryPolicy,
    mut attempt: F,
    is_retryable: P,
    wrap_exhausted: W,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
    W: FnOnce(E) -> E,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: policy.initial_interval,
        max_interval: policy.max_interval,
        max_elapsed_time: None,
        ..Default::default()
    };

    let attempts = policy.max_attempts.max(1);
    let mut n = 0;

    loop {
        n += 1;
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if !is_retryable(&e) => {
                debug!("Attempt {}/{} failed, not retrying: {}", n, attempts, e);
                return Err(e);
            }
            Err(e) if n >= attempts => return Err(wrap_exhausted(e)),
            Err(e) => {
                debug!("Attempt {}/{} failed: {}", n, attempts, e);
                if let Some(wait) = backoff.next_backoff() {
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
