//! Retry Policy
//!
//! A reusable retry policy value (max attempts, backoff schedule,
//! retryable-error predicate) applied generically to LLM calls, independent
//! of the call site.
//!
//! Rate-limit-class errors back off exponentially (`base * 2^attempt`,
//! capped), connection-class errors wait a fixed delay, every other API
//! error aborts immediately. An exhausted budget surfaces as
//! `DeckError::LlmGeneration` wrapping the last error.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::constants::retry as retry_constants;
use crate::types::{DeckError, LlmError, Result};

/// Retry policy for the LLM client.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: usize,
    /// Base delay for exponential backoff on rate-limit errors
    pub base_delay: Duration,
    /// Fixed delay for connection-class errors
    pub connection_delay: Duration,
    /// Cap on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(retry_constants::BASE_DELAY_MS),
            connection_delay: Duration::from_millis(retry_constants::CONNECTION_DELAY_MS),
            max_delay: Duration::from_secs(retry_constants::MAX_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given 0-based attempt, capped.
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.min(16) as u32;
        (self.base_delay * factor).min(self.max_delay)
    }

    /// Delay before the next attempt, or `None` when the error class aborts.
    pub fn delay_for(&self, err: &LlmError, attempt: usize) -> Option<Duration> {
        if !err.is_retryable() {
            return None;
        }
        if err.category.uses_backoff() {
            Some(self.backoff_delay(attempt))
        } else {
            Some(self.connection_delay.min(self.max_delay))
        }
    }

    /// Run `op` under this policy.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, LlmError>>,
    {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let delay = self.delay_for(&err, attempt);
                    warn!(
                        label,
                        attempt = attempt + 1,
                        category = %err.category,
                        error = %err.message,
                        "LLM call failed"
                    );

                    match delay {
                        Some(delay) if attempt + 1 < self.max_attempts => {
                            debug!(label, delay_ms = delay.as_millis() as u64, "retrying");
                            sleep(delay).await;
                            last_error = Some(err);
                        }
                        Some(_) => {
                            last_error = Some(err);
                        }
                        None => {
                            return Err(DeckError::LlmGeneration(format!(
                                "{}: non-retryable error: {}",
                                label, err
                            )));
                        }
                    }
                }
            }
        }

        let last = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        Err(DeckError::LlmGeneration(format!(
            "{}: retries exhausted after {} attempts: {}",
            label, self.max_attempts, last
        )))
    }
}
