//! Bounded retry/backoff wrapper around an LLM provider.
//!
//! Every topic generation call goes through [`RetryingClient`], which
//! retries *transient* failures (rate limiting, upstream 5xx, transport
//! timeouts) with exponential backoff and full jitter. Non-transient
//! failures, such as malformed requests or auth errors, propagate
//! immediately; once the attempt budget is exhausted the last transient
//! error propagates to the caller, which treats it as a soft failure.

use async_trait::async_trait;
use rand::RngExt;
use std::time::Duration;

use super::client::{GenerationRequest, GenerationResponse, LlmProvider};
use crate::error::LlmError;

/// Maximum number of attempts, including the initial one.
pub const MAX_ATTEMPTS: u32 = 5;

/// Base delay for exponential backoff in milliseconds.
const BASE_RETRY_DELAY_MS: u64 = 1000;

/// Upper bound for a single backoff sleep in milliseconds.
const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Backoff policy: attempt budget plus delay shape.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the initial one.
    pub max_attempts: u32,
    /// Base delay; attempt n sleeps up to `base_delay * 2^(n-1)`.
    pub base_delay: Duration,
    /// Cap applied to the un-jittered delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: Duration::from_millis(BASE_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(MAX_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Backoff sleep before retry number `attempt` (1-based count of
    /// failures so far), with full jitter: a uniformly random duration in
    /// `[0, base * 2^(attempt-1)]`, capped at `max_delay`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let ceiling_ms = self
            .base_delay
            .as_millis()
            .saturating_mul(1u128 << exp)
            .min(self.max_delay.as_millis()) as u64;
        let jittered_ms = rand::rng().random_range(0..=ceiling_ms);
        Duration::from_millis(jittered_ms)
    }
}

/// Check if an error is transient and should be retried.
pub fn is_transient(error: &LlmError) -> bool {
    match error {
        LlmError::RequestFailed(msg) => {
            // Network errors, timeouts, connection issues
            msg.contains("timeout")
                || msg.contains("timed out")
                || msg.contains("connection")
                || msg.contains("Connection refused")
        }
        LlmError::RateLimited(_) => true,
        LlmError::ApiError { code, .. } => {
            // Server errors (5xx) and rate limits are transient
            *code >= 500 || *code == 429
        }
        _ => false,
    }
}

/// Provider wrapper applying a [`RetryPolicy`] to every `generate` call.
///
/// Stateless apart from the wrapped provider; one instance is shared by all
/// concurrent generation tasks of a request.
pub struct RetryingClient<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P> RetryingClient<P> {
    /// Wrap a provider with the default retry policy.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            policy: RetryPolicy::default(),
        }
    }

    /// Wrap a provider with a custom retry policy.
    pub fn with_policy(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<P: LlmProvider> LlmProvider for RetryingClient<P> {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let mut last_error = None;

        for attempt in 0..self.policy.max_attempts {
            if attempt > 0 {
                let delay = self.policy.backoff_delay(attempt);
                tracing::debug!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying generation after transient failure"
                );
                tokio::time::sleep(delay).await;
            }

            match self.inner.generate(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    if is_transient(&err) {
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_attempts = self.policy.max_attempts,
                            error = %err,
                            "Transient error, will retry"
                        );
                        last_error = Some(err);
                    } else {
                        return Err(err);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            LlmError::RequestFailed("Retry budget exhausted with no error captured".to_string())
        }))
    }
}
