//! Bounded retries with exponential backoff around any [`CompletionClient`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::{CompletionClient, CompletionError, CompletionRequest};

/// How many times to try, and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Fraction (0.0..=1.0) of the backoff added as random extra delay.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(8000),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after failed attempt number `attempt` (1-based):
    /// `min(base * 2^(attempt-1) + jitter, max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let backoff = self
            .base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay);
        let extra = backoff.mul_f64(self.jitter.clamp(0.0, 1.0) * fastrand::f64());
        backoff.saturating_add(extra).min(self.max_delay)
    }

    /// Like [`delay_for`](Self::delay_for), but waits at least the server's `Retry-After`.
    pub fn delay_for_error(&self, attempt: u32, error: &CompletionError) -> Duration {
        let backoff = self.delay_for(attempt);
        match error {
            CompletionError::RateLimited {
                retry_after: Some(after),
            } => (*after).max(backoff).min(self.max_delay),
            _ => backoff,
        }
    }
}

/// Wraps a client with per-attempt timeouts and [`RetryPolicy`]-driven retries.
///
/// Only [`CompletionError::is_retryable`] failures are retried; when attempts run out the last
/// error is returned.
#[derive(Clone)]
pub struct RetryingClient {
    inner: Arc<dyn CompletionClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn CompletionClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl CompletionClient for RetryingClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result =
                match tokio::time::timeout(request.timeout, self.inner.complete(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(CompletionError::Network(format!(
                        "request timed out after {:?}",
                        request.timeout
                    ))),
                };

            let err = match result {
                Ok(text) => return Ok(text),
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= max_attempts {
                return Err(err);
            }

            let delay = self.policy.delay_for_error(attempt, &err);
            warn!(
                attempt = attempt,
                max_attempts = max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Completion attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(jitter: f64) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(8000),
            jitter,
        }
    }

    #[test]
    fn delays_grow_exponentially_and_cap() {
        let p = policy(0.0);
        assert_eq!(p.delay_for(1), Duration::from_millis(500));
        assert_eq!(p.delay_for(2), Duration::from_millis(1000));
        assert_eq!(p.delay_for(3), Duration::from_millis(2000));
        assert_eq!(p.delay_for(5), Duration::from_millis(8000));
        assert_eq!(p.delay_for(40), Duration::from_millis(8000));
    }

    #[test]
    fn jitter_stays_within_fraction_and_cap() {
        let p = policy(0.5);
        for _ in 0..100 {
            let d = p.delay_for(2);
            assert!(d >= Duration::from_millis(1000));
            assert!(d <= Duration::from_millis(1500));
            assert!(p.delay_for(10) <= Duration::from_millis(8000));
        }
    }

    #[test]
    fn jitter_spreads_concurrent_delays() {
        let p = policy(0.5);
        let delays: std::collections::HashSet<Duration> = (0..50).map(|_| p.delay_for(1)).collect();
        assert!(delays.len() > 1, "all 50 delays were identical: {:?}", delays);
    }

    #[test]
    fn retry_after_is_honoured_up_to_cap() {
        let p = policy(0.0);
        let limited = |secs| CompletionError::RateLimited {
            retry_after: Some(Duration::from_secs(secs)),
        };
        assert_eq!(p.delay_for_error(1, &limited(2)), Duration::from_secs(2));
        assert_eq!(p.delay_for_error(1, &limited(60)), Duration::from_millis(8000));
        assert_eq!(
            p.delay_for_error(1, &CompletionError::RateLimited { retry_after: None }),
            Duration::from_millis(500)
        );
    }
}
