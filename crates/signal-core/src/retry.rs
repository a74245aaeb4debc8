//! Retry with Exponential Backoff
//!
//! A reusable wrapper around any fallible async operation. Call sites hand
//! over a closure that builds the request; the policy owns attempts, the
//! backoff schedule and the per-attempt timeout.

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, SignalError};

/// Retry configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Delay after the first failure
    pub initial_backoff: Duration,

    /// Growth factor between consecutive delays
    pub multiplier: u32,

    /// Upper bound for a single attempt
    pub timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    /// 3 attempts, 1s then 2s between them, 5s per attempt
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2,
            timeout: Some(Duration::from_secs(5)),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            multiplier: 1,
            timeout: None,
        }
    }

    pub const fn with_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub const fn with_backoff(mut self, initial_backoff: Duration, multiplier: u32) -> Self {
        self.initial_backoff = initial_backoff;
        self.multiplier = multiplier;
        self
    }

    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delay to wait after the failed attempt number `attempt` (0-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(self.multiplier.saturating_pow(attempt))
    }

    /// Full backoff schedule, one entry per retry
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.delay_after(attempt))
            .collect()
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up. The last error is returned on exhaustion.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let outcome = match self.timeout {
                Some(limit) => tokio::time::timeout(limit, op())
                    .await
                    .unwrap_or_else(|_| Err(SignalError::Timeout(limit))),
                None => op().await,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 < attempts && e.is_retryable() => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}, retrying in {:?}",
                        label,
                        attempt + 1,
                        attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!("{} gave up after {} attempt(s): {}", label, attempt + 1, e);
                    return Err(e);
                }
            }
        }
    }
}
