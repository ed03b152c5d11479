//! Retry policy with exponential backoff
//!
//! Bounded retry for transient service failures:
//! - Attempts: `max_attempts` in total, first try included
//! - Delay: base * 2^(attempt-1), capped, with ±25% jitter
//! - Only errors with `BotError::is_transient()` are retried, unless the
//!   caller narrows that with `run_when`

use crate::config::RetryConfig;
use crate::errors::{BotError, Result};
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Build from the `[retry]` config section
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            enable_jitter: true,
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
            enable_jitter: false,
        }
    }

    /// Custom policy without jitter
    pub fn fixed(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms,
            enable_jitter: false,
        }
    }

    /// Run `operation`, retrying transient failures until the budget is spent
    pub async fn run<F, Fut, T>(&self, what: &str, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        self.run_when(what, BotError::is_transient, operation).await
    }

    /// Like `run`, but only failures accepted by `retryable` are retried
    pub async fn run_when<F, Fut, T, P>(&self, what: &str, retryable: P, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
        P: Fn(&BotError) -> bool,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !retryable(&e) => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    if self.max_attempts == 1 {
                        return Err(e);
                    }
                    tracing::warn!(operation = what, attempts = attempt, error = %e, "retries exhausted");
                    return Err(BotError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    tracing::info!(
                        operation = what,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Delay before the retry that follows failed attempt `attempt` (1-based)
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);

        let final_delay = if self.enable_jitter && delay_ms > 0 {
            let jitter = (delay_ms / 4) as f64;
            let offset = (rand::random::<f64>() * 2.0 - 1.0) * jitter;
            ((delay_ms as f64) + offset).max(0.0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    /// Upper bound on total sleeping time, ignoring jitter
    pub fn max_total_wait(&self) -> Duration {
        let total: u64 = (1..self.max_attempts)
            .map(|attempt| {
                let exponent = (attempt - 1).min(20);
                self.base_delay_ms
                    .saturating_mul(1u64 << exponent)
                    .min(self.max_delay_ms)
            })
            .sum();
        Duration::from_millis(total)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
