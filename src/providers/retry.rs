//! Retry manager with exponential backoff
//!
//! Bounded retry for provider calls:
//! - Attempts: at most `max_retries` (default 3) calls in total
//! - Delay before attempt n+1: `base * 2^(n-1)` with ±25% jitter, capped
//! - Only transient kinds (`RateLimited`, `NetworkFailure`) are retried
//! - On exhaustion the last attempt's error is returned unchanged

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::ProviderConfig;
use crate::errors::{RagError, Result};

/// Retry manager with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryManager {
    /// Maximum number of attempts, including the first
    max_retries: u32,

    /// Base delay in milliseconds
    base_delay_ms: u64,

    /// Maximum delay cap in milliseconds
    max_delay_ms: u64,

    /// Enable jitter
    enable_jitter: bool,
}

impl Default for RetryManager {
    fn default() -> Self {
        Self::from_config(&ProviderConfig::new(super::ProviderKind::Gemini))
    }
}

impl RetryManager {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            base_delay_ms: base_delay.as_millis() as u64,
            max_delay_ms: max_delay.as_millis() as u64,
            enable_jitter: true,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.max_retries, config.base_delay, config.max_delay)
    }

    /// Disable jitter (deterministic delays)
    pub fn without_jitter(mut self) -> Self {
        self.enable_jitter = false;
        self
    }

    /// Execute operation with retry logic
    pub async fn execute_with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!(attempt, "provider call succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if !Self::is_retryable(&e) {
                        return Err(e);
                    }
                    if attempt >= self.max_retries {
                        warn!(attempts = attempt, kind = %e.kind(), "retries exhausted");
                        return Err(e);
                    }

                    let delay = self.calculate_delay(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        kind = %e.kind(),
                        "transient provider failure, backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Delay after the given (1-based) failed attempt
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let exponential_delay = self.base_delay_ms.saturating_mul(2u64.pow(exponent));

        // Cap at maximum delay
        let delay_ms = exponential_delay.min(self.max_delay_ms);

        // ±25% random variation
        let final_delay = if self.enable_jitter {
            let jitter = (delay_ms / 4) as i64;
            let random_jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter as f64;
            // Jitter never pushes past the cap
            (((delay_ms as i64) + random_jitter as i64).max(0) as u64).min(self.max_delay_ms)
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    /// Upper bound on total backoff (without jitter)
    pub fn max_total_wait_time(&self) -> Duration {
        let total_ms: u64 = (1..self.max_retries)
            .map(|attempt| {
                let exponent = (attempt - 1).min(31);
                self.base_delay_ms
                    .saturating_mul(2u64.pow(exponent))
                    .min(self.max_delay_ms)
            })
            .sum();
        Duration::from_millis(total_ms)
    }

    fn is_retryable(error: &RagError) -> bool {
        error.is_retryable()
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
