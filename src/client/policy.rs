use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::client::error_classification::is_retryable;
use crate::{Error, Result};

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(300);
pub const UPSTREAM_SUBSYSTEM: &str = "Responses API";

/// Retry with exponential backoff around a single request.
///
/// Deterministic: no jitter, no retry-after handling. Attempt `k` (1-based
/// retry index) waits `base_delay * 2^(k-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Total attempts allowed, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// budget is spent.
    ///
    /// Fatal errors come back untouched; any other final failure is wrapped in
    /// [`Error::Upstream`] carrying the number of attempts made.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if err.is_fatal() {
                return Err(err);
            }
            if !is_retryable(&err) || attempt >= self.max_attempts() {
                return Err(Error::Upstream {
                    subsystem: UPSTREAM_SUBSYSTEM.to_string(),
                    attempts: attempt,
                    source: Box::new(err),
                });
            }

            let delay = self.backoff_delay(attempt);
            warn!(
                attempt,
                max_attempts = self.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying Responses request"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
