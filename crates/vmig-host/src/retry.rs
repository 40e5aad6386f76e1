//! Backoff for idempotent hosting calls.
//!
//! Only calls that can be repeated without side effects go through here
//! (offset probes, status polls, folder listing). Appends and session
//! creation are never retried in the client; a failed job is retried as a
//! whole on the next run.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info_span, warn, Instrument};

use crate::error::{HostError, HostResult};
use crate::metrics::count_retry;

/// Backoff settings.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each later one (ms).
    pub base_delay_ms: u64,
    /// Upper bound for any computed delay (ms).
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryConfig {
    /// Read `HOST_RETRY_MAX`, `HOST_RETRY_BASE_MS` and `HOST_RETRY_MAX_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |key: &str| std::env::var(key).ok().and_then(|s| s.trim().parse::<u64>().ok());

        Self {
            max_retries: read("HOST_RETRY_MAX")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.max_retries),
            base_delay_ms: read("HOST_RETRY_BASE_MS").unwrap_or(defaults.base_delay_ms),
            max_delay_ms: read("HOST_RETRY_MAX_MS").unwrap_or(defaults.max_delay_ms),
        }
    }

    /// Single attempt, no backoff.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based).
    ///
    /// A server-requested delay wins. Otherwise the exponential delay is
    /// capped, then jittered down to no less than the base delay.
    pub fn delay_for(&self, attempt: u32, server_hint_ms: Option<u64>) -> Duration {
        if let Some(hint) = server_hint_ms {
            return Duration::from_millis(hint);
        }

        let ceiling = self
            .base_delay_ms
            .saturating_mul(1u64 << attempt.min(32))
            .min(self.max_delay_ms);
        let floor = self.base_delay_ms.min(ceiling);
        let jittered = (ceiling as f64 * jitter_fraction()) as u64;

        Duration::from_millis(jittered.clamp(floor, ceiling))
    }
}

/// Pseudo-random fraction in `[0, 1)` from the clock's sub-second part.
fn jitter_fraction() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    f64::from(nanos % 1000) / 1000.0
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
///
/// Network errors, 429 and 5xx are retried; everything else is returned
/// immediately. A 429's `Retry-After` replaces the computed delay.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, op: F) -> HostResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = HostResult<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        let span = info_span!("host_attempt", operation = %operation, attempt = attempt + 1);
        let err: HostError = match op().instrument(span).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !err.is_retryable() || attempt >= config.max_retries {
            return Err(err);
        }

        let delay = config.delay_for(attempt, err.retry_after_ms());
        warn!(
            operation = %operation,
            attempt = attempt + 1,
            max_retries = config.max_retries,
            delay_ms = delay.as_millis() as u64,
            "Retrying hosting call after error: {}",
            err
        );
        count_retry(operation);

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
