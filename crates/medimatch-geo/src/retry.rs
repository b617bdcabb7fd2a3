//! Short jittered back-off for the lookup clients.
//!
//! The resolver puts a deadline around every lookup, so delays stay well
//! under a second and only transport failures are retried.

use std::future::Future;
use std::time::Duration;

use crate::error::GeoError;

/// Upper bound for a single back-off sleep.
const MAX_DELAY: Duration = Duration::from_secs(1);

/// Timeouts, connection failures and HTTP 5xx. Service-reported failures and
/// malformed bodies would fail the same way on a second attempt.
pub(crate) fn is_transient(err: &GeoError) -> bool {
    match err {
        GeoError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        GeoError::Lookup(_) | GeoError::Deserialize { .. } | GeoError::InvalidBaseUrl { .. } => {
            false
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Backoff {
    max_retries: u32,
    base: Duration,
}

impl Backoff {
    pub(crate) fn new(max_retries: u32, base: Duration) -> Self {
        Self { max_retries, base }
    }

    /// Sleep before the `retry`-th retry (1-based): `base` doubled per retry,
    /// capped at [`MAX_DELAY`], then scaled by `jitter`.
    fn delay(self, retry: u32, jitter: f64) -> Duration {
        let doublings = retry.saturating_sub(1).min(6);
        self.base
            .saturating_mul(1 << doublings)
            .min(MAX_DELAY)
            .mul_f64(jitter)
    }

    /// Runs `operation`, retrying transient errors up to `max_retries` times.
    pub(crate) async fn run<T, F, Fut>(self, mut operation: F) -> Result<T, GeoError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GeoError>>,
    {
        let mut retry = 0u32;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if retry >= self.max_retries || !is_transient(&err) {
                return Err(err);
            }
            retry += 1;
            let delay = self.delay(retry, rand::random_range(0.75..1.25));
            tracing::debug!(
                retry,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "transient lookup error, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
