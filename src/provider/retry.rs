//! Bounded retries with increasing backoff

use super::types::{Attempt, ProviderError};
use crate::telemetry::{increment, CounterMetric};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy for provider requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`, capped
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Drive `op` until it succeeds, fails fatally, or the retry budget runs out
///
/// The last error is returned when every attempt was retriable.
pub async fn with_retries<F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    mut op: F,
) -> Result<Value, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt>,
{
    let mut retry = 0u32;
    loop {
        match op().await {
            Attempt::Success(value) => return Ok(value),
            Attempt::Fatal(err) => {
                increment(CounterMetric::ProviderFailures);
                tracing::warn!(url = %url, error = %err, "Provider request failed permanently");
                return Err(err);
            }
            Attempt::Retriable(err) => {
                if retry >= policy.max_retries {
                    increment(CounterMetric::ProviderFailures);
                    tracing::warn!(
                        url = %url,
                        status = ?err.status(),
                        attempts = retry + 1,
                        error = %err,
                        "Provider retries exhausted"
                    );
                    return Err(err);
                }
                retry += 1;
                let delay = policy.delay_for(retry);
                increment(CounterMetric::ProviderRetries);
                tracing::debug!(
                    url = %url,
                    retry,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retrying provider request"
                );
                sleep(delay).await;
            }
        }
    }
}
