//! Throttled, retrying HTTP client for the statistics provider

use super::retry::{with_retries, RetryPolicy};
use super::throttle::Throttle;
use super::types::{classify_response, Attempt, ProviderError};
use super::Provider;
use crate::config::ProviderConfig;
use crate::telemetry::{increment, record_latency, CounterMetric, LatencyMetric};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-apisports-key";

/// Configuration for [`RateLimitedClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// API key sent with every request
    pub api_key: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Minimum spacing between request starts
    pub min_interval: Duration,
    /// Retry policy
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Build from the `[provider]` config section and a resolved API key
    pub fn from_provider_config(config: &ProviderConfig, api_key: String) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
            min_interval: Duration::from_millis(config.min_interval_ms),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: Duration::from_millis(config.backoff_base_ms),
                max_delay: Duration::from_millis(config.backoff_max_ms),
            },
        }
    }
}

/// Provider client with a global throttle and bounded retries
///
/// There is no response caching here; callers own their caches.
pub struct RateLimitedClient {
    config: ClientConfig,
    http: Client,
    throttle: Throttle,
}

impl RateLimitedClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Transport {
                url: config.base_url.clone(),
                message: format!("failed to build HTTP client: {}", e),
            })?;
        let throttle = Throttle::new(config.min_interval);
        Ok(Self {
            config,
            http,
            throttle,
        })
    }

    /// Full URL for an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    /// One throttled request, classified
    async fn attempt(&self, url: &str, params: &[(&str, String)]) -> Attempt {
        self.throttle.wait().await;
        increment(CounterMetric::ProviderRequests);
        let started = Instant::now();

        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .query(params)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                return Attempt::Retriable(ProviderError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                return Attempt::Retriable(ProviderError::Transport {
                    url: url.to_string(),
                    message: format!("failed reading body: {}", e),
                })
            }
        };
        record_latency(LatencyMetric::ProviderRequest, started.elapsed());

        classify_response(url, status, &body)
    }
}

#[async_trait]
impl Provider for RateLimitedClient {
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ProviderError> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, params = ?params, "Provider request");
        with_retries(&self.config.retry, &url, || self.attempt(&url, params)).await
    }
}
