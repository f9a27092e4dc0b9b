//! Football statistics provider access
//!
//! Throttled HTTP access with bounded retries. Everything above this layer
//! talks to the [`Provider`] trait, so league, fixture and form code can be
//! driven by scripted responses.

mod client;
mod retry;
mod throttle;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientConfig, RateLimitedClient, API_KEY_HEADER};
pub use retry::{with_retries, RetryPolicy};
pub use throttle::Throttle;
pub use types::{
    classify_response, has_embedded_errors, is_retriable_status, response_items, Attempt,
    ProviderError,
};

use async_trait::async_trait;
use serde_json::Value;

/// JSON-over-HTTP GET access to the provider
#[async_trait]
pub trait Provider: Send + Sync {
    /// Fetch `path` with query `params`, returning the validated JSON envelope
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ProviderError>;
}
