//! Minimum spacing between consecutive requests

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Global request throttle shared by every caller of a client
///
/// Callers queue on the mutex, so concurrent workers are released one at a
/// time and never closer together than `min_interval`.
pub struct Throttle {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    /// Create a throttle with the given minimum spacing
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until the next request slot is available and claim it
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let next = previous + self.min_interval;
            if Instant::now() < next {
                sleep_until(next).await;
            }
        }
        *last = Some(Instant::now());
    }
}
