//! Minimum-interval rate limiting
//!
//! The provider publishes a request-rate limit rather than a weight budget, so
//! the gateway enforces a fixed minimum gap between consecutive dispatches.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Enforces a minimum interval between consecutive dispatches
///
/// The last dispatch instant survives idle periods, so a drain loop that
/// restarts shortly after stopping still respects the interval.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing one dispatch per `min_interval`
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Configured minimum interval
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Delay the caller must still wait before the next dispatch
    pub async fn time_until_ready(&self) -> Duration {
        let last = *self.last_dispatch.lock().await;
        match last {
            Some(at) => (at + self.min_interval).saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }

    /// Wait for the next dispatch slot and claim it
    ///
    /// # Returns
    /// How long the caller was held back
    pub async fn acquire(&self) -> Duration {
        let mut last = self.last_dispatch.lock().await;
        let started = Instant::now();

        if let Some(at) = *last {
            let ready_at = at + self.min_interval;
            if ready_at > started {
                sleep_until(ready_at).await;
            }
        }

        let now = Instant::now();
        *last = Some(now);
        now - started
    }
}
