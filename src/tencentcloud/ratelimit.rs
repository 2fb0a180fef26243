//! Per-action API rate limiting
//!
//! TencentCloud throttles each API action independently, so the limiter keeps
//! one slot per action name and spaces calls to the same action by a minimum
//! interval.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default calls per second allowed for a single action
pub const DEFAULT_RATE_PER_SECOND: u32 = 20;

#[derive(Clone, Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Arc<Mutex<HashMap<String, Instant>>>,
}

impl RateLimiter {
    /// `per_second == 0` disables limiting
    pub fn new(per_second: u32) -> Self {
        let interval = if per_second == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1) / per_second
        };
        Self {
            interval,
            next_slot: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until `action` may be called again
    pub async fn check(&self, action: &str) {
        if self.interval.is_zero() {
            return;
        }

        let wait_until = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = slots.entry(action.to_string()).or_insert(now);
            let start = (*slot).max(now);
            *slot = start + self.interval;
            start
        };

        if wait_until > Instant::now() {
            tracing::debug!("rate limit: delaying {} by {:?}", action, wait_until - Instant::now());
            tokio::time::sleep_until(wait_until).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_PER_SECOND)
    }
}
