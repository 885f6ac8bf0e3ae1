use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Admission control in front of an external capability.
#[async_trait]
pub trait RateGate: Send + Sync {
    /// Wait until the next request may be sent.
    async fn acquire(&self);
}

/// Enforces a minimum delay between consecutive acquisitions.
///
/// Uses tokio time, so tests can drive it with a paused clock.
#[derive(Debug)]
pub struct IntervalGate {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl IntervalGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[async_trait]
impl RateGate for IntervalGate {
    async fn acquire(&self) {
        // Held across the sleep so concurrent callers queue in order
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// A gate that never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

#[async_trait]
impl RateGate for Unlimited {
    async fn acquire(&self) {}
}
