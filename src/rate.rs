//! Outbound request throttling
//!
//! A `RateGovernor` keeps a minimum spacing between admitted calls. Clones
//! share the same state, so every fetcher built from one governor is
//! throttled together.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Enforces a minimum interval between admitted calls
///
/// `admit` never rejects; it only delays. Waiters are served in the order
/// they reached the lock.
#[derive(Debug, Clone)]
pub struct RateGovernor {
    min_interval: Duration,
    last_admitted: Arc<Mutex<Option<Instant>>>,
}

impl RateGovernor {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_admitted: Arc::new(Mutex::new(None)),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until at least `min_interval` has passed since the previous
    /// admission, then records and returns this one.
    ///
    /// The lock is held across the sleep so the read-modify-write of the
    /// last admission time is a single critical section.
    pub async fn admit(&self) -> Instant {
        let mut last = self.last_admitted.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if now < ready_at {
                debug!(wait_ms = (ready_at - now).as_millis() as u64, "rate limiting");
                sleep_until(ready_at).await;
            }
        }

        let admitted = Instant::now();
        *last = Some(admitted);
        admitted
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
