//! Minimum-interval gate for chat platform mutations
//!
//! Channel creates and renames are heavily rate limited by the platform.
//! Every mutation goes through [`MutationGate::acquire`], which spaces
//! consecutive mutations at least `min_interval` apart. The clock is
//! `tokio::time`, so tests can run it paused.

use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

#[derive(Debug)]
pub struct MutationGate {
    min_interval: Duration,
    last: Option<Instant>,
}

impl MutationGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next mutation is allowed, then claim the slot.
    ///
    /// The first call never waits.
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last {
            let ready_at = last + self.min_interval;
            if ready_at > Instant::now() {
                trace!(wait_ms = (ready_at - Instant::now()).as_millis() as u64, "Waiting for mutation slot");
                sleep_until(ready_at).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
