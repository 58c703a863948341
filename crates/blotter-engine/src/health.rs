//! Tick health tracking.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Point-in-time view of tick outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineHealth {
    /// Successful ticks since start
    pub ticks: u64,
    /// Failed ticks since start
    pub failed_ticks: u64,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// Set once consecutive failures reach the configured threshold
    pub degraded: bool,
    /// Time of the last successful tick
    pub last_success: Option<DateTime<Utc>>,
    /// Message of the most recent failure
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub(crate) struct HealthTracker {
    degraded_after: u32,
    inner: Mutex<EngineHealth>,
}

impl HealthTracker {
    pub(crate) fn new(degraded_after: u32) -> Self {
        Self {
            degraded_after: degraded_after.max(1),
            inner: Mutex::new(EngineHealth::default()),
        }
    }

    pub(crate) fn snapshot(&self) -> EngineHealth {
        self.inner.lock().clone()
    }

    pub(crate) fn record_success(&self) {
        let mut health = self.inner.lock();
        health.ticks += 1;
        health.consecutive_failures = 0;
        health.degraded = false;
        health.last_success = Some(Utc::now());
    }

    pub(crate) fn record_failure(&self, message: String) {
        let mut health = self.inner.lock();
        health.failed_ticks += 1;
        health.consecutive_failures = health.consecutive_failures.saturating_add(1);

        if health.consecutive_failures == self.degraded_after {
            error!(
                "Engine degraded after {} consecutive failed ticks: {}",
                health.consecutive_failures, message
            );
        } else {
            warn!("Tick failed: {}", message);
        }

        health.degraded = health.consecutive_failures >= self.degraded_after;
        health.last_error = Some(message);
    }
}
