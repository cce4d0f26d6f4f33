//! Runner configuration.

use std::time::Duration;

use aether_config::RunnerSection;

/// Settings of a single runner loop.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Sleep between empty polls.
    pub poll_interval: Duration,
    pub worker_prefix: String,
    /// Multiplier of `timeout_s` after which a running lock is stale.
    /// Zero disables reclaiming.
    pub stale_lock_factor: u32,
    pub stale_lock_min_secs: u64,
    /// How often a runner refreshes the lock of the task it is running.
    pub lock_refresh_interval: Duration,
}

/// A third of the reclaim floor, so a live lock never looks stale.
fn refresh_interval_for(stale_lock_min_secs: u64) -> Duration {
    Duration::from_secs((stale_lock_min_secs / 3).max(1))
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            worker_prefix: "worker".to_string(),
            stale_lock_factor: 3,
            stale_lock_min_secs: 60,
            lock_refresh_interval: refresh_interval_for(60),
        }
    }
}

impl From<&RunnerSection> for RunnerConfig {
    fn from(section: &RunnerSection) -> Self {
        Self {
            poll_interval: Duration::from_millis(section.poll_interval_ms),
            worker_prefix: section.worker_prefix.clone(),
            stale_lock_factor: section.stale_lock_factor,
            stale_lock_min_secs: section.stale_lock_min_secs,
            lock_refresh_interval: refresh_interval_for(section.stale_lock_min_secs),
        }
    }
}

impl RunnerConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_worker_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.worker_prefix = prefix.into();
        self
    }

    pub fn with_lock_refresh_interval(mut self, interval: Duration) -> Self {
        self.lock_refresh_interval = interval;
        self
    }
}
