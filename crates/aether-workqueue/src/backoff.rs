//! Retry backoff schedule.

use std::time::Duration;

/// Delays for attempts 1 through 4.
const SCHEDULE_SECS: [u64; 4] = [5, 15, 45, 120];

/// Ceiling applied from the fifth attempt on.
pub const MAX_BACKOFF_SECS: u64 = 300;

/// Delay before the next attempt after `attempt` failed.
///
/// Attempt numbers start at 1; 0 is treated as 1.
pub fn backoff_delay(attempt: u32) -> Duration {
    let index = attempt.max(1) as usize - 1;
    let secs = SCHEDULE_SECS
        .get(index)
        .copied()
        .unwrap_or(MAX_BACKOFF_SECS);
    Duration::from_secs(secs.min(MAX_BACKOFF_SECS))
}
