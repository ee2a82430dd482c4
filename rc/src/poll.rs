//! Retry-until-condition primitive

use std::time::Duration;

use tracing::trace;

use crate::clock::Clock;

/// How long a poll took to succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollStats {
    /// Number of times the condition was evaluated, including the final one
    pub attempts: u64,
    /// Clock time at which the condition held
    pub elapsed: Duration,
}

/// Evaluate `check` until it returns true, sleeping `interval` in between
///
/// There is no attempt limit and no timeout. An error from `check` ends the
/// poll immediately.
pub fn poll_until<C, F, E>(clock: &C, interval: Duration, mut check: F) -> Result<PollStats, E>
where
    C: Clock + ?Sized,
    F: FnMut() -> Result<bool, E>,
{
    let mut attempts = 0u64;
    loop {
        attempts += 1;
        if check()? {
            return Ok(PollStats {
                attempts,
                elapsed: clock.elapsed(),
            });
        }
        trace!(attempts, "Condition not met, sleeping");
        clock.sleep(interval);
    }
}
