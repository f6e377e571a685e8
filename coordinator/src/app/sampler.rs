//! Generic polling helpers: wait for a condition with a timeout, or retry an operation a fixed number of times.

use core::{fmt::Display, future::Future, time::Duration};

use thiserror::Error as ThisError;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep};
use tracing::debug;

#[derive(Debug, ThisError)]
pub enum PollError<E> {
    #[error("Condition not met within {timeout:?}")]
    Timeout { timeout: Duration },
    #[error(transparent)]
    Check(E),
}

/// Re-evaluates a check every `interval` until it holds or `timeout` elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSampler {
    pub timeout: Duration,
    pub interval: Duration,
}

impl TimeoutSampler {
    #[must_use]
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Polls `check` until it returns `Ok(true)`.
    ///
    /// The check always runs at least once, even with a zero timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Timeout`] once `timeout` has elapsed without success, or
    /// [`PollError::Check`] as soon as `check` itself fails.
    pub async fn wait_for<F, Fut, E>(&self, mut check: F) -> Result<(), PollError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        let mut ticker = interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let start = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            // The first tick completes immediately, so the check runs right away.
            let (satisfied, _) = tokio::join!(check(), ticker.tick());
            attempt = attempt.saturating_add(1);
            if satisfied.map_err(PollError::Check)? {
                debug!(attempt, elapsed = ?start.elapsed(), "Condition met");
                return Ok(());
            }
            if start.elapsed() >= self.timeout {
                debug!(attempt, "Gave up waiting for condition");
                return Err(PollError::Timeout {
                    timeout: self.timeout,
                });
            }
        }
    }
}

/// Runs `op` up to `tries` times with `delay` between failed attempts.
///
/// # Errors
///
/// Returns the error of the last attempt if every attempt failed.
///
/// # Panics
///
/// Panics if `tries` is zero.
pub async fn retry<T, E, F, Fut>(tries: u32, delay: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    assert!(tries > 0, "retry needs at least one attempt");
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < tries => {
                debug!(attempt, tries, "Attempt failed, retrying in {delay:?}: {e}");
                attempt += 1;
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
