//! Retry policy for remote calls.

use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use crate::error::{HistofyError, Result};

/// Exponential backoff applied uniformly to retryable remote calls.
///
/// Commit/blob/tree creation is safe to retry because the request body is
/// fixed before the first attempt and Git object creation is
/// content-addressed: replaying an identical request after a timeout
/// yields the same SHA instead of a duplicate object.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    /// Cap on how long to sleep out a rate-limit window mid-run.
    pub max_rate_limit_wait: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration, max_rate_limit_wait: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
            max_rate_limit_wait,
        }
    }

    /// Backoff before retry attempt `attempt` (1-based): base * 2^(attempt-1).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Run `op`, retrying transient failures with backoff until the
    /// attempt budget is exhausted. Non-transient errors surface
    /// immediately.
    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.attempts => {
                    let delay = match &err {
                        HistofyError::RateLimited { reset } => {
                            self.rate_limit_wait(*reset)
                                .unwrap_or_else(|| self.delay_for_attempt(attempt))
                        }
                        _ => self.delay_for_attempt(attempt),
                    };
                    warn!(
                        what,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, backing off"
                    );
                    std::thread::sleep(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// How long to wait for a rate-limit reset, clamped to
    /// `max_rate_limit_wait` so one bad window cannot stall the run
    /// indefinitely. `None` when the reset is already in the past.
    fn rate_limit_wait(&self, reset: chrono::DateTime<Utc>) -> Option<Duration> {
        let wait = (reset - Utc::now()).to_std().ok()?;
        Some(wait.min(self.max_rate_limit_wait))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(120))
    }
}
