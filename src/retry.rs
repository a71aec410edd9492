//! Bounded, fixed-interval retry for broadcast submission

use std::thread;
use std::time::Duration;

use crate::error::{IssuerError, Result};

/// Seconds between broadcast attempts
pub const BROADCAST_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Broadcast attempts before giving up
pub const MAX_BROADCAST_ATTEMPTS: u32 = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    /// `max_attempts` below one is treated as one
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// Run `op` until it succeeds, fails for good, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number. Retryable failures become
    /// `IssuerError::Broadcast` once the budget is spent; a non-transient
    /// provider failure becomes `Broadcast` straight away; anything else
    /// passes through untouched.
    pub fn run<T, F>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Result<T>,
    {
        let max_attempts = self.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(IssuerError::Provider(source)) if !source.is_transient() => {
                    log::error!("Broadcast rejected on attempt {}: {}", attempt, source);
                    return Err(IssuerError::Broadcast {
                        attempts: attempt,
                        source,
                    });
                }
                Err(e) if e.is_retryable() => {
                    if attempt == max_attempts {
                        log::error!("Broadcast failed after {} attempts: {}", attempt, e);
                        return match e {
                            IssuerError::Provider(source) => Err(IssuerError::Broadcast {
                                attempts: attempt,
                                source,
                            }),
                            other => Err(other),
                        };
                    }

                    log::warn!(
                        "Broadcast attempt {}/{} failed: {} (retrying in {:?})",
                        attempt,
                        max_attempts,
                        e,
                        self.interval
                    );
                    thread::sleep(self.interval);
                }
                Err(e) => return Err(e),
            }
        }

        unreachable!("retry loop returns on its last attempt")
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_BROADCAST_ATTEMPTS, BROADCAST_RETRY_INTERVAL)
    }
}
