//! # Bounded Retry
//!
//! A fixed number of retries with a constant delay between attempts.
//!
//! The loop is explicit: one attempt, then (for transient failures only) a
//! suspend-and-resume sleep before the next. The sleep is a timer await, so
//! other work sharing the runtime keeps running while a retry is pending.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::SyncError;

/// Retry schedule for remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before each retry
    pub delay: Duration,
}

/// A value produced within the retry budget.
#[derive(Debug)]
pub struct Retried<T> {
    pub value: T,
    /// Attempts made, including the successful one
    pub attempts: u32,
}

/// The last error once no further attempt will be made.
#[derive(Debug)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub error: SyncError,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Upper bound on attempts, `1 + max_retries`.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Runs `operation` until it succeeds, fails with a non-transient error,
    /// or the attempt budget is spent.
    ///
    /// `on_failure` sees every failed attempt with its 1-based number and
    /// whether another attempt follows.
    pub async fn run<T, F, Fut, C>(
        &self,
        mut operation: F,
        mut on_failure: C,
    ) -> Result<Retried<T>, RetryExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
        C: FnMut(u32, &SyncError, bool),
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => {
                    debug!(attempt, "Remote attempt succeeded");
                    return Ok(Retried {
                        value,
                        attempts: attempt,
                    });
                }
                Err(error) => {
                    let will_retry = error.is_transient() && attempt < max_attempts;
                    on_failure(attempt, &error, will_retry);

                    if !will_retry {
                        warn!(attempt, %error, "Giving up on remote call");
                        return Err(RetryExhausted {
                            attempts: attempt,
                            error,
                        });
                    }

                    warn!(
                        "Remote attempt {}/{} failed: {}; retrying in {:?}",
                        attempt, max_attempts, error, self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}
