//! # Retry Executor
//!
//! Wraps a single remote operation with classification-aware retries and
//! exponential backoff, reporting the outcome to the health monitor.
//!
//! The executor never raises past its boundary: every call settles into a
//! [`RetryOutcome`], so callers treat success and failure uniformly. Error
//! classification comes from [`RemoteError::is_permanent`]: permanent errors
//! abort immediately, transient errors back off and retry while attempts
//! remain.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::health::HealthMonitor;
use crate::remote::RemoteError;

/// Attempt and backoff policy for one retried operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (clamped to at least 1)
    pub max_attempts: u32,
    /// Backoff before attempt N+1 is `base_delay * 2^(N-1)`
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff to wait after the given 1-based failed attempt
    fn backoff_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    /// Default caller policy: 3 attempts, 1 second base delay
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Settled result of a retried operation
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T> {
    /// The operation succeeded on some attempt
    Success { value: T, attempts: u32 },
    /// Attempts were exhausted or a permanent error aborted the sequence
    Failure { error: RemoteError, attempts: u32 },
}

impl<T> RetryOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Number of attempts actually performed
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Failure { attempts, .. } => *attempts,
        }
    }
}

/// Executes remote operations under a retry policy, feeding the health monitor
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    health: Arc<HealthMonitor>,
}

impl RetryExecutor {
    pub fn new(health: Arc<HealthMonitor>) -> Self {
        Self { health }
    }

    /// Run `operation` under `policy`, settling into a [`RetryOutcome`]
    ///
    /// The operation closure receives the 1-based attempt number. On the
    /// first success the health monitor records a success and no further
    /// attempts are made. On a permanent error or attempt exhaustion the
    /// monitor records exactly one failure carrying the last error message.
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        policy: RetryPolicy,
        mut operation: F,
    ) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;

        let last_error = loop {
            attempt += 1;
            debug!(attempt, max_attempts, "🔁 Remote attempt starting");

            match operation(attempt).await {
                Ok(value) => {
                    self.health.record_success();
                    debug!(attempt, "Remote attempt succeeded");
                    return RetryOutcome::Success { value, attempts: attempt };
                }
                Err(error) if error.is_permanent() => {
                    warn!(attempt, error = %error, "Permanent remote error, not retrying");
                    break error;
                }
                Err(error) if attempt < max_attempts => {
                    let backoff = policy.backoff_after(attempt);
                    warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %error,
                        "Transient remote error, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(error) => {
                    warn!(attempt, error = %error, "Retry attempts exhausted");
                    break error;
                }
            }
        };

        self.health.record_failure(last_error.to_string());
        RetryOutcome::Failure {
            error: last_error,
            attempts: attempt,
        }
    }
}
