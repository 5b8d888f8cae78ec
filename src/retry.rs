//! Retry of transient failures with capped exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backoff::{Error as BackoffError, ExponentialBackoff, future::retry_notify};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Errors that may succeed when the same call is simply made again.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// How often and how patiently to retry a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first. `0` behaves like `1`.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// Doubling delays from `initial_delay_ms`, capped at `max_delay_ms`.
    /// Attempts are bounded by `max_attempts`, not by elapsed time.
    pub fn backoff(&self) -> ExponentialBackoff {
        let initial = Duration::from_millis(self.initial_delay_ms);
        ExponentialBackoff {
            current_interval: initial,
            initial_interval: initial,
            max_interval: Duration::from_millis(self.max_delay_ms),
            multiplier: 2.0,
            randomization_factor: 0.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

/// Run `op`, retrying only while it fails with a transient error.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let attempts = AtomicU32::new(0);

    let run_attempt = || {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let fut = op();
        async move {
            fut.await.map_err(|err| {
                if err.is_transient() && attempt < max_attempts {
                    BackoffError::transient(err)
                } else {
                    BackoffError::permanent(err)
                }
            })
        }
    };

    let notify = |err: E, delay: Duration| {
        warn!(
            operation,
            attempt = attempts.load(Ordering::SeqCst),
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient failure, retrying"
        );
    };

    retry_notify(policy.backoff(), run_attempt, notify).await
}
