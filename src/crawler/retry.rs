//! Bounded retry with a fixed backoff interval
//!
//! The executor knows nothing about the operation it wraps. It calls it, and
//! on failure sleeps for the interval and calls it again until the attempt
//! budget is spent, then hands back the last error untouched.

use std::future::Future;
use std::time::Duration;

/// Attempt budget and pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl RetryPolicy {
    /// Creates a policy; an attempt budget of 0 is treated as 1
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Maximum number of attempts, the first one included
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fixed delay between two attempts
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runs `operation` until it succeeds or the policy's attempts are spent
///
/// The operation receives the 1-based attempt number.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sumi_mirror::crawler::{execute, RetryPolicy};
///
/// # async fn example() {
/// let policy = RetryPolicy::new(3, Duration::from_millis(10));
/// let result: Result<u32, String> = execute(policy, |attempt| async move {
///     if attempt < 3 { Err(format!("attempt {} failed", attempt)) } else { Ok(attempt) }
/// })
/// .await;
/// assert_eq!(result, Ok(3));
/// # }
/// ```
pub async fn execute<T, E, F, Fut>(policy: RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    execute_if(policy, operation, |_| true).await
}

/// Like [`execute`], but gives up immediately on errors `is_retryable` rejects
pub async fn execute_if<T, E, F, Fut, P>(
    policy: RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let attempts_left = policy.max_attempts - attempt;
                if attempts_left == 0 || !is_retryable(&error) {
                    return Err(error);
                }

                tracing::warn!("Retrying... attempts left: {}", attempts_left);
                tokio::time::sleep(policy.interval).await;
                attempt += 1;
            }
        }
    }
}
