use crate::core::error::FetchError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How many times to try an operation, how long each try may take and how long
/// to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    pub delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration, timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            timeout,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000), Duration::from_secs(15))
    }
}

/// Retries an async operation under a [`RetryPolicy`]
///
/// Each attempt is bounded by `policy.timeout`; a timed-out attempt is dropped,
/// which aborts its in-flight request. Non-retryable errors are returned
/// immediately. Intermediate failures are only logged.
///
/// # Returns
/// Either the successful result or the error of the last attempt
pub async fn with_retry<F, Fut, T>(mut operation: F, policy: &RetryPolicy) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let outcome = match tokio::time::timeout(policy.timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(policy.timeout)),
        };

        match outcome {
            Ok(val) => return Ok(val),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                if attempt >= max_attempts {
                    warn!("All {} attempts failed: {}", max_attempts, err);
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, max_attempts, err
                );
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
