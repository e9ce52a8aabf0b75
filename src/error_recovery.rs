// src/error_recovery.rs
//! Retry with exponential backoff for origin calls.

use std::time::Duration;

/// How many times, and how patiently, to repeat a failing operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// One attempt plus `retries` repeats.
    pub fn with_retries(retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            initial_delay,
            max_delay: initial_delay.saturating_mul(8),
        }
    }
}

/// Retries an async operation with exponential backoff.
///
/// Only errors accepted by `should_retry` are repeated; any other error is
/// returned immediately. The last error is returned once attempts run out.
pub async fn retry_with_backoff<F, T, E, Fut, P>(
    mut operation: F,
    policy: RetryPolicy,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && should_retry(&e) => {
                log::warn!(
                    "Attempt {} failed ({}), retrying after {:?}",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;

                // Exponential backoff with cap
                delay = std::cmp::min(delay * 2, policy.max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(retries: u32) -> RetryPolicy {
        RetryPolicy::with_retries(retries, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retries_transient_errors_up_to_limit() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("connection reset".to_string()) }
            },
            quick(1),
            |_| true,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("not found".to_string()) }
            },
            quick(3),
            |e| e != "not found",
        )
        .await;

        assert_eq!(result, Err("not found".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_one_failure() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err("timeout".to_string())
                    } else {
                        Ok(n)
                    }
                }
            },
            quick(1),
            |_| true,
        )
        .await;

        assert_eq!(result, Ok(1));
    }
}
