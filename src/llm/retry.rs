//! Exponential-backoff retry for calls to the generation service.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first call.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
    /// Picks each delay uniformly from `[delay / 2, delay]`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            backoff_multiplier: 2.0,
            max_backoff_ms: 8_000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Retries immediately; used where waiting adds nothing (tests, local servers).
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            backoff_multiplier: 1.0,
            max_backoff_ms: 0,
            jitter: false,
        }
    }

    /// Delay before retry number `retry` (0 = the wait after the first failure).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = self.backoff_multiplier.max(1.0).powi(retry as i32);
        let raw = (self.initial_backoff_ms as f64 * exp).min(self.max_backoff_ms as f64);
        let capped = raw.max(0.0) as u64;

        if self.jitter && capped > 1 {
            let low = capped / 2;
            Duration::from_millis(rand::rng().random_range(low..=capped))
        } else {
            Duration::from_millis(capped)
        }
    }
}

#[derive(Debug)]
pub struct RetryFailure<E> {
    pub error: E,
    pub attempts: u32,
    /// True when the last error was retriable but the attempt budget ran out.
    pub exhausted: bool,
}

/// Runs `operation` until it succeeds, returns a non-retriable error, or the
/// policy's attempt budget is spent.
pub async fn retry_async<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    is_retriable: P,
    mut operation: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!("{} succeeded on attempt {}/{}", label, attempt, max_attempts);
                }
                return Ok(value);
            }
            Err(err) if is_retriable(&err) && attempt < max_attempts => {
                let delay = policy.delay_for(attempt - 1);
                tracing::warn!(
                    "{} transient failure (attempt {}/{}), retrying in {:?}: {}",
                    label,
                    attempt,
                    max_attempts,
                    delay,
                    err
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
            Err(err) => {
                let exhausted = is_retriable(&err);
                return Err(RetryFailure {
                    error: err,
                    attempts: attempt,
                    exhausted,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn transient(err: &TestError) -> bool {
        *err == TestError::Transient
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff_ms: 100,
            backoff_multiplier: 2.0,
            max_backoff_ms: 300,
            jitter: false,
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(300));
        assert_eq!(policy.delay_for(6), Duration::from_millis(300));
    }

    #[test]
    fn jitter_stays_within_half_to_full_delay() {
        let policy = RetryPolicy {
            jitter: true,
            ..RetryPolicy::default()
        };
        for _ in 0..50 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1_000));
        }
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_async(&RetryPolicy::immediate(3), "test", transient, |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(TestError::Transient)
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let failure = retry_async(&RetryPolicy::immediate(3), "test", transient, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(TestError::Fatal) }
        })
        .await
        .unwrap_err();

        assert_eq!(failure.error, TestError::Fatal);
        assert_eq!(failure.attempts, 1);
        assert!(!failure.exhausted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn budget_exhaustion_reports_attempts() {
        let failure = retry_async(&RetryPolicy::immediate(3), "test", transient, |_| async {
            Err::<(), _>(TestError::Transient)
        })
        .await
        .unwrap_err();

        assert_eq!(failure.attempts, 3);
        assert!(failure.exhausted);
    }
}
