//! Retry policy for credential requests.
//!
//! Only broker calls go through here. Transfers and the final metadata write are
//! never repeated automatically.

use std::future::Future;
use std::time::Duration;

use loomcast_core::{BrokerError, UploadConfig};

/// Upper bound on a single backoff delay.
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further one.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_backoff: Duration::ZERO,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            max_attempts: config.broker_max_attempts.max(1),
            base_backoff: config.broker_retry_backoff(),
        }
    }

    /// Delay after failed attempt number `attempt` (1-based), exponential with cap.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff
            .saturating_mul(factor)
            .min(MAX_RETRY_BACKOFF)
    }

    /// Run `operation` until it succeeds, fails with a non-transient error, or
    /// the attempt budget is spent. Returns the last error.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, BrokerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BrokerError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.backoff_for(attempt);
                    tracing::warn!(
                        operation = operation,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Credential request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_backoff: Duration::from_millis(500),
        };
        assert_eq!(policy.backoff_for(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(2000));
        assert_eq!(policy.backoff_for(20), MAX_RETRY_BACKOFF);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = fast(3)
            .run("video credential", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(BrokerError::Unreachable("connection refused".into()))
                } else {
                    Ok("credential")
                }
            })
            .await;

        assert_eq!(result, Ok("credential"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = fast(5)
            .run("video credential", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BrokerError::Rejected {
                    status: 401,
                    message: "unauthorized".into(),
                })
            })
            .await;

        assert!(matches!(result, Err(BrokerError::Rejected { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = fast(3)
            .run("thumbnail credential", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BrokerError::Rejected {
                    status: 503,
                    message: "unavailable".into(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn none_makes_a_single_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::none()
            .run("video credential", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BrokerError::Unreachable("timeout".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
