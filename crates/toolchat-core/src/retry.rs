//! Bounded retry with exponential backoff.
//!
//! Only errors for which [`ChatError::is_retryable`] holds are retried; all
//! others are returned at once.

use std::future::Future;
use std::time::Duration;

use crate::error::{ChatError, Result};

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first (values below 1 behave as 1).
    pub attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn with_attempts(attempts: u32) -> Self {
        Self {
            attempts,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::from_secs_f64(base.min(self.max_delay.as_secs_f64()))
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
pub async fn retry<T, F, Fut>(config: &RetryConfig, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut remaining = config.attempts.max(1);
    let mut attempt = 0;

    loop {
        remaining -= 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if remaining > 0 && e.is_retryable() => {
                let delay = config.delay_for_attempt(attempt);
                tracing::warn!(
                    operation = label,
                    error = %e,
                    remaining,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(give_up(label, e)),
        }
    }
}

fn give_up(label: &str, error: ChatError) -> ChatError {
    if error.is_retryable() {
        tracing::error!(operation = label, error = %error, "Retries exhausted");
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(attempts: u32) -> RetryConfig {
        RetryConfig {
            attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2.0,
        }
    }

    #[test]
    fn delay_grows_and_caps() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry(&fast(3), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ChatError::ProviderUnavailable("refused".into()))
            } else {
                Ok("ok")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(&fast(3), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ChatError::RateLimited("429".into()))
        })
        .await;

        assert!(matches!(result, Err(ChatError::RateLimited(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_fail_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(&fast(5), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ChatError::Provider("model not found".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let _ = retry(&fast(0), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ChatError>(())
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
