//! Bounded retry with backoff for transient failures.
//!
//! Embedding and store errors are transient-by-default; validation errors
//! surface immediately and are never retried.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry budget for transient embedding/store failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Base delay between attempts; grows linearly with the attempt number.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

/// Run `op`, retrying transient failures up to the policy's budget.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(
                    "{} failed (attempt {}/{}), retrying: {}",
                    what, attempt, policy.max_retries, e
                );
                tokio::time::sleep(policy.delay_for(attempt)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KontekstError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_transient_error_retried_until_success() {
        let calls = AtomicU32::new(0);

        let result = with_retry(&quick_policy(3), "flaky op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(KontekstError::Embedding("rate limited".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_budget_exhausted_surfaces_error() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry(&quick_policy(2), "always failing", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(KontekstError::Store("down".into())) }
        })
        .await;

        assert!(result.is_err());
        // Initial attempt plus two retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_validation_error_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry(&quick_policy(5), "bad input", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(KontekstError::InvalidArgument("top_k".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
