//! Bounded retry with exponential backoff for remote model calls.

use crate::config::ProviderSettings;
use crate::provider::ModelError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How often and how patiently to retry transient failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry. Doubles on every further attempt.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * (1u32 << attempt.min(5))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl From<&ProviderSettings> for RetryPolicy {
    fn from(settings: &ProviderSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            ..Self::default()
        }
    }
}

/// Run `op`, retrying rate-limit and transport failures according to `policy`.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut op: F,
) -> std::result::Result<T, ModelError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, ModelError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay(attempt);
                attempt += 1;
                warn!(
                    "{} failed: {}. Retrying in {:?} ({}/{})",
                    what, e, delay, attempt, policy.max_retries
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(fast(2), "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ModelError::Transport("reset".into()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: std::result::Result<(), _> = with_retry(fast(1), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ModelError::RateLimited("429".into()))
        })
        .await;

        assert!(matches!(result, Err(ModelError::RateLimited(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_auth() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: std::result::Result<(), _> = with_retry(fast(3), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ModelError::Auth("bad key".into()))
        })
        .await;

        assert!(matches!(result, Err(ModelError::Auth(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(9), Duration::from_secs(32));
    }
}
