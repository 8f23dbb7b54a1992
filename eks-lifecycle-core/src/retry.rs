//! Bounded retries around the submission of a mutating call
//!
//! EKS rejects some requests while a dependency is still propagating, most
//! commonly a freshly created IAM role. [`retry_when`] repeats such calls at a
//! fixed delay while the call site's predicate matches. Once the deadline has
//! passed it makes one last attempt and returns whatever that attempt
//! produced, so callers see the real API error rather than a synthetic timeout.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::wait::{deadline_after, sleep_or_cancel};

/// Delay between attempts when the call site does not set its own.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Shortest delay between attempts. Shorter delays are raised to it.
pub const MIN_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Timing for one retried submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub timeout: Duration,
    pub delay: Duration,
}

impl RetryConfig {
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Set the delay between attempts, never below [`MIN_RETRY_DELAY`].
    #[must_use]
    pub const fn with_delay(self, delay: Duration) -> Self {
        let delay = if delay.as_millis() < MIN_RETRY_DELAY.as_millis() {
            MIN_RETRY_DELAY
        } else {
            delay
        };
        Self { delay, ..self }
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The last attempt failed. Either the error was not retryable or the
    /// final attempt after the deadline failed too.
    #[error(transparent)]
    Operation(E),

    #[error("retry cancelled")]
    Cancelled,
}

impl<E> RetryError<E> {
    /// The operation's error, if the retry did not end in cancellation.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(err) => Some(err),
            Self::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Run `operation` until it succeeds, fails with an error `is_retryable`
/// rejects, or `config.timeout` elapses.
pub async fn retry_when<T, E, F, Fut, R>(
    config: RetryConfig,
    name: &str,
    cancel: &CancellationToken,
    mut operation: F,
    is_retryable: R,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let deadline = deadline_after(config.timeout);
    let delay = config.delay.max(MIN_RETRY_DELAY);
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        attempt += 1;
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    log::info!("{name} succeeded after {attempt} attempts");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            return Err(RetryError::Operation(err));
        }

        let now = Instant::now();
        if now >= deadline {
            log::warn!(
                "{name} still failing after {:?}, making final attempt: {err}",
                config.timeout
            );
            break;
        }

        log::warn!("{name} attempt {attempt} failed with retryable error: {err}");
        if !sleep_or_cancel(delay.min(deadline - now), cancel).await {
            return Err(RetryError::Cancelled);
        }
    }

    if cancel.is_cancelled() {
        return Err(RetryError::Cancelled);
    }
    operation().await.map_err(RetryError::Operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq, Eq)]
    enum ApiFailure {
        RoleNotVisible,
        AccessDenied,
    }

    impl std::fmt::Display for ApiFailure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl std::error::Error for ApiFailure {}

    fn role_propagation(err: &ApiFailure) -> bool {
        *err == ApiFailure::RoleNotVisible
    }

    fn config() -> RetryConfig {
        RetryConfig::new(Duration::from_secs(120)).with_delay(Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_two_retryable_failures() {
        let attempts = AtomicU32::new(0);

        let result = retry_when(
            config(),
            "create",
            &CancellationToken::new(),
            || async {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ApiFailure::RoleNotVisible)
                } else {
                    Ok("accepted")
                }
            },
            role_propagation,
        )
        .await;

        assert_eq!(result.unwrap(), "accepted");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_returns_after_one_attempt() {
        let attempts = AtomicU32::new(0);

        let err = retry_when(
            config(),
            "create",
            &CancellationToken::new(),
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ApiFailure::AccessDenied)
            },
            role_propagation,
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_operation(), Some(ApiFailure::AccessDenied));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_attempt_after_deadline_surfaces_real_error() {
        let attempts = AtomicU32::new(0);
        let config = RetryConfig::new(Duration::from_secs(10)).with_delay(Duration::from_secs(5));

        let err = retry_when(
            config,
            "create",
            &CancellationToken::new(),
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ApiFailure::RoleNotVisible)
            },
            role_propagation,
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_operation(), Some(ApiFailure::RoleNotVisible));
        // t=0, t=5, t=10 inside the loop, then one final attempt.
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_attempt_can_succeed() {
        let attempts = AtomicU32::new(0);
        let config = RetryConfig::new(Duration::ZERO);

        let result = retry_when(
            config,
            "create",
            &CancellationToken::new(),
            || async {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ApiFailure::RoleNotVisible)
                } else {
                    Ok(7)
                }
            },
            role_propagation,
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_backoff() {
        let attempts = AtomicU32::new(0);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        let err = retry_when(
            config(),
            "create",
            &cancel,
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ApiFailure::RoleNotVisible)
            },
            role_propagation,
        )
        .await
        .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_is_raised_to_minimum() {
        let attempts = AtomicU32::new(0);
        let config = RetryConfig {
            timeout: Duration::from_secs(3),
            delay: Duration::ZERO,
        };

        let err = retry_when(
            config,
            "create",
            &CancellationToken::new(),
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ApiFailure::RoleNotVisible)
            },
            role_propagation,
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_operation(), Some(ApiFailure::RoleNotVisible));
        // t=0, 1, 2 and 3 one second apart, then the final attempt.
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_with_delay_floor() {
        let config = RetryConfig::new(Duration::from_secs(60)).with_delay(Duration::ZERO);
        assert_eq!(config.delay, MIN_RETRY_DELAY);
        let config = config.with_delay(Duration::from_secs(30));
        assert_eq!(config.delay, Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeout_does_not_overflow() {
        let config = RetryConfig::new(Duration::MAX);
        let result = retry_when(
            config,
            "create",
            &CancellationToken::new(),
            || async { Ok::<_, ApiFailure>(1) },
            role_propagation,
        )
        .await;
        assert_eq!(result.unwrap(), 1);
    }

    #[test]
    fn test_operation_error_is_transparent() {
        let err: RetryError<ApiFailure> = RetryError::Operation(ApiFailure::AccessDenied);
        assert_eq!(err.to_string(), "AccessDenied");
    }
}
