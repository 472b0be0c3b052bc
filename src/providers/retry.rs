//! Retry configuration, delay calculation, and the retry state machine.
//!
//! [`RetryConfig`] controls how many attempts a call gets and how long to
//! back off between them. [`with_retry`] drives a single call through the
//! `Attempting → BackingOff → Succeeded | Exhausted | Failed` states; the
//! transport is its only caller, keeping retry logic in a single place.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::telemetry;
use crate::{HuginnError, Result};

/// Configuration for retry behaviour on transient errors.
///
/// Uses capped exponential backoff: the delay before retry `n` (0-indexed)
/// is `initial_delay * 2^n`, never more than `max_delay`.
///
/// ```rust
/// # use huginn::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(200))
///     .deadline(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 1s.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 30s.
    pub max_delay: Duration,
    /// Optional bound on the whole call, retries and backoff included.
    /// Default: none, so a call lasts at most
    /// `max_attempts * (timeout + max_delay)`.
    pub deadline: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            deadline: None,
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Bound the whole call, retries included.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    ///
    /// Uses exponential backoff: `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// Calculate the effective delay, respecting provider `retry_after` hints.
    ///
    /// A `retry_after` duration (from a `RateLimited` error) takes precedence
    /// over the calculated backoff but is still capped at `max_delay`.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .map(|d| d.min(self.max_delay))
            .unwrap_or_else(|| self.delay_for_attempt(attempt))
    }
}

/// States of one call's retry sequence.
#[derive(Debug)]
enum RetryState<T> {
    Attempting { attempt: u32 },
    BackingOff { attempt: u32, delay: Duration },
    Succeeded(T),
    Exhausted { attempts: u32, last: HuginnError },
    Failed(HuginnError),
}

/// Execute an async operation with retry logic.
///
/// `f` receives the 0-indexed attempt number. Transient errors (as
/// classified by [`HuginnError::is_transient()`]) are retried up to
/// `config.max_attempts` total attempts; attempts are strictly sequential.
/// Once attempts run out the last error is wrapped in
/// [`HuginnError::RetriesExhausted`]. Permanent errors are returned
/// immediately without retry.
pub(crate) async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    provider_name: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut state = RetryState::Attempting { attempt: 0 };
    loop {
        state = match state {
            RetryState::Attempting { attempt } => match f(attempt).await {
                Ok(value) => RetryState::Succeeded(value),
                Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                    let delay = config.effective_delay(attempt, e.retry_after());
                    metrics::counter!(telemetry::RETRIES_TOTAL,
                        "provider" => provider_name.to_owned(),
                    )
                    .increment(1);
                    warn!(
                        provider = provider_name,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    RetryState::BackingOff { attempt, delay }
                }
                Err(e) if e.is_transient() => RetryState::Exhausted {
                    attempts: attempt + 1,
                    last: e,
                },
                Err(e) => RetryState::Failed(e), // permanent error, no retry
            },
            RetryState::BackingOff { attempt, delay } => {
                tokio::time::sleep(delay).await;
                RetryState::Attempting {
                    attempt: attempt + 1,
                }
            }
            RetryState::Succeeded(value) => return Ok(value),
            RetryState::Exhausted { attempts, last } => {
                return Err(HuginnError::RetriesExhausted {
                    attempts,
                    last: Box::new(last),
                });
            }
            RetryState::Failed(e) => return Err(e),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig::new().initial_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast().max_attempts(3), "test", |attempt| {
            calls.fetch_add(1, Ordering::Relaxed);
            async move {
                if attempt < 2 {
                    Err(HuginnError::Http("reset".into()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn exhaustion_wraps_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&fast().max_attempts(4), "test", |_| {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err(HuginnError::Timeout(Duration::from_millis(5))) }
        })
        .await;

        match result.unwrap_err() {
            HuginnError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, HuginnError::Timeout(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.load(Ordering::Relaxed), 4);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&fast().max_attempts(5), "test", |_| {
            calls.fetch_add(1, Ordering::Relaxed);
            async {
                Err(HuginnError::Api {
                    status: 404,
                    message: "nope".into(),
                })
            }
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            HuginnError::Api { status: 404, .. }
        ));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let _ = with_retry(&fast().max_attempts(0), "test", |_| {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Ok(()) }
        })
        .await;
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_between_attempts() {
        let start = tokio::time::Instant::now();
        let stamps = std::sync::Mutex::new(Vec::new());
        let config = RetryConfig::new()
            .max_attempts(4)
            .initial_delay(Duration::from_secs(1));

        let _: Result<()> = with_retry(&config, "test", |_| {
            stamps.lock().unwrap().push(start.elapsed());
            async { Err(HuginnError::Http("down".into())) }
        })
        .await;

        let stamps = stamps.into_inner().unwrap();
        assert_eq!(
            stamps,
            vec![
                Duration::ZERO,
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(7),
            ]
        );
    }
}
