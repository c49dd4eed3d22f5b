//! Backoff policy and the cancellable wait loops built on it.
//!
//! Every cross-chain wait in the bridge is either a readiness poll ("has the
//! message propagated yet?") or a retry of an operation that fails transiently
//! ("the block is not proven yet"). Both race a [`CancellationToken`] at each
//! suspension point and give up once their deadline passes.

use std::{fmt, future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::*;

/// Exponential backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,

    /// Multiplier for each subsequent retry
    pub multiplier: f64,

    /// Maximum delay cap, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 20,
            base_delay_ms: 1_000,
            multiplier: 1.5,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryConfig {
    /// Calculate the delay for a given retry attempt
    pub fn calculate_delay(&self, retry_count: u32) -> Duration {
        if retry_count == 0 {
            return Duration::from_millis(self.base_delay_ms.min(self.max_delay_ms));
        }

        let delay = self.base_delay_ms as f64 * self.multiplier.powi(retry_count as i32);
        Duration::from_millis(delay.min(self.max_delay_ms as f64) as u64)
    }

    /// Check if another attempt is allowed
    pub fn should_retry(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }
}

/// Errors that may succeed if the same call is repeated later.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// The wait was abandoned because its cancellation token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Why a poll or retry loop stopped without a result.
#[derive(Debug, Error)]
pub enum WaitError<E> {
    #[error("operation cancelled")]
    Cancelled,

    /// Deadline or retry budget ran out; `last` is the last transient error seen.
    #[error("gave up after {waited:?}")]
    TimedOut { waited: Duration, last: Option<E> },

    /// A permanent error ended the loop.
    #[error("{0}")]
    Failed(E),
}

impl<E> From<Cancelled> for WaitError<E> {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// Runs `fut` unless `cancel` fires first.
pub async fn with_cancellation<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, Cancelled> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Cancelled),
        out = fut => Ok(out),
    }
}

/// Sleeps for `duration` unless `cancel` fires first.
pub async fn sleep_or_cancel(
    cancel: &CancellationToken,
    duration: Duration,
) -> Result<(), Cancelled> {
    with_cancellation(cancel, sleep(duration)).await
}

/// Polls `check` until it reports ready.
///
/// Transient errors count as "not ready"; any other error ends the poll. Gives up
/// with [`WaitError::TimedOut`] once `deadline` has elapsed.
pub async fn poll_until<F, Fut, E>(
    what: &str,
    policy: &RetryConfig,
    deadline: Duration,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<(), WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Transient + fmt::Display,
{
    let started = Instant::now();
    let mut attempt = 0u32;
    let mut last = None;

    loop {
        match with_cancellation(cancel, check()).await? {
            Ok(true) => {
                debug!(%what, attempt, "ready");
                return Ok(());
            }
            Ok(false) => trace!(%what, attempt, "not ready yet"),
            Err(e) if e.is_transient() => {
                warn!(%what, attempt, err = %e, "transient error while polling");
                last = Some(e);
            }
            Err(e) => return Err(WaitError::Failed(e)),
        }

        let waited = started.elapsed();
        if waited >= deadline {
            return Err(WaitError::TimedOut { waited, last });
        }

        let delay = policy.calculate_delay(attempt).min(deadline - waited);
        sleep_or_cancel(cancel, delay).await?;
        attempt = attempt.saturating_add(1);
    }
}

/// Calls `op` until it succeeds, retrying transient errors with backoff.
///
/// Stops on the first permanent error, when the policy's retry budget is spent or
/// when `deadline` has elapsed.
pub async fn retry_with_backoff<T, E, F, Fut>(
    what: &str,
    policy: &RetryConfig,
    deadline: Duration,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + fmt::Display,
{
    let started = Instant::now();
    let mut attempt = 0u32;

    loop {
        let err = match with_cancellation(cancel, op()).await? {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(WaitError::Failed(e)),
            Err(e) => e,
        };

        let waited = started.elapsed();
        if waited >= deadline || !policy.should_retry(attempt) {
            warn!(%what, attempt, err = %err, "giving up");
            return Err(WaitError::TimedOut {
                waited,
                last: Some(err),
            });
        }

        let delay = policy.calculate_delay(attempt).min(deadline - waited);
        debug!(%what, attempt, ?delay, err = %err, "retrying after transient error");
        sleep_or_cancel(cancel, delay).await?;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum TestError {
        NotYet,
        Broken,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::NotYet)
        }
    }

    fn fast_policy() -> RetryConfig {
        RetryConfig {
            max_retries: 100,
            base_delay_ms: 100,
            multiplier: 2.0,
            max_delay_ms: 1_000,
        }
    }

    mod delay {
        use super::*;

        #[test]
        fn test_retry_delay_calculation() {
            let config = RetryConfig::default();

            assert_eq!(config.calculate_delay(0), Duration::from_millis(1_000));
            assert_eq!(config.calculate_delay(1), Duration::from_millis(1_500));
            assert_eq!(config.calculate_delay(2), Duration::from_millis(2_250));
        }

        #[test]
        fn test_retry_max_delay() {
            let config = RetryConfig {
                base_delay_ms: 5,
                multiplier: 2.0,
                max_delay_ms: 100,
                max_retries: 15,
            };

            assert_eq!(config.calculate_delay(10), Duration::from_millis(100));
        }

        #[test]
        fn test_should_retry() {
            let config = RetryConfig {
                max_retries: 3,
                ..Default::default()
            };

            assert!(config.should_retry(0));
            assert!(config.should_retry(2));
            assert!(!config.should_retry(3));
        }
    }

    mod poll {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_ready_after_a_few_polls() {
            // Scenario: predicate turns true on the third call
            // Expected: Ok, exactly three calls
            let calls = Arc::new(AtomicU32::new(0));
            let cancel = CancellationToken::new();

            let res: Result<(), WaitError<TestError>> =
                poll_until("test", &fast_policy(), Duration::from_secs(60), &cancel, || {
                    let calls = calls.clone();
                    async move { Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2) }
                })
                .await;

            assert!(res.is_ok());
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_times_out() {
            // Scenario: predicate never becomes true
            // Expected: TimedOut once the deadline passes
            let cancel = CancellationToken::new();
            let res: Result<(), WaitError<TestError>> =
                poll_until("test", &fast_policy(), Duration::from_secs(5), &cancel, || async {
                    Ok(false)
                })
                .await;

            match res {
                Err(WaitError::TimedOut { waited, last }) => {
                    assert!(waited >= Duration::from_secs(5));
                    assert!(last.is_none());
                }
                other => panic!("expected timeout, got {other:?}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_transient_errors_keep_polling() {
            let calls = Arc::new(AtomicU32::new(0));
            let cancel = CancellationToken::new();

            let res = poll_until("test", &fast_policy(), Duration::from_secs(60), &cancel, || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(TestError::NotYet)
                    } else {
                        Ok(true)
                    }
                }
            })
            .await;

            assert!(res.is_ok());
        }

        #[tokio::test(start_paused = true)]
        async fn test_permanent_error_stops_polling() {
            let cancel = CancellationToken::new();
            let res =
                poll_until("test", &fast_policy(), Duration::from_secs(60), &cancel, || async {
                    Err::<bool, _>(TestError::Broken)
                })
                .await;

            assert!(matches!(res, Err(WaitError::Failed(TestError::Broken))));
        }

        #[tokio::test(start_paused = true)]
        async fn test_cancel_interrupts_sleep() {
            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(250)).await;
                trigger.cancel();
            });

            let res: Result<(), WaitError<TestError>> =
                poll_until("test", &fast_policy(), Duration::from_secs(600), &cancel, || async {
                    Ok(false)
                })
                .await;

            assert!(matches!(res, Err(WaitError::Cancelled)));
        }
    }

    mod retry {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_retries_transient_then_succeeds() {
            let calls = Arc::new(AtomicU32::new(0));
            let cancel = CancellationToken::new();

            let res = retry_with_backoff(
                "test",
                &fast_policy(),
                Duration::from_secs(60),
                &cancel,
                || {
                    let calls = calls.clone();
                    async move {
                        match calls.fetch_add(1, Ordering::SeqCst) {
                            0 | 1 => Err(TestError::NotYet),
                            n => Ok(n),
                        }
                    }
                },
            )
            .await;

            assert_eq!(res.unwrap(), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_budget_exhausted_keeps_last_error() {
            let policy = RetryConfig {
                max_retries: 2,
                ..fast_policy()
            };
            let calls = Arc::new(AtomicU32::new(0));
            let cancel = CancellationToken::new();

            let res: Result<(), _> =
                retry_with_backoff("test", &policy, Duration::from_secs(60), &cancel, || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(TestError::NotYet)
                    }
                })
                .await;

            assert!(matches!(
                res,
                Err(WaitError::TimedOut {
                    last: Some(TestError::NotYet),
                    ..
                })
            ));
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_permanent_error_is_not_retried() {
            let calls = Arc::new(AtomicU32::new(0));
            let cancel = CancellationToken::new();

            let res: Result<(), _> = retry_with_backoff(
                "test",
                &fast_policy(),
                Duration::from_secs(60),
                &cancel,
                || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(TestError::Broken)
                    }
                },
            )
            .await;

            assert!(matches!(res, Err(WaitError::Failed(TestError::Broken))));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_already_cancelled_skips_call() {
            let calls = Arc::new(AtomicU32::new(0));
            let cancel = CancellationToken::new();
            cancel.cancel();

            let res: Result<(), WaitError<TestError>> = retry_with_backoff(
                "test",
                &fast_policy(),
                Duration::from_secs(60),
                &cancel,
                || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
            )
            .await;

            assert!(matches!(res, Err(WaitError::Cancelled)));
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
    }
}
