//! Wait Mechanisms
//!
//! Bounded polling for eventually-true page conditions. Every wait has a
//! timeout and an interval, and yields a tri-state [`WaitOutcome`]:
//! satisfied, timed out, or the predicate itself kept failing.
//!
//! Polling sleeps on the tokio timer, so waits cooperate with the runtime and
//! can be tested under a paused clock.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::trace;

use crate::result::{HarnessError, HarnessResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Floor for the polling interval so a zero interval cannot spin
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration, never below [`MIN_POLL_INTERVAL_MS`]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

// =============================================================================
// WAIT OUTCOME
// =============================================================================

/// Result of a bounded wait
#[derive(Debug)]
pub enum WaitOutcome<T = ()> {
    /// The condition held; carries the value the probe produced
    Satisfied {
        /// Probe value
        value: T,
        /// Time spent waiting
        elapsed: Duration,
    },
    /// The condition never held before the timeout
    TimedOut {
        /// Time spent waiting
        elapsed: Duration,
        /// Configured budget
        timeout: Duration,
    },
    /// The probe failed with a non-retryable error, or its last attempt
    /// before the timeout was a transient error
    PredicateErrored {
        /// The error that ended the wait
        error: HarnessError,
        /// Time spent waiting
        elapsed: Duration,
    },
}

impl<T> WaitOutcome<T> {
    /// Whether the condition held
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied { .. })
    }

    /// Whether the wait ran out of time
    #[must_use]
    pub const fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Time spent waiting
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Satisfied { elapsed, .. }
            | Self::TimedOut { elapsed, .. }
            | Self::PredicateErrored { elapsed, .. } => *elapsed,
        }
    }

    /// Convert to a result; a timeout becomes [`HarnessError::ActionTimeout`]
    pub fn into_result(self, action: &str) -> HarnessResult<T> {
        match self {
            Self::Satisfied { value, .. } => Ok(value),
            Self::TimedOut { timeout, .. } => Err(HarnessError::ActionTimeout {
                action: action.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
            Self::PredicateErrored { error, .. } => Err(error),
        }
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `probe` until it yields a value or the timeout elapses.
///
/// The probe always runs at least once, so a zero timeout is a single check.
/// Transient errors are retried; any other error ends the wait at once.
/// The final sleep is clamped to the remaining budget, so the total wait
/// never exceeds the timeout by more than one probe.
pub async fn poll_until<T, F, Fut>(options: &WaitOptions, mut probe: F) -> WaitOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HarnessResult<Option<T>>>,
{
    let start = Instant::now();
    let timeout = options.timeout();
    let interval = options.poll_interval();
    let mut attempts = 0_u32;

    loop {
        attempts += 1;
        let last_error = match probe().await {
            Ok(Some(value)) => {
                return WaitOutcome::Satisfied {
                    value,
                    elapsed: start.elapsed(),
                }
            }
            Ok(None) => None,
            Err(error) if error.is_transient() => {
                trace!(attempts, %error, "transient error while polling");
                Some(error)
            }
            Err(error) => {
                return WaitOutcome::PredicateErrored {
                    error,
                    elapsed: start.elapsed(),
                }
            }
        };

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            trace!(attempts, elapsed_ms = elapsed.as_millis() as u64, "wait exhausted");
            return match last_error {
                Some(error) => WaitOutcome::PredicateErrored { error, elapsed },
                None => WaitOutcome::TimedOut { elapsed, timeout },
            };
        }
        sleep(interval.min(timeout - elapsed)).await;
    }
}

/// Poll a boolean predicate until it holds or the timeout elapses
pub async fn await_condition<F, Fut>(options: &WaitOptions, mut predicate: F) -> WaitOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HarnessResult<bool>>,
{
    poll_until(options, || {
        let check = predicate();
        async move { check.await.map(|ok| ok.then_some(())) }
    })
    .await
}

/// Like [`await_condition`] but a timeout is an [`HarnessError::ActionTimeout`]
pub async fn wait_until<F, Fut>(options: &WaitOptions, action: &str, predicate: F) -> HarnessResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HarnessResult<bool>>,
{
    await_condition(options, predicate).await.into_result(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, 5_000);
            assert_eq!(opts.poll_interval_ms, 100);
        }

        #[test]
        fn test_builder() {
            let opts = WaitOptions::new().with_timeout(250).with_poll_interval(0);
            assert_eq!(opts.timeout(), Duration::from_millis(250));
            assert_eq!(opts.poll_interval(), Duration::from_millis(1));
        }
    }

    mod polling_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_satisfied_on_third_poll() {
            let calls = Arc::new(AtomicU32::new(0));
            let c = Arc::clone(&calls);
            let opts = WaitOptions::new().with_timeout(1_000).with_poll_interval(100);

            let outcome = await_condition(&opts, || {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok(n >= 3) }
            })
            .await;

            assert!(outcome.is_satisfied());
            assert_eq!(calls.load(Ordering::SeqCst), 3);
            assert_eq!(outcome.elapsed(), Duration::from_millis(200));
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_bounded_by_one_interval() {
            let opts = WaitOptions::new().with_timeout(250).with_poll_interval(100);
            let outcome = await_condition(&opts, || async { Ok(false) }).await;

            assert!(outcome.is_timed_out());
            let elapsed = outcome.elapsed();
            assert!(elapsed >= Duration::from_millis(250));
            assert!(elapsed <= Duration::from_millis(350));
        }

        #[tokio::test(start_paused = true)]
        async fn test_zero_timeout_checks_once() {
            let calls = Arc::new(AtomicU32::new(0));
            let c = Arc::clone(&calls);
            let opts = WaitOptions::new().with_timeout(0);

            let outcome = await_condition(&opts, || {
                c.fetch_add(1, Ordering::SeqCst);
                async { Ok(false) }
            })
            .await;

            assert!(outcome.is_timed_out());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_transient_errors_retried() {
            let calls = Arc::new(AtomicU32::new(0));
            let c = Arc::clone(&calls);
            let opts = WaitOptions::new().with_timeout(1_000).with_poll_interval(50);

            let outcome = await_condition(&opts, || {
                let n = c.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(HarnessError::transient("node detached"))
                    } else {
                        Ok(true)
                    }
                }
            })
            .await;

            assert!(outcome.is_satisfied());
        }

        #[tokio::test(start_paused = true)]
        async fn test_persistent_transient_error_surfaces() {
            let opts = WaitOptions::new().with_timeout(200).with_poll_interval(50);
            let outcome =
                await_condition(&opts, || async { Err(HarnessError::transient("detached")) }).await;

            match outcome {
                WaitOutcome::PredicateErrored { error, elapsed } => {
                    assert!(error.is_transient());
                    assert!(elapsed >= Duration::from_millis(200));
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_fatal_error_stops_immediately() {
            let calls = Arc::new(AtomicU32::new(0));
            let c = Arc::clone(&calls);
            let opts = WaitOptions::new().with_timeout(5_000);

            let outcome = await_condition(&opts, || {
                c.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(HarnessError::SessionClosed {
                        message: "gone".into(),
                    })
                }
            })
            .await;

            assert!(matches!(outcome, WaitOutcome::PredicateErrored { .. }));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(outcome.elapsed(), Duration::ZERO);
        }

        #[tokio::test(start_paused = true)]
        async fn test_poll_until_returns_value() {
            let opts = WaitOptions::new().with_timeout(100);
            let outcome = poll_until(&opts, || async { Ok(Some("Alex, 27")) }).await;
            assert_eq!(outcome.into_result("card").unwrap(), "Alex, 27");
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_until_maps_timeout() {
            let opts = WaitOptions::new().with_timeout(300).with_poll_interval(100);
            let err = wait_until(&opts, "save confirmation", || async { Ok(false) })
                .await
                .unwrap_err();
            assert!(
                matches!(err, HarnessError::ActionTimeout { ref action, .. } if action == "save confirmation")
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_reports_configured_budget() {
            let opts = WaitOptions::new().with_timeout(100).with_poll_interval(100);
            let outcome = await_condition(&opts, || async {
                tokio::time::sleep(Duration::from_millis(40)).await;
                Ok(false)
            })
            .await;
            assert!(outcome.elapsed() > Duration::from_millis(100));

            let err = outcome.into_result("match notice").unwrap_err();
            assert!(matches!(err, HarnessError::ActionTimeout { timeout_ms: 100, .. }));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn prop_wait_never_exceeds_timeout_plus_interval(timeout in 0_u64..2_000, interval in 1_u64..500) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .start_paused(true)
                    .build()
                    .unwrap();
                let elapsed = rt.block_on(async {
                    let opts = WaitOptions::new().with_timeout(timeout).with_poll_interval(interval);
                    await_condition(&opts, || async { Ok(false) }).await.elapsed()
                });
                prop_assert!(elapsed <= Duration::from_millis(timeout + interval));
                prop_assert!(elapsed >= Duration::from_millis(timeout));
            }
        }
    }
}
