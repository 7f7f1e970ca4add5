//! Session lifecycle.
//!
//! Every scenario gets a fresh browser session from a [`SessionFactory`] and
//! runs inside [`with_session`], which closes that session whatever happens:
//! success, error, timeout or panic.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::assertion::{Checks, Note};
use crate::config::HarnessConfig;
use crate::driver::BrowserDriver;
use crate::elements::LocatorTable;
use crate::fixture::{generate_user, TestUser};
use crate::mock::{demo_app, MockDriver};
use crate::page::DatingAppPage;
use crate::result::HarnessResult;

/// Opens browser sessions
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Driver type of the sessions this factory opens
    type Driver: BrowserDriver + 'static;

    /// Open a new, isolated session
    async fn open(&self, config: &HarnessConfig) -> HarnessResult<Self::Driver>;
}

/// Factory for in-process mock sessions
#[derive(Clone)]
pub struct MockFactory {
    make: Arc<dyn Fn() -> MockDriver + Send + Sync>,
}

impl MockFactory {
    /// Factory calling `make` for every session
    pub fn new(make: impl Fn() -> MockDriver + Send + Sync + 'static) -> Self {
        Self {
            make: Arc::new(make),
        }
    }

    /// Sessions running the built-in fake dating app
    #[must_use]
    pub fn demo() -> Self {
        Self::new(demo_app)
    }
}

impl fmt::Debug for MockFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockFactory").finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionFactory for MockFactory {
    type Driver = MockDriver;

    async fn open(&self, config: &HarnessConfig) -> HarnessResult<MockDriver> {
        let mut driver = (self.make)();
        driver.set_viewport(config.browser.viewport).await?;
        Ok(driver)
    }
}

/// Everything one scenario works with
#[derive(Debug)]
pub struct ScenarioContext<D: BrowserDriver> {
    /// Page facade owning the session
    pub page: DatingAppPage<D>,
    /// Hard checks and notes
    pub checks: Checks,
    suffix: Option<String>,
}

impl<D: BrowserDriver> ScenarioContext<D> {
    /// Wrap a page
    pub fn new(page: DatingAppPage<D>, suffix: Option<String>) -> Self {
        Self {
            page,
            checks: Checks::new(),
            suffix,
        }
    }

    /// Fixture suffix override, if any
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Fixture user for this scenario
    pub fn user(&self) -> TestUser {
        generate_user(self.suffix())
    }

    /// Open the app and sign a fresh fixture user in
    pub async fn signed_in(&mut self) -> HarnessResult<TestUser> {
        let user = self.user();
        self.page.goto().await?;
        self.page.ensure_signed_in(&user).await?;
        Ok(user)
    }
}

/// How a session body ended
#[derive(Debug)]
pub enum SessionEnd<T> {
    /// The body returned
    Finished(HarnessResult<T>),
    /// The body exceeded its time budget
    TimedOut(Duration),
    /// The body panicked
    Panicked(String),
}

impl<T> SessionEnd<T> {
    /// Whether the body returned `Ok`
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Finished(Ok(_)))
    }
}

/// Result of one session
#[derive(Debug)]
pub struct SessionRun<T> {
    /// How the body ended; `Finished(Err)` also covers a failed launch
    pub end: SessionEnd<T>,
    /// Notes recorded before the body ended
    pub notes: Vec<Note>,
    /// Screenshot taken before closing a failed session
    pub screenshot: Option<Vec<u8>>,
    /// Wall time including launch and close
    pub duration: Duration,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with non-string payload".to_string())
}

/// Run `body` in a fresh session, closing the session on every exit path.
///
/// `timeout` covers opening the session as well as the body. A failed run takes a screenshot before closing when the config names an
/// artifacts directory. A close failure is logged and does not change the
/// outcome.
pub async fn with_session<F, T, B>(
    factory: &F,
    locators: Arc<LocatorTable>,
    config: Arc<HarnessConfig>,
    suffix: Option<String>,
    timeout: Duration,
    body: B,
) -> SessionRun<T>
where
    F: SessionFactory + ?Sized,
    B: for<'c> FnOnce(&'c mut ScenarioContext<F::Driver>) -> BoxFuture<'c, HarnessResult<T>>,
{
    let started = Instant::now();
    let deadline = tokio::time::Instant::now() + timeout;
    let launch_failed = |end: SessionEnd<T>| SessionRun {
        end,
        notes: Vec::new(),
        screenshot: None,
        duration: started.elapsed(),
    };
    let driver = match tokio::time::timeout_at(deadline, factory.open(&config)).await {
        Ok(Ok(driver)) => driver,
        Ok(Err(error)) => return launch_failed(SessionEnd::Finished(Err(error))),
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "session launch timed out");
            return launch_failed(SessionEnd::TimedOut(timeout));
        }
    };
    let capture = config.artifacts_dir.is_some();
    let mut ctx = ScenarioContext::new(DatingAppPage::new(driver, locators, config), suffix);
    debug!("session opened");

    let guarded = AssertUnwindSafe(body(&mut ctx)).catch_unwind();
    let end = match tokio::time::timeout_at(deadline, guarded).await {
        Ok(Ok(result)) => SessionEnd::Finished(result),
        Ok(Err(payload)) => SessionEnd::Panicked(panic_message(payload.as_ref())),
        Err(_) => SessionEnd::TimedOut(timeout),
    };

    let screenshot = if capture && !end.is_ok() {
        match ctx.page.screenshot().await {
            Ok(png) => Some(png),
            Err(error) => {
                warn!(%error, "failure screenshot not taken");
                None
            }
        }
    } else {
        None
    };

    if let Err(error) = ctx.page.close().await {
        warn!(%error, "session close failed");
    }
    debug!("session closed");

    SessionRun {
        end,
        notes: ctx.checks.into_notes(),
        screenshot,
        duration: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::HarnessError;

    fn shared() -> (MockDriver, MockFactory) {
        let observer = demo_app();
        let handle = observer.clone();
        (observer, MockFactory::new(move || handle.clone()))
    }

    fn setup() -> (Arc<LocatorTable>, Arc<HarnessConfig>) {
        (
            Arc::new(LocatorTable::defaults().unwrap()),
            Arc::new(HarnessConfig::new()),
        )
    }

    mod close_tests {
        use super::*;

        #[tokio::test]
        async fn test_closed_after_success() {
            let (observer, factory) = shared();
            let (locators, config) = setup();
            let run = with_session(&factory, locators, config, None, Duration::from_secs(5), |ctx| {
                Box::pin(async move {
                    ctx.checks.note("ran");
                    ctx.page.goto().await
                })
            })
            .await;
            assert!(run.end.is_ok());
            assert_eq!(run.notes.len(), 1);
            assert!(observer.is_closed());
            assert_eq!(observer.close_calls(), 1);
        }

        #[tokio::test]
        async fn test_closed_after_error() {
            let (observer, factory) = shared();
            let (locators, config) = setup();
            let run: SessionRun<()> =
                with_session(&factory, locators, config, None, Duration::from_secs(5), |_| {
                    Box::pin(async { Err(HarnessError::assertion("boom")) })
                })
                .await;
            assert!(matches!(
                run.end,
                SessionEnd::Finished(Err(HarnessError::AssertionFailed { .. }))
            ));
            assert!(observer.is_closed());
        }

        #[tokio::test(start_paused = true)]
        async fn test_closed_after_timeout() {
            let (observer, factory) = shared();
            let (locators, config) = setup();
            let run: SessionRun<()> =
                with_session(&factory, locators, config, None, Duration::from_millis(50), |_| {
                    Box::pin(async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok(())
                    })
                })
                .await;
            assert!(matches!(run.end, SessionEnd::TimedOut(d) if d == Duration::from_millis(50)));
            assert!(observer.is_closed());
        }

        #[tokio::test]
        async fn test_closed_after_panic() {
            let (observer, factory) = shared();
            let (locators, config) = setup();
            let run: SessionRun<()> =
                with_session(&factory, locators, config, None, Duration::from_secs(5), |_| {
                    Box::pin(async { panic!("scenario exploded") })
                })
                .await;
            assert!(matches!(run.end, SessionEnd::Panicked(ref m) if m == "scenario exploded"));
            assert!(observer.is_closed());
        }
    }

    mod launch_tests {
        use super::*;
        use std::sync::atomic::{AtomicBool, Ordering};

        struct SlowFactory {
            driver: MockDriver,
            launch: Duration,
        }

        #[async_trait]
        impl SessionFactory for SlowFactory {
            type Driver = MockDriver;

            async fn open(&self, _: &HarnessConfig) -> HarnessResult<MockDriver> {
                tokio::time::sleep(self.launch).await;
                Ok(self.driver.clone())
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_launch_past_budget_times_out() {
            let factory = SlowFactory {
                driver: demo_app(),
                launch: Duration::from_secs(60),
            };
            let (locators, config) = setup();
            let ran = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&ran);
            let run: SessionRun<()> =
                with_session(&factory, locators, config, None, Duration::from_millis(50), |_| {
                    Box::pin(async move {
                        flag.store(true, Ordering::SeqCst);
                        Ok(())
                    })
                })
                .await;
            assert!(matches!(run.end, SessionEnd::TimedOut(d) if d == Duration::from_millis(50)));
            assert!(!ran.load(Ordering::SeqCst));
        }

        #[tokio::test(start_paused = true)]
        async fn test_launch_time_counts_against_body() {
            let observer = demo_app();
            let factory = SlowFactory {
                driver: observer.clone(),
                launch: Duration::from_millis(40),
            };
            let (locators, config) = setup();
            let run: SessionRun<()> =
                with_session(&factory, locators, config, None, Duration::from_millis(50), |_| {
                    Box::pin(async {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(())
                    })
                })
                .await;
            assert!(matches!(run.end, SessionEnd::TimedOut(_)));
            assert!(observer.is_closed());
        }
    }

    mod artifact_tests {
        use super::*;

        #[tokio::test]
        async fn test_screenshot_only_on_failure_with_artifacts() {
            let (_, factory) = shared();
            let locators = Arc::new(LocatorTable::defaults().unwrap());
            let config = Arc::new(HarnessConfig::new().with_artifacts_dir("target/artifacts"));

            let failed: SessionRun<()> = with_session(
                &factory,
                Arc::clone(&locators),
                Arc::clone(&config),
                None,
                Duration::from_secs(5),
                |_| Box::pin(async { Err(HarnessError::assertion("x")) }),
            )
            .await;
            assert!(failed.screenshot.is_some());

            let (_, factory) = shared();
            let passed = with_session(&factory, locators, config, None, Duration::from_secs(5), |_| {
                Box::pin(async { Ok(()) })
            })
            .await;
            assert!(passed.screenshot.is_none());
        }
    }

    mod context_tests {
        use super::*;

        #[tokio::test]
        async fn test_suffix_drives_fixture_user() {
            let (_, factory) = shared();
            let (locators, config) = setup();
            let run = with_session(
                &factory,
                locators,
                config,
                Some("ctx".to_string()),
                Duration::from_secs(5),
                |ctx| Box::pin(async move { Ok(ctx.user().email) }),
            )
            .await;
            assert!(matches!(run.end, SessionEnd::Finished(Ok(ref e)) if e == "testctx@example.com"));
        }
    }
}
