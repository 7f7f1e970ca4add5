//! Swipecheck: resilient browser-driven end-to-end checks for a dating web client
//!
//! Scenarios drive the application through a [`BrowserDriver`]: Chromium over
//! CDP with the `browser` feature, or the in-process [`MockDriver`] running a
//! fake of the application for tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     SWIPECHECK Architecture                      │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────┐   ┌──────────┐   ┌──────────┐  │
//! │  │ Scenario  │──►│ DatingApp    │──►│ Locator  │──►│ Browser  │  │
//! │  │ catalogue │   │ Page facade  │   │ resolver │   │ Driver   │  │
//! │  └───────────┘   └──────────────┘   └──────────┘   └──────────┘  │
//! │        ▲                                                 │       │
//! │  ┌───────────┐                              CDP / mock page      │
//! │  │ Runner    │── session per scenario, verdict + notes ──►report  │
//! │  └───────────┘                                                   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The application's UI is unstable, so every logical element is looked up
//! through an ordered list of alternative selectors ([`LocatorTable`]) and
//! optional features are recorded as [`Note`]s instead of failures.
//!
//! # Example
//!
//! ```ignore
//! use swipecheck::{select, HarnessConfig, MockFactory, ScenarioRunner};
//!
//! let runner = ScenarioRunner::new(MockFactory::demo(), HarnessConfig::new())?;
//! let report = runner.run(select(&["swipe".to_string()])).await;
//! assert!(report.all_passed());
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod assertion;
#[cfg(feature = "browser")]
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation
)]
mod browser;
mod config;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
mod driver;
mod elements;
mod fixture;
#[allow(clippy::missing_errors_doc, clippy::cast_possible_truncation)]
mod harness;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::suboptimal_flops
)]
mod locator;
/// In-process driver and fake dating application
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::too_many_lines,
    clippy::cognitive_complexity
)]
pub mod mock;
#[allow(
    clippy::missing_errors_doc,
    clippy::suboptimal_flops,
    clippy::cast_precision_loss
)]
mod page;
mod result;
/// The scenario catalogue
pub mod scenarios;
mod session;
mod wait;

pub use assertion::{Checks, Note};
#[cfg(feature = "browser")]
pub use browser::{CdpDriver, CdpFactory, HANDLE_ATTR};
pub use config::{HarnessConfig, Timeouts, DEFAULT_BASE_URL};
pub use driver::{BrowserDriver, DriverConfig, ElementHandle, Viewport};
pub use elements::{Element, LocatorTable};
pub use fixture::{
    generate_profile, generate_user, random_suffix, ProfileData, ProfileUpdate, TestUser,
    DEFAULT_PASSWORD, SUFFIX_LEN,
};
pub use harness::{RunReport, ScenarioResult, ScenarioRunner, Verdict};
pub use locator::{BoundingBox, CandidateSet, LocatorResolver, Point, Selector};
pub use mock::{demo_app, DemoApp, MockDriver, MockElement};
pub use page::{
    AuthMode, ButtonAudit, DatingAppPage, Section, SwipeDirection, SwipeOutcome, SwipeStrategy,
};
pub use result::{HarnessError, HarnessResult};
pub use scenarios::{catalogue, select, Scenario, ScenarioFn, SUITES};
pub use session::{
    with_session, MockFactory, ScenarioContext, SessionEnd, SessionFactory, SessionRun,
};
pub use wait::{
    await_condition, poll_until, wait_until, WaitOptions, WaitOutcome, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS, MIN_POLL_INTERVAL_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        catalogue, select, BrowserDriver, Checks, DatingAppPage, Element, HarnessConfig,
        HarnessError, HarnessResult, MockFactory, RunReport, ScenarioContext, ScenarioRunner,
        Section, SessionFactory, SwipeDirection, Verdict,
    };
    #[cfg(feature = "browser")]
    pub use super::{CdpDriver, CdpFactory};
}
