//! Locator abstraction for element selection.
//!
//! A logical UI element is described by a [`CandidateSet`]: an ordered list of
//! alternative [`Selector`]s (test id, attribute, placeholder, visible text).
//! The [`LocatorResolver`] walks the list in order and returns the first
//! *visible* match, polling until a timeout. Earlier candidates are
//! authoritative: when two candidates would both match different elements, the
//! earlier one wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, trace};

use crate::driver::{BrowserDriver, ElementHandle};
use crate::result::{HarnessError, HarnessResult};
use crate::wait::{poll_until, WaitOptions, WaitOutcome};

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding box of an element in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point is inside this bounding box
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Visible text (deepest element whose text contains the value)
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// Input or textarea whose placeholder contains the value (case-insensitive)
    Placeholder(String),
    /// CSS selector filtered by text content, Playwright's `css:has-text("...")`
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

fn has_text_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r#"^(?P<css>.+?):has-text\((?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')\)$"#).ok()
        })
        .as_ref()
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a placeholder selector
    #[must_use]
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder(text.into())
    }

    /// Create a `css:has-text("...")` selector
    #[must_use]
    pub fn has_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// JavaScript expression evaluating to an array of all matching elements.
    ///
    /// Invalid CSS throws inside the page; the driver reports it as
    /// [`HarnessError::InvalidSelector`].
    #[must_use]
    pub fn to_query_all(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({}))", js_str(s)),
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); return out; }})()",
                js_str(s)
            ),
            Self::Text(t) => format!(
                "(() => {{ const t = {}; return Array.from(document.querySelectorAll('body *')).filter(el => \
                 (el.textContent || '').includes(t) && !Array.from(el.children).some(c => (c.textContent || '').includes(t))); }})()",
                js_str(t)
            ),
            Self::TestId(id) => {
                let css = format!("[data-testid=\"{}\"]", id.replace('"', "\\\""));
                format!("Array.from(document.querySelectorAll({}))", js_str(&css))
            }
            Self::Placeholder(p) => format!(
                "(() => {{ const p = {}.toLowerCase(); return Array.from(document.querySelectorAll('input[placeholder], textarea[placeholder]'))\
                 .filter(el => el.placeholder.toLowerCase().includes(p)); }})()",
                js_str(p)
            ),
            Self::CssWithText { css, text } => format!(
                "(() => {{ const t = {}; return Array.from(document.querySelectorAll({})).filter(el => (el.textContent || '').includes(t)); }})()",
                js_str(text),
                js_str(css)
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Text(t) => write!(f, "text=\"{t}\""),
            Self::TestId(id) => write!(f, "testid={id}"),
            Self::Placeholder(p) => write!(f, "placeholder={p}"),
            Self::CssWithText { css, text } => write!(f, "{css}:has-text(\"{text}\")"),
        }
    }
}

impl FromStr for Selector {
    type Err = HarnessError;

    /// Parse Playwright-style selector strings.
    ///
    /// `text="Match!"`, `testid=like-button`, `placeholder=message`,
    /// `xpath=//h1` (or a bare `//h1`), `button:has-text("Login")`; anything
    /// else is plain CSS.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || HarnessError::InvalidSelector {
            selector: s.to_string(),
        };
        if s.is_empty() {
            return Err(invalid());
        }

        let prefixed = |prefix: &str| s.strip_prefix(prefix).map(unquote);

        let selector = if let Some(t) = prefixed("text=") {
            Self::Text(t.to_string())
        } else if let Some(id) = prefixed("testid=").or_else(|| prefixed("data-testid=")) {
            Self::TestId(id.to_string())
        } else if let Some(p) = prefixed("placeholder=") {
            Self::Placeholder(p.to_string())
        } else if let Some(x) = prefixed("xpath=") {
            Self::XPath(x.to_string())
        } else if s.starts_with("//") {
            Self::XPath(s.to_string())
        } else if let Some(caps) = has_text_pattern().and_then(|re| re.captures(s)) {
            let text = caps
                .name("dq")
                .or_else(|| caps.name("sq"))
                .map_or("", |m| m.as_str());
            Self::has_text(caps["css"].trim(), text)
        } else {
            Self::Css(s.to_string())
        };

        match &selector {
            Self::Text(v) | Self::TestId(v) | Self::Placeholder(v) | Self::XPath(v)
                if v.is_empty() =>
            {
                Err(invalid())
            }
            _ => Ok(selector),
        }
    }
}

/// Ordered, non-empty list of alternative selectors for one logical element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    selectors: Vec<Selector>,
}

impl CandidateSet {
    /// Build a candidate set; fails when `selectors` is empty
    pub fn new(element: &str, selectors: Vec<Selector>) -> HarnessResult<Self> {
        if selectors.is_empty() {
            return Err(HarnessError::EmptyCandidateSet {
                element: element.to_string(),
            });
        }
        Ok(Self { selectors })
    }

    /// Parse a candidate set from selector strings
    pub fn parse<S: AsRef<str>>(element: &str, raw: &[S]) -> HarnessResult<Self> {
        let selectors = raw
            .iter()
            .map(|s| s.as_ref().parse())
            .collect::<HarnessResult<Vec<Selector>>>()?;
        Self::new(element, selectors)
    }

    /// Selectors in preference order
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Number of candidates
    #[must_use]
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Narrow every candidate to elements whose text contains `text`.
    ///
    /// CSS candidates become `css:has-text(text)`; text candidates become the
    /// requested text; other kinds are kept as CSS-with-text over their own
    /// match where possible and dropped otherwise.
    #[must_use]
    pub fn containing_text(&self, text: &str) -> Self {
        let mut selectors: Vec<Selector> = self
            .selectors
            .iter()
            .filter_map(|s| match s {
                Selector::Css(css) => Some(Selector::has_text(css.clone(), text)),
                Selector::TestId(id) => Some(Selector::has_text(
                    format!("[data-testid=\"{}\"]", id.replace('"', "\\\"")),
                    text,
                )),
                Selector::CssWithText { css, .. } => Some(Selector::has_text(css.clone(), text)),
                Selector::Text(_) | Selector::Placeholder(_) | Selector::XPath(_) => None,
            })
            .collect();
        if selectors.is_empty() {
            selectors.push(Selector::text(text));
        }
        Self { selectors }
    }
}

impl fmt::Display for CandidateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.selectors.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(" | "))
    }
}

/// Resolves candidate sets against a live driver.
#[derive(Debug)]
pub struct LocatorResolver<'a, D: BrowserDriver + ?Sized> {
    driver: &'a D,
    poll_interval: Duration,
}

impl<'a, D: BrowserDriver + ?Sized> LocatorResolver<'a, D> {
    /// Create a resolver borrowing the session's driver
    pub fn new(driver: &'a D, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval,
        }
    }

    /// One resolution pass, no waiting.
    ///
    /// A transient error on an earlier candidate makes the pass inconclusive
    /// (it is returned as the error) even if a later candidate matches, so
    /// precedence is never decided on a half-rendered page.
    pub async fn resolve_once(
        &self,
        candidates: &CandidateSet,
    ) -> HarnessResult<Option<ElementHandle>> {
        for selector in candidates.selectors() {
            let found = self.driver.query_all(selector).await?;
            trace!(%selector, matches = found.len(), "candidate queried");
            if let Some(el) = found.into_iter().find(|el| el.visible) {
                return Ok(Some(el));
            }
        }
        Ok(None)
    }

    /// Resolve the first visible match, polling until `timeout`
    pub async fn resolve(
        &self,
        element: &str,
        candidates: &CandidateSet,
        timeout: Duration,
    ) -> HarnessResult<ElementHandle> {
        match self.poll(candidates, timeout).await {
            WaitOutcome::Satisfied { value, elapsed } => {
                debug!(element, elapsed_ms = elapsed.as_millis() as u64, "resolved");
                Ok(value)
            }
            WaitOutcome::TimedOut { .. } => Err(HarnessError::ElementNotFound {
                element: element.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
            WaitOutcome::PredicateErrored { error, .. } => Err(error),
        }
    }

    /// Like [`resolve`](Self::resolve) but absence is `Ok(None)`.
    ///
    /// Persistent query errors still surface.
    pub async fn probe(
        &self,
        candidates: &CandidateSet,
        timeout: Duration,
    ) -> HarnessResult<Option<ElementHandle>> {
        match self.poll(candidates, timeout).await {
            WaitOutcome::Satisfied { value, .. } => Ok(Some(value)),
            WaitOutcome::TimedOut { .. } => Ok(None),
            WaitOutcome::PredicateErrored { error, .. } => Err(error),
        }
    }

    /// Single pass, no waiting
    pub async fn is_visible(&self, candidates: &CandidateSet) -> HarnessResult<bool> {
        Ok(self.resolve_once(candidates).await?.is_some())
    }

    /// All matches of the first candidate that matches anything.
    ///
    /// Hidden elements are included.
    pub async fn all(&self, candidates: &CandidateSet) -> HarnessResult<Vec<ElementHandle>> {
        for selector in candidates.selectors() {
            let found = self.driver.query_all(selector).await?;
            if !found.is_empty() {
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }

    /// Number of matches of the first candidate that matches anything
    pub async fn count(&self, candidates: &CandidateSet) -> HarnessResult<usize> {
        Ok(self.all(candidates).await?.len())
    }

    async fn poll(
        &self,
        candidates: &CandidateSet,
        timeout: Duration,
    ) -> WaitOutcome<ElementHandle> {
        let options = WaitOptions::new()
            .with_timeout(timeout.as_millis() as u64)
            .with_poll_interval(self.poll_interval.as_millis() as u64);
        poll_until(&options, || self.resolve_once(candidates)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};

    mod selector_tests {
        use super::*;

        #[test]
        fn test_parse_text() {
            let s: Selector = "text=\"It's a match\"".parse().unwrap();
            assert_eq!(s, Selector::text("It's a match"));
        }

        #[test]
        fn test_parse_has_text() {
            let s: Selector = "button:has-text(\"Log In\")".parse().unwrap();
            assert_eq!(s, Selector::has_text("button", "Log In"));

            let single: Selector = ".tab:has-text('Profile')".parse().unwrap();
            assert_eq!(single, Selector::has_text(".tab", "Profile"));
        }

        #[test]
        fn test_parse_prefixed_kinds() {
            assert_eq!(
                "testid=like-button".parse::<Selector>().unwrap(),
                Selector::test_id("like-button")
            );
            assert_eq!(
                "data-testid=main-nav".parse::<Selector>().unwrap(),
                Selector::test_id("main-nav")
            );
            assert_eq!(
                "placeholder=message".parse::<Selector>().unwrap(),
                Selector::placeholder("message")
            );
            assert_eq!(
                "//h1".parse::<Selector>().unwrap(),
                Selector::XPath("//h1".into())
            );
        }

        #[test]
        fn test_parse_plain_css() {
            let s: Selector = "input[type=\"email\"]".parse().unwrap();
            assert_eq!(s, Selector::css("input[type=\"email\"]"));
        }

        #[test]
        fn test_parse_rejects_empty() {
            assert!("".parse::<Selector>().is_err());
            assert!("text=".parse::<Selector>().is_err());
            assert!("testid=\"\"".parse::<Selector>().is_err());
        }

        #[test]
        fn test_display_parses_back() {
            for s in [
                Selector::text("Welcome"),
                Selector::test_id("send-button"),
                Selector::has_text("button", "Send"),
                Selector::css(".match-modal"),
                Selector::placeholder("bio"),
            ] {
                assert_eq!(s.to_string().parse::<Selector>().unwrap(), s);
            }
        }

        #[test]
        fn test_query_escapes_quotes() {
            let q = Selector::text("It's \"big\"").to_query_all();
            assert!(q.contains(r#""It's \"big\"""#));
        }

        #[test]
        fn test_test_id_query() {
            let q = Selector::test_id("like-button").to_query_all();
            assert!(q.contains("data-testid"));
            assert!(q.contains("like-button"));
        }
    }

    mod candidate_set_tests {
        use super::*;

        #[test]
        fn test_empty_rejected() {
            let err = CandidateSet::new("login_button", vec![]).unwrap_err();
            assert!(matches!(err, HarnessError::EmptyCandidateSet { element } if element == "login_button"));
        }

        #[test]
        fn test_parse_keeps_order() {
            let set =
                CandidateSet::parse("x", &["testid=a", "button:has-text(\"B\")", ".c"]).unwrap();
            assert_eq!(set.len(), 3);
            assert_eq!(set.selectors()[0], Selector::test_id("a"));
            assert_eq!(set.selectors()[2], Selector::css(".c"));
        }

        #[test]
        fn test_containing_text() {
            let set = CandidateSet::parse("bubble", &[".message-bubble", "text=\"x\""]).unwrap();
            let narrowed = set.containing_text("hello");
            assert_eq!(
                narrowed.selectors(),
                &[Selector::has_text(".message-bubble", "hello")]
            );
        }
    }

    mod resolver_tests {
        use super::*;

        fn ms(v: u64) -> Duration {
            Duration::from_millis(v)
        }

        #[tokio::test]
        async fn test_first_candidate_wins_over_later_match() {
            let driver = MockDriver::new();
            driver.add_element(MockElement::new("generic", "button").css("button[type=\"submit\"]"));
            driver.add_element(MockElement::new("specific", "button").test_id("login-button"));

            let set = CandidateSet::parse("login", &["testid=login-button", "button[type=\"submit\"]"])
                .unwrap();
            let resolver = LocatorResolver::new(&driver, ms(10));
            let el = resolver.resolve("login", &set, ms(100)).await.unwrap();
            assert_eq!(el.id, "specific");
        }

        #[tokio::test]
        async fn test_falls_back_to_later_candidate() {
            let driver = MockDriver::new();
            driver.add_element(MockElement::new("generic", "button").css("button[type=\"submit\"]"));

            let set = CandidateSet::parse("login", &["testid=login-button", "button[type=\"submit\"]"])
                .unwrap();
            let resolver = LocatorResolver::new(&driver, ms(10));
            let el = resolver.resolve("login", &set, ms(100)).await.unwrap();
            assert_eq!(el.id, "generic");
        }

        #[tokio::test]
        async fn test_hidden_match_skipped() {
            let driver = MockDriver::new();
            driver.add_element(MockElement::new("hidden", "button").test_id("like").hidden());
            driver.add_element(MockElement::new("shown", "button").css(".like-button"));

            let set = CandidateSet::parse("like", &["testid=like", ".like-button"]).unwrap();
            let resolver = LocatorResolver::new(&driver, ms(10));
            let el = resolver.resolve("like", &set, ms(50)).await.unwrap();
            assert_eq!(el.id, "shown");
        }

        #[tokio::test(start_paused = true)]
        async fn test_not_found_names_element() {
            let driver = MockDriver::new();
            let set = CandidateSet::parse("like_button", &["testid=like"]).unwrap();
            let resolver = LocatorResolver::new(&driver, ms(100));
            let err = resolver.resolve("like_button", &set, ms(300)).await.unwrap_err();
            match err {
                HarnessError::ElementNotFound {
                    element,
                    timeout_ms,
                } => {
                    assert_eq!(element, "like_button");
                    assert_eq!(timeout_ms, 300);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_probe_absent_is_none() {
            let driver = MockDriver::new();
            let set = CandidateSet::parse("toggle", &[".theme-toggle"]).unwrap();
            let resolver = LocatorResolver::new(&driver, ms(50));
            assert!(resolver.probe(&set, ms(200)).await.unwrap().is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn test_transient_errors_retried_until_element_appears() {
            let driver = MockDriver::new();
            driver.fail_next_queries(2);
            driver.add_element(MockElement::new("nav", "nav").test_id("main-nav"));

            let set = CandidateSet::parse("main_nav", &["testid=main-nav"]).unwrap();
            let resolver = LocatorResolver::new(&driver, ms(50));
            let el = resolver.resolve("main_nav", &set, ms(1000)).await.unwrap();
            assert_eq!(el.id, "nav");
        }

        #[tokio::test]
        async fn test_count_uses_first_matching_candidate() {
            let driver = MockDriver::new();
            driver.add_element(MockElement::new("h1", "h1").css("h1"));
            driver.add_element(MockElement::new("b1", "button").css("button"));
            driver.add_element(MockElement::new("b2", "button").css("button"));

            let set = CandidateSet::parse("buttons", &[".missing", "button", "h1"]).unwrap();
            let resolver = LocatorResolver::new(&driver, ms(10));
            assert_eq!(resolver.count(&set).await.unwrap(), 2);
        }
    }

    mod geometry_tests {
        use super::*;

        #[test]
        fn test_bounding_box_center() {
            let bbox = BoundingBox::new(10.0, 20.0, 100.0, 50.0);
            let center = bbox.center();
            assert!((center.x - 60.0).abs() < f32::EPSILON);
            assert!((center.y - 45.0).abs() < f32::EPSILON);
            assert!(bbox.contains(&center));
            assert!(!bbox.contains(&Point::new(0.0, 0.0)));
        }
    }
}
