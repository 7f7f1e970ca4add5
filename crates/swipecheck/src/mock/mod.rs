//! Mock Driver
//!
//! An in-process page for exercising the harness without a browser. The page
//! is a flat list of [`MockElement`]s; selectors match against each element's
//! test id, CSS aliases, own text and placeholder. Application behaviour is
//! plugged in through [`MockBehavior`], which reacts to clicks, fills, drags
//! and navigation by rewriting the page.
//!
//! [`demo_app`] wires in [`DemoApp`], a small fake dating application that the
//! scenario catalogue runs green against.
//!
//! ## Example
//!
//! ```rust,ignore
//! let driver = MockDriver::new();
//! driver.add_element(MockElement::new("like", "button").test_id("like-button"));
//! let found = driver.query_all(&Selector::test_id("like-button")).await?;
//! ```

mod demo;

pub use demo::{demo_app, DemoApp};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::driver::{BrowserDriver, ElementHandle, Viewport};
use crate::locator::{BoundingBox, Point, Selector};
use crate::result::{HarnessError, HarnessResult};

/// Bytes returned by [`MockDriver::screenshot`]: a bare PNG signature
pub const MOCK_SCREENSHOT: &[u8] = b"\x89PNG\r\n\x1a\n";

/// One element of the mock page
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    /// Stable key; becomes the handle id
    pub key: String,
    /// Tag name
    pub tag: String,
    /// `data-testid`
    pub test_id: Option<String>,
    /// CSS selectors this element answers to (exact string match)
    pub css: Vec<String>,
    /// Own text content
    pub text: String,
    /// Placeholder attribute
    pub placeholder: Option<String>,
    /// Form value
    pub value: String,
    /// Rendered and shown
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Layout box
    pub bounding_box: Option<BoundingBox>,
    /// `aria-label`
    pub aria_label: Option<String>,
}

impl MockElement {
    /// Create a visible, enabled element; the tag is also a CSS alias
    #[must_use]
    pub fn new(key: impl Into<String>, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            key: key.into(),
            css: vec![tag.clone()],
            tag,
            test_id: None,
            text: String::new(),
            placeholder: None,
            value: String::new(),
            visible: true,
            enabled: true,
            bounding_box: Some(BoundingBox::new(0.0, 0.0, 100.0, 32.0)),
            aria_label: None,
        }
    }

    /// Set `data-testid`
    #[must_use]
    pub fn test_id(mut self, id: impl Into<String>) -> Self {
        self.test_id = Some(id.into());
        self
    }

    /// Add a CSS alias
    #[must_use]
    pub fn css(mut self, selector: impl Into<String>) -> Self {
        self.css.push(selector.into());
        self
    }

    /// Set text content
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set placeholder
    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set form value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Mark hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set enabled state
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set layout box
    #[must_use]
    pub fn bbox(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.bounding_box = Some(BoundingBox::new(x, y, width, height));
        self
    }

    /// Set `aria-label`
    #[must_use]
    pub fn aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    fn matches_css(&self, selector: &str) -> bool {
        let test_id_css = self
            .test_id
            .as_ref()
            .map(|id| format!("[data-testid=\"{id}\"]"));
        selector.split(',').map(str::trim).any(|part| {
            self.css.iter().any(|c| c == part) || test_id_css.as_deref() == Some(part)
        })
    }

    /// Whether `selector` selects this element
    #[must_use]
    pub fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Css(css) => self.matches_css(css),
            Selector::TestId(id) => self.test_id.as_deref() == Some(id.as_str()),
            Selector::Text(t) => self.text.contains(t.as_str()),
            Selector::CssWithText { css, text } => {
                self.matches_css(css) && self.text.contains(text.as_str())
            }
            Selector::Placeholder(p) => self
                .placeholder
                .as_deref()
                .is_some_and(|ph| ph.to_lowercase().contains(&p.to_lowercase())),
            Selector::XPath(_) => false,
        }
    }

    fn to_handle(&self) -> ElementHandle {
        ElementHandle {
            id: self.key.clone(),
            tag_name: self.tag.clone(),
            text_content: Some(self.text.clone()),
            value: matches!(self.tag.as_str(), "input" | "textarea").then(|| self.value.clone()),
            visible: self.visible,
            enabled: self.enabled,
            bounding_box: self.visible.then_some(self.bounding_box).flatten(),
            aria_label: self.aria_label.clone(),
        }
    }
}

/// Observable page state owned by the mock driver
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    /// Elements in document order
    pub elements: Vec<MockElement>,
    /// Current URL
    pub url: String,
    /// Document title
    pub title: String,
    /// Viewport
    pub viewport: Viewport,
    /// Blocked request patterns
    pub blocked: Vec<String>,
    /// URL history for `go_back`
    pub history: Vec<String>,
    /// Results returned by `evaluate`, keyed by exact script text
    pub scripts: HashMap<String, serde_json::Value>,
}

impl MockPage {
    /// Find an element by key
    #[must_use]
    pub fn element(&self, key: &str) -> Option<&MockElement> {
        self.elements.iter().find(|e| e.key == key)
    }

    /// Find an element by key, mutably
    pub fn element_mut(&mut self, key: &str) -> Option<&mut MockElement> {
        self.elements.iter_mut().find(|e| e.key == key)
    }

    /// Whether requests to the current origin would be blocked
    #[must_use]
    pub fn is_offline(&self) -> bool {
        !self.blocked.is_empty()
    }

    /// Push a same-document URL change (SPA routing)
    pub fn push_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if self.url != url {
            let previous = std::mem::replace(&mut self.url, url);
            if !previous.is_empty() {
                self.history.push(previous);
            }
        }
    }
}

/// Application behaviour reacting to user input on a [`MockPage`].
///
/// Every hook defaults to doing nothing.
#[allow(unused_variables)]
pub trait MockBehavior: Send {
    /// A document was loaded (navigate or reload)
    fn on_load(&mut self, page: &mut MockPage) {}

    /// An element was clicked
    fn on_click(&mut self, page: &mut MockPage, key: &str) {}

    /// A form control's value was replaced
    fn on_fill(&mut self, page: &mut MockPage, key: &str, value: &str) {}

    /// A key was pressed on an element
    fn on_press(&mut self, page: &mut MockPage, key: &str, pressed: &str) {}

    /// A pointer drag finished
    fn on_drag(&mut self, page: &mut MockPage, from: Point, to: Point) {}

    /// History went back to `page.url`
    fn on_back(&mut self, page: &mut MockPage) {}

    /// Viewport changed
    fn on_resize(&mut self, page: &mut MockPage) {}
}

#[derive(Default)]
struct MockState {
    page: MockPage,
    behavior: Option<Box<dyn MockBehavior>>,
    calls: Vec<String>,
    failing_queries: u32,
    drag_start: Option<Point>,
    closed: bool,
    close_calls: u32,
}

/// Mock driver for unit testing.
///
/// Cloning shares the page, so a test can keep a clone to inspect calls after
/// handing the driver to a session.
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl std::fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("MockDriver")
            .field("url", &state.page.url)
            .field("elements", &state.page.elements.len())
            .field("closed", &state.closed)
            .finish_non_exhaustive()
    }
}

impl MockDriver {
    /// Create an empty mock page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock page driven by `behavior`
    #[must_use]
    pub fn with_behavior(behavior: impl MockBehavior + 'static) -> Self {
        let driver = Self::new();
        driver.state().behavior = Some(Box::new(behavior));
        driver
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn live(&self, call: String) -> HarnessResult<MutexGuard<'_, MockState>> {
        let mut state = self.state();
        state.calls.push(call);
        if state.closed {
            return Err(HarnessError::SessionClosed {
                message: "mock session already closed".to_string(),
            });
        }
        Ok(state)
    }

    /// Append an element to the page
    pub fn add_element(&self, element: MockElement) {
        self.state().page.elements.push(element);
    }

    /// Run `f` against the page
    pub fn with_page<R>(&self, f: impl FnOnce(&mut MockPage) -> R) -> R {
        f(&mut self.state().page)
    }

    /// Set the result `evaluate` returns for an exact script
    pub fn set_script_result(&self, script: impl Into<String>, value: serde_json::Value) {
        self.state().page.scripts.insert(script.into(), value);
    }

    /// Make the next `n` queries fail with a transient error
    pub fn fail_next_queries(&self, n: u32) {
        self.state().failing_queries = n;
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Check if a method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state().calls.iter().any(|c| c.starts_with(method))
    }

    /// Number of recorded calls starting with `method`
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.starts_with(method))
            .count()
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// How many times `close` was called
    #[must_use]
    pub fn close_calls(&self) -> u32 {
        self.state().close_calls
    }

    fn load(&self, url: Option<&str>, call: String) -> HarnessResult<()> {
        let mut guard = self.live(call)?;
        let state = &mut *guard;
        if let Some(url) = url {
            state.page.push_url(url);
        }
        if let Some(behavior) = state.behavior.as_mut() {
            behavior.on_load(&mut state.page);
        }
        Ok(())
    }

    fn interactive(
        &self,
        element: &ElementHandle,
        call: String,
    ) -> HarnessResult<MutexGuard<'_, MockState>> {
        let state = self.live(call)?;
        let Some(target) = state.page.element(&element.id) else {
            return Err(HarnessError::StaleElement {
                id: element.id.clone(),
            });
        };
        if !target.visible {
            return Err(HarnessError::Input {
                message: format!("element {} is not visible", element.id),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> HarnessResult<()> {
        self.load(Some(url), format!("navigate:{url}"))
    }

    async fn query_all(&self, selector: &Selector) -> HarnessResult<Vec<ElementHandle>> {
        let mut state = self.live(format!("query_all:{selector}"))?;
        if state.failing_queries > 0 {
            state.failing_queries -= 1;
            return Err(HarnessError::transient("mock DOM mutating"));
        }
        Ok(state
            .page
            .elements
            .iter()
            .filter(|e| e.matches(selector))
            .map(MockElement::to_handle)
            .collect())
    }

    async fn click(&self, element: &ElementHandle) -> HarnessResult<()> {
        let key = element.id.clone();
        let mut guard = self.live(format!("click:{key}"))?;
        let state = &mut *guard;
        match state.page.element(&key) {
            None => return Err(HarnessError::StaleElement { id: key }),
            // disabled controls swallow clicks, as in a browser
            Some(target) if !target.visible || !target.enabled => return Ok(()),
            Some(_) => {}
        }
        if let Some(behavior) = state.behavior.as_mut() {
            behavior.on_click(&mut state.page, &key);
        }
        Ok(())
    }

    async fn fill(&self, element: &ElementHandle, value: &str) -> HarnessResult<()> {
        let key = element.id.as_str();
        let mut guard = self.interactive(element, format!("fill:{key}"))?;
        let state = &mut *guard;
        if let Some(target) = state.page.element_mut(key) {
            target.value = value.to_string();
        }
        if let Some(behavior) = state.behavior.as_mut() {
            behavior.on_fill(&mut state.page, key, value);
        }
        Ok(())
    }

    async fn press(&self, element: &ElementHandle, key: &str) -> HarnessResult<()> {
        let target = element.id.as_str();
        let mut guard = self.interactive(element, format!("press:{target}:{key}"))?;
        let state = &mut *guard;
        if let Some(behavior) = state.behavior.as_mut() {
            behavior.on_press(&mut state.page, target, key);
        }
        Ok(())
    }

    async fn pointer_move(&self, to: Point) -> HarnessResult<()> {
        self.live(format!("pointer_move:{},{}", to.x, to.y))?;
        Ok(())
    }

    async fn pointer_down(&self, at: Point) -> HarnessResult<()> {
        let mut state = self.live(format!("pointer_down:{},{}", at.x, at.y))?;
        state.drag_start = Some(at);
        Ok(())
    }

    async fn pointer_up(&self, at: Point) -> HarnessResult<()> {
        let mut guard = self.live(format!("pointer_up:{},{}", at.x, at.y))?;
        let state = &mut *guard;
        if let (Some(from), Some(behavior)) = (state.drag_start.take(), state.behavior.as_mut()) {
            behavior.on_drag(&mut state.page, from, at);
        }
        Ok(())
    }

    async fn viewport(&self) -> HarnessResult<Viewport> {
        Ok(self.live("viewport".to_string())?.page.viewport)
    }

    async fn set_viewport(&mut self, viewport: Viewport) -> HarnessResult<()> {
        let mut guard = self.live(format!("set_viewport:{}x{}", viewport.width, viewport.height))?;
        let state = &mut *guard;
        state.page.viewport = viewport;
        if let Some(behavior) = state.behavior.as_mut() {
            behavior.on_resize(&mut state.page);
        }
        Ok(())
    }

    async fn block_requests(&mut self, patterns: &[String]) -> HarnessResult<()> {
        let mut state = self.live(format!("block_requests:{}", patterns.join(",")))?;
        state.page.blocked = patterns.to_vec();
        Ok(())
    }

    async fn unblock_requests(&mut self) -> HarnessResult<()> {
        let mut state = self.live("unblock_requests".to_string())?;
        state.page.blocked.clear();
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> HarnessResult<serde_json::Value> {
        let state = self.live(format!("evaluate:{script}"))?;
        Ok(state
            .page
            .scripts
            .get(script)
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn title(&self) -> HarnessResult<String> {
        Ok(self.live("title".to_string())?.page.title.clone())
    }

    async fn current_url(&self) -> HarnessResult<String> {
        Ok(self.live("current_url".to_string())?.page.url.clone())
    }

    async fn go_back(&mut self) -> HarnessResult<()> {
        let mut guard = self.live("go_back".to_string())?;
        let state = &mut *guard;
        if let Some(previous) = state.page.history.pop() {
            state.page.url = previous;
            if let Some(behavior) = state.behavior.as_mut() {
                behavior.on_back(&mut state.page);
            }
        }
        Ok(())
    }

    async fn reload(&mut self) -> HarnessResult<()> {
        self.load(None, "reload".to_string())
    }

    async fn screenshot(&self) -> HarnessResult<Vec<u8>> {
        self.live("screenshot".to_string())?;
        Ok(MOCK_SCREENSHOT.to_vec())
    }

    async fn close(&mut self) -> HarnessResult<()> {
        let mut state = self.state();
        state.calls.push("close".to_string());
        state.close_calls += 1;
        state.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod element_tests {
        use super::*;

        #[test]
        fn test_matching_rules() {
            let el = MockElement::new("send", "button")
                .test_id("send-button")
                .css(".send-button")
                .text("Send")
                .aria_label("Send message");

            assert!(el.matches(&Selector::test_id("send-button")));
            assert!(el.matches(&Selector::css("button")));
            assert!(el.matches(&Selector::css(".missing, .send-button")));
            assert!(el.matches(&Selector::has_text("[data-testid=\"send-button\"]", "Send")));
            assert!(el.matches(&Selector::has_text("button", "Send")));
            assert!(!el.matches(&Selector::has_text("button", "Like")));
            assert!(el.matches(&Selector::text("Sen")));
            assert!(!el.matches(&Selector::XPath("//button".into())));
        }

        #[test]
        fn test_placeholder_case_insensitive() {
            let el = MockElement::new("msg", "input").placeholder("Type a Message...");
            assert!(el.matches(&Selector::placeholder("message")));
        }

        #[test]
        fn test_hidden_handle_has_no_box() {
            let handle = MockElement::new("x", "div").hidden().to_handle();
            assert!(!handle.visible);
            assert!(handle.bounding_box.is_none());
            assert!(handle.value.is_none());
        }
    }

    mod driver_tests {
        use super::*;

        struct Counter;

        impl MockBehavior for Counter {
            fn on_click(&mut self, page: &mut MockPage, key: &str) {
                if let Some(el) = page.element_mut(key) {
                    let n: u32 = el.text.parse().unwrap_or(0);
                    el.text = (n + 1).to_string();
                }
            }

            fn on_drag(&mut self, page: &mut MockPage, from: Point, to: Point) {
                page.title = format!("dragged {}", to.x - from.x);
            }
        }

        #[tokio::test]
        async fn test_query_and_history() {
            let mut driver = MockDriver::new();
            driver.add_element(MockElement::new("a", "button").test_id("like-button"));
            driver.navigate("http://localhost:3001/").await.unwrap();

            let found = driver
                .query_all(&Selector::test_id("like-button"))
                .await
                .unwrap();
            assert_eq!(found.len(), 1);
            assert!(driver.was_called("navigate"));
            assert_eq!(driver.call_count("query_all"), 1);
            assert_eq!(driver.current_url().await.unwrap(), "http://localhost:3001/");
        }

        #[tokio::test]
        async fn test_click_runs_behavior() {
            let driver = MockDriver::with_behavior(Counter);
            driver.add_element(MockElement::new("c", "button").text("0"));
            let handle = driver.query_all(&Selector::css("button")).await.unwrap().remove(0);
            driver.click(&handle).await.unwrap();
            driver.click(&handle).await.unwrap();
            driver.with_page(|page| assert_eq!(page.element("c").unwrap().text, "2"));
        }

        #[tokio::test]
        async fn test_disabled_click_swallowed() {
            let driver = MockDriver::with_behavior(Counter);
            driver.add_element(MockElement::new("c", "button").text("0").disabled());
            let handle = driver.query_all(&Selector::css("button")).await.unwrap().remove(0);
            driver.click(&handle).await.unwrap();
            driver.with_page(|page| assert_eq!(page.element("c").unwrap().text, "0"));
        }

        #[tokio::test]
        async fn test_stale_handle() {
            let driver = MockDriver::new();
            let ghost = ElementHandle::new("gone", "button");
            let err = driver.click(&ghost).await.unwrap_err();
            assert!(matches!(err, HarnessError::StaleElement { .. }));
        }

        #[tokio::test]
        async fn test_fill_sets_value() {
            let driver = MockDriver::new();
            driver.add_element(MockElement::new("bio", "textarea"));
            let handle = driver.query_all(&Selector::css("textarea")).await.unwrap().remove(0);
            driver.fill(&handle, "hello").await.unwrap();
            let again = driver.query_all(&Selector::css("textarea")).await.unwrap();
            assert_eq!(again[0].value.as_deref(), Some("hello"));
        }

        #[tokio::test]
        async fn test_drag_reaches_behavior() {
            let driver = MockDriver::with_behavior(Counter);
            driver.pointer_down(Point::new(10.0, 10.0)).await.unwrap();
            driver.pointer_move(Point::new(200.0, 10.0)).await.unwrap();
            driver.pointer_up(Point::new(210.0, 10.0)).await.unwrap();
            assert_eq!(driver.title().await.unwrap(), "dragged 200");
        }

        #[tokio::test]
        async fn test_transient_failures_injected() {
            let driver = MockDriver::new();
            driver.fail_next_queries(1);
            assert!(driver
                .query_all(&Selector::css("div"))
                .await
                .unwrap_err()
                .is_transient());
            assert!(driver.query_all(&Selector::css("div")).await.is_ok());
        }

        #[tokio::test]
        async fn test_closed_session_rejects_calls() {
            let mut driver = MockDriver::new();
            driver.close().await.unwrap();
            driver.close().await.unwrap();
            assert_eq!(driver.close_calls(), 2);
            let err = driver.title().await.unwrap_err();
            assert!(err.is_fatal());
        }

        #[tokio::test]
        async fn test_go_back_restores_url() {
            let mut driver = MockDriver::new();
            driver.navigate("http://a/").await.unwrap();
            driver.navigate("http://a/profile").await.unwrap();
            driver.go_back().await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "http://a/");
        }

        #[tokio::test]
        async fn test_clone_shares_state() {
            let driver = MockDriver::new();
            let observer = driver.clone();
            driver.add_element(MockElement::new("x", "div"));
            assert_eq!(observer.with_page(|p| p.elements.len()), 1);
        }
    }
}
