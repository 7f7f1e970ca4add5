//! BrowserDriver - Abstract Browser Automation Trait
//!
//! Everything above this trait (locators, the page facade, scenarios) talks
//! to the page through it, so the same scenarios run against Chromium over
//! CDP (`browser` feature) or against the in-process [`MockDriver`].
//!
//! Element handles are snapshots: they carry what was observed when the query
//! ran plus a driver-issued id for follow-up actions. Acting on a handle whose
//! node has since left the document yields [`HarnessError::StaleElement`].
//!
//! [`MockDriver`]: crate::mock::MockDriver
//! [`HarnessError::StaleElement`]: crate::result::HarnessError::StaleElement

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locator::{BoundingBox, Point, Selector};
use crate::result::HarnessResult;

/// Element handle for DOM interactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-issued identifier for the element
    pub id: String,
    /// Element tag name (lowercase)
    pub tag_name: String,
    /// Element text content
    pub text_content: Option<String>,
    /// Current value for form controls
    pub value: Option<String>,
    /// Rendered and not hidden by style
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Bounding box if rendered
    pub bounding_box: Option<BoundingBox>,
    /// `aria-label` attribute
    pub aria_label: Option<String>,
}

impl ElementHandle {
    /// Create a new visible, enabled element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            text_content: None,
            value: None,
            visible: true,
            enabled: true,
            bounding_box: None,
            aria_label: None,
        }
    }

    /// Check if element is visible
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Trimmed text content, empty when absent
    #[must_use]
    pub fn text(&self) -> &str {
        self.text_content.as_deref().map_or("", str::trim)
    }

    /// Accessible name: aria-label, falling back to visible text
    #[must_use]
    pub fn accessible_name(&self) -> Option<&str> {
        self.aria_label
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| Some(self.text()).filter(|s| !s.is_empty()))
    }

    /// Center of the bounding box, if rendered
    #[must_use]
    pub fn center(&self) -> Option<Point> {
        self.bounding_box.map(|b| b.center())
    }
}

/// Viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Viewport {
    /// Create a viewport
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Desktop 1280x720
    pub const DESKTOP: Self = Self::new(1280, 720);

    /// Mobile portrait (iPhone-sized)
    pub const MOBILE: Self = Self::new(375, 667);
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DESKTOP
    }
}

/// Browser configuration for driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Initial viewport
    pub viewport: Viewport,
    /// Disable the Chromium sandbox (needed in most containers)
    pub no_sandbox: bool,
    /// User agent string
    pub user_agent: Option<String>,
    /// Timeout for navigation in milliseconds
    pub navigation_timeout_ms: u64,
    /// Executable path override
    pub executable_path: Option<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            no_sandbox: true,
            user_agent: None,
            navigation_timeout_ms: 30_000,
            executable_path: None,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Viewport::new(width, height);
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set executable path
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }
}

/// Abstract driver trait for browser automation.
///
/// Queries take `&self`; operations that replace the document or the session
/// take `&mut self`.
///
/// # Implementations
///
/// - `CdpDriver` - Chromium over the DevTools protocol (`browser` feature)
/// - `MockDriver` - In-process fake page for unit and scenario tests
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate to URL and wait for the document to load
    async fn navigate(&mut self, url: &str) -> HarnessResult<()>;

    /// All elements currently matching `selector`, in document order
    async fn query_all(&self, selector: &Selector) -> HarnessResult<Vec<ElementHandle>>;

    /// Click an element
    async fn click(&self, element: &ElementHandle) -> HarnessResult<()>;

    /// Replace the value of a form control, firing input/change events
    async fn fill(&self, element: &ElementHandle, value: &str) -> HarnessResult<()>;

    /// Press a key on a focused element (e.g. "Enter")
    async fn press(&self, element: &ElementHandle, key: &str) -> HarnessResult<()>;

    /// Move the primary pointer
    async fn pointer_move(&self, to: Point) -> HarnessResult<()>;

    /// Press the primary pointer button at a point
    async fn pointer_down(&self, at: Point) -> HarnessResult<()>;

    /// Release the primary pointer button at a point
    async fn pointer_up(&self, at: Point) -> HarnessResult<()>;

    /// Current viewport
    async fn viewport(&self) -> HarnessResult<Viewport>;

    /// Resize the viewport
    async fn set_viewport(&mut self, viewport: Viewport) -> HarnessResult<()>;

    /// Block requests whose URL matches any pattern (`*` wildcards)
    async fn block_requests(&mut self, patterns: &[String]) -> HarnessResult<()>;

    /// Remove all request blocks
    async fn unblock_requests(&mut self) -> HarnessResult<()>;

    /// Evaluate a JavaScript expression and return its JSON value
    async fn evaluate(&self, script: &str) -> HarnessResult<serde_json::Value>;

    /// Document title
    async fn title(&self) -> HarnessResult<String>;

    /// Current URL
    async fn current_url(&self) -> HarnessResult<String>;

    /// Go back in history
    async fn go_back(&mut self) -> HarnessResult<()>;

    /// Reload page
    async fn reload(&mut self) -> HarnessResult<()>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> HarnessResult<Vec<u8>>;

    /// Close the browser. Safe to call more than once.
    async fn close(&mut self) -> HarnessResult<()>;
}
