//! Chromium driver over the Chrome DevTools Protocol.
//!
//! Elements found by a query are tagged with a `data-swipecheck-handle`
//! attribute; the tag value is the handle id, so later actions find the same
//! node again or report it stale. Clicks and drags are real mouse events at
//! the element's centre, fills go through the native value setter so
//! framework-controlled inputs see `input`/`change` events.

use async_trait::async_trait;
use base64::Engine as _;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, SetBlockedUrLsParams};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::driver::{BrowserDriver, DriverConfig, ElementHandle, Viewport};
use crate::locator::{BoundingBox, Point, Selector};
use crate::result::{HarnessError, HarnessResult};
use crate::session::SessionFactory;

/// Attribute carrying a handle id on tagged elements
pub const HANDLE_ATTR: &str = "data-swipecheck-handle";

/// Viewports narrower than this are emulated as mobile devices
const MOBILE_BREAKPOINT: u32 = 768;

// ============================================================================
// Page-side scripts
// ============================================================================

/// Script running `query` and describing every match, tagging it with a handle
fn describe_script(query: &str) -> String {
    format!(
        r#"(() => {{
  let els;
  try {{ els = {query}; }} catch (e) {{ return {{ error: String(e && e.name), message: String(e && e.message) }}; }}
  window.__swipecheckSeq = window.__swipecheckSeq || 0;
  return {{ elements: els.map(el => {{
    let id = el.getAttribute("{HANDLE_ATTR}");
    if (!id) {{ id = "h" + (++window.__swipecheckSeq); el.setAttribute("{HANDLE_ATTR}", id); }}
    const s = getComputedStyle(el);
    const visible = el.getClientRects().length > 0 && s.visibility !== "hidden" && s.display !== "none" && parseFloat(s.opacity || "1") > 0;
    const r = el.getBoundingClientRect();
    const field = ["INPUT", "TEXTAREA", "SELECT"].includes(el.tagName);
    return {{
      id,
      tag: el.tagName.toLowerCase(),
      text: el.innerText ?? el.textContent ?? "",
      value: field ? String(el.value) : null,
      visible,
      enabled: !el.disabled && el.getAttribute("aria-disabled") !== "true",
      bbox: visible ? {{ x: r.x, y: r.y, width: r.width, height: r.height }} : null,
      ariaLabel: el.getAttribute("aria-label"),
    }};
  }}) }};
}})()"#
    )
}

/// Script running `body` with `el` bound to the tagged element
fn element_script(id: &str, body: &str) -> String {
    let css = format!("[{HANDLE_ATTR}=\"{id}\"]");
    let css = serde_json::Value::String(css);
    format!(
        "(() => {{ const el = document.querySelector({css}); if (!el) return {{ stale: true }}; {body} }})()"
    )
}

const CENTER_BODY: &str = "el.scrollIntoView({ block: 'center', inline: 'center' }); \
     const r = el.getBoundingClientRect(); return { x: r.x + r.width / 2, y: r.y + r.height / 2 };";

fn fill_body(value: &str) -> String {
    let value = serde_json::Value::String(value.to_string());
    format!(
        "el.focus(); \
         const proto = el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
         const setter = Object.getOwnPropertyDescriptor(proto, 'value').set; \
         setter.call(el, {value}); \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return {{ ok: true }};"
    )
}

const FOCUS_BODY: &str = "el.focus(); return { ok: true };";

#[derive(Debug, Deserialize)]
struct QueryReply {
    #[serde(default)]
    elements: Vec<RawElement>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawElement {
    id: String,
    tag: String,
    text: Option<String>,
    value: Option<String>,
    visible: bool,
    enabled: bool,
    bbox: Option<BoundingBox>,
    aria_label: Option<String>,
}

impl From<RawElement> for ElementHandle {
    fn from(raw: RawElement) -> Self {
        Self {
            id: raw.id,
            tag_name: raw.tag,
            text_content: raw.text,
            value: raw.value,
            visible: raw.visible,
            enabled: raw.enabled,
            bounding_box: raw.bbox,
            aria_label: raw.aria_label,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ElementReply {
    #[serde(default)]
    stale: bool,
    x: Option<f32>,
    y: Option<f32>,
}

fn query_result(selector: &Selector, reply: QueryReply) -> HarnessResult<Vec<ElementHandle>> {
    match reply.error.as_deref() {
        None => Ok(reply.elements.into_iter().map(ElementHandle::from).collect()),
        Some("SyntaxError") => Err(HarnessError::InvalidSelector {
            selector: selector.to_string(),
        }),
        Some(name) => Err(HarnessError::Script {
            message: format!("{name}: {}", reply.message.unwrap_or_default()),
        }),
    }
}

fn key_text(key: &str) -> Option<&'static str> {
    match key {
        "Enter" => Some("\r"),
        "Tab" => Some("\t"),
        _ => None,
    }
}

// ============================================================================
// Driver
// ============================================================================

/// [`BrowserDriver`] controlling one Chromium instance with one page
pub struct CdpDriver {
    browser: Mutex<Option<CdpBrowser>>,
    page: CdpPage,
    handler: JoinHandle<()>,
    viewport: std::sync::Mutex<Viewport>,
    pointer_down: AtomicBool,
    closed: bool,
}

impl CdpDriver {
    /// Launch Chromium and open a blank page
    pub async fn launch(config: &DriverConfig) -> HarnessResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport.width, config.viewport.height)
            .request_timeout(Duration::from_millis(config.navigation_timeout_ms));
        if !config.headless {
            builder = builder.with_head();
        }
        if config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &config.executable_path {
            builder = builder.chrome_executable(path);
        }
        if let Some(ua) = &config.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }

        let cdp_config = builder.build().map_err(|message| {
            if config.executable_path.is_none() && message.contains("executable") {
                HarnessError::BrowserNotFound
            } else {
                HarnessError::BrowserLaunch { message }
            }
        })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| HarnessError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| HarnessError::BrowserLaunch {
                message: e.to_string(),
            })?;
        info!(headless = config.headless, "chromium launched");

        let driver = Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
            viewport: std::sync::Mutex::new(config.viewport),
            pointer_down: AtomicBool::new(false),
            closed: false,
        };
        driver.apply_viewport(config.viewport).await?;
        Ok(driver)
    }

    fn page(&self) -> HarnessResult<&CdpPage> {
        if self.closed {
            Err(HarnessError::SessionClosed {
                message: "driver already closed".to_string(),
            })
        } else {
            Ok(&self.page)
        }
    }

    async fn eval_json(&self, script: &str) -> HarnessResult<serde_json::Value> {
        let result = self
            .page()?
            .evaluate(script)
            .await
            .map_err(|e| HarnessError::Script {
                message: e.to_string(),
            })?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn on_element(&self, element: &ElementHandle, body: &str) -> HarnessResult<ElementReply> {
        let value = self.eval_json(&element_script(&element.id, body)).await?;
        let reply: ElementReply = serde_json::from_value(value)?;
        if reply.stale {
            return Err(HarnessError::StaleElement {
                id: element.id.clone(),
            });
        }
        Ok(reply)
    }

    async fn mouse(&self, kind: DispatchMouseEventType, at: Point) -> HarnessResult<()> {
        let pressed = self.pointer_down.load(Ordering::SeqCst);
        let mut params = DispatchMouseEventParams::builder()
            .r#type(kind.clone())
            .x(f64::from(at.x))
            .y(f64::from(at.y));
        match kind {
            DispatchMouseEventType::MousePressed | DispatchMouseEventType::MouseReleased => {
                params = params.button(MouseButton::Left).click_count(1);
            }
            _ if pressed => params = params.button(MouseButton::Left).buttons(1),
            _ => {}
        }
        let params = params
            .build()
            .map_err(|message| HarnessError::Input { message })?;
        self.page()?
            .execute(params)
            .await
            .map_err(|e| HarnessError::Input {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn key(&self, kind: DispatchKeyEventType, key: &str) -> HarnessResult<()> {
        let mut params = DispatchKeyEventParams::builder()
            .r#type(kind.clone())
            .key(key)
            .code(key);
        if let (DispatchKeyEventType::KeyDown, Some(text)) = (kind, key_text(key)) {
            params = params.text(text);
        }
        let params = params
            .build()
            .map_err(|message| HarnessError::Input { message })?;
        self.page()?
            .execute(params)
            .await
            .map_err(|e| HarnessError::Input {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn apply_viewport(&self, viewport: Viewport) -> HarnessResult<()> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(viewport.width))
            .height(i64::from(viewport.height))
            .device_scale_factor(1.0)
            .mobile(viewport.width < MOBILE_BREAKPOINT)
            .build()
            .map_err(|message| HarnessError::Script { message })?;
        self.page()?
            .execute(params)
            .await
            .map_err(|e| HarnessError::Script {
                message: e.to_string(),
            })?;
        *self
            .viewport
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = viewport;
        Ok(())
    }

    async fn set_blocked(&self, patterns: Vec<String>) -> HarnessResult<()> {
        let page = self.page()?;
        let cdp = |e: chromiumoxide::error::CdpError| HarnessError::Script {
            message: e.to_string(),
        };
        page.execute(EnableParams::default()).await.map_err(cdp)?;
        page.execute(SetBlockedUrLsParams::new(patterns))
            .await
            .map_err(cdp)?;
        Ok(())
    }
}

impl std::fmt::Debug for CdpDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpDriver")
            .field("closed", &self.closed)
            .field("pointer_down", &self.pointer_down)
            .finish_non_exhaustive()
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl BrowserDriver for CdpDriver {
    async fn navigate(&mut self, url: &str) -> HarnessResult<()> {
        debug!(%url, "goto");
        self.page()?
            .goto(url)
            .await
            .map_err(|e| HarnessError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn query_all(&self, selector: &Selector) -> HarnessResult<Vec<ElementHandle>> {
        let value = self
            .eval_json(&describe_script(&selector.to_query_all()))
            .await?;
        let reply: QueryReply = serde_json::from_value(value).map_err(|e| {
            HarnessError::transient(format!("unreadable query reply: {e}"))
        })?;
        query_result(selector, reply)
    }

    async fn click(&self, element: &ElementHandle) -> HarnessResult<()> {
        let reply = self.on_element(element, CENTER_BODY).await?;
        let (Some(x), Some(y)) = (reply.x, reply.y) else {
            return Err(HarnessError::Input {
                message: format!("element {} has no position", element.id),
            });
        };
        let at = Point::new(x, y);
        self.mouse(DispatchMouseEventType::MouseMoved, at).await?;
        self.mouse(DispatchMouseEventType::MousePressed, at).await?;
        self.mouse(DispatchMouseEventType::MouseReleased, at).await
    }

    async fn fill(&self, element: &ElementHandle, value: &str) -> HarnessResult<()> {
        self.on_element(element, &fill_body(value)).await?;
        Ok(())
    }

    async fn press(&self, element: &ElementHandle, key: &str) -> HarnessResult<()> {
        self.on_element(element, FOCUS_BODY).await?;
        self.key(DispatchKeyEventType::KeyDown, key).await?;
        self.key(DispatchKeyEventType::KeyUp, key).await
    }

    async fn pointer_move(&self, to: Point) -> HarnessResult<()> {
        self.mouse(DispatchMouseEventType::MouseMoved, to).await
    }

    async fn pointer_down(&self, at: Point) -> HarnessResult<()> {
        self.mouse(DispatchMouseEventType::MousePressed, at).await?;
        self.pointer_down.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn pointer_up(&self, at: Point) -> HarnessResult<()> {
        self.pointer_down.store(false, Ordering::SeqCst);
        self.mouse(DispatchMouseEventType::MouseReleased, at).await
    }

    async fn viewport(&self) -> HarnessResult<Viewport> {
        self.page()?;
        Ok(*self
            .viewport
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner))
    }

    async fn set_viewport(&mut self, viewport: Viewport) -> HarnessResult<()> {
        self.apply_viewport(viewport).await
    }

    async fn block_requests(&mut self, patterns: &[String]) -> HarnessResult<()> {
        debug!(?patterns, "blocking requests");
        self.set_blocked(patterns.to_vec()).await
    }

    async fn unblock_requests(&mut self) -> HarnessResult<()> {
        self.set_blocked(Vec::new()).await
    }

    async fn evaluate(&self, script: &str) -> HarnessResult<serde_json::Value> {
        self.eval_json(script).await
    }

    async fn title(&self) -> HarnessResult<String> {
        let title = self
            .page()?
            .get_title()
            .await
            .map_err(|e| HarnessError::Script {
                message: e.to_string(),
            })?;
        Ok(title.unwrap_or_default())
    }

    async fn current_url(&self) -> HarnessResult<String> {
        let url = self.page()?.url().await.map_err(|e| HarnessError::Script {
            message: e.to_string(),
        })?;
        Ok(url.unwrap_or_default())
    }

    async fn go_back(&mut self) -> HarnessResult<()> {
        self.eval_json("history.back()").await?;
        Ok(())
    }

    async fn reload(&mut self) -> HarnessResult<()> {
        let page = self.page()?;
        let url = page.url().await.ok().flatten().unwrap_or_default();
        page.reload()
            .await
            .map_err(|e| HarnessError::Navigation {
                url,
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn screenshot(&self) -> HarnessResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let reply = self
            .page()?
            .execute(params)
            .await
            .map_err(|e| HarnessError::Screenshot {
                message: e.to_string(),
            })?;
        let data: &str = reply.data.as_ref();
        base64::engine::general_purpose::STANDARD
            .decode(data.as_bytes())
            .map_err(|e| HarnessError::Screenshot {
                message: format!("base64 decode failed: {e}"),
            })
    }

    async fn close(&mut self) -> HarnessResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let browser = self.browser.get_mut().take();
        if let Some(mut browser) = browser {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "chromium did not close cleanly");
            }
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "chromium process not reaped");
            }
        }
        self.handler.abort();
        info!("chromium closed");
        Ok(())
    }
}

/// Factory launching one Chromium per session
#[derive(Debug, Clone, Copy, Default)]
pub struct CdpFactory;

#[async_trait]
impl SessionFactory for CdpFactory {
    type Driver = CdpDriver;

    async fn open(&self, config: &HarnessConfig) -> HarnessResult<CdpDriver> {
        CdpDriver::launch(&config.browser).await
    }
}
