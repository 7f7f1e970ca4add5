//! General UI suite

use futures::future::BoxFuture;
use tracing::{info, warn};

use crate::driver::{BrowserDriver, Viewport};
use crate::elements::Element;
use crate::page::Section;
use crate::result::{HarnessError, HarnessResult};
use crate::session::ScenarioContext;

/// Slack for scrollbars when comparing layout and viewport widths
const LAYOUT_TOLERANCE: f32 = 20.0;

pub(super) fn main_navigation<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.signed_in().await?;
        let nav = ctx.page.is_logged_in().await?;
        ctx.checks.require(nav, "main navigation should be visible")?;
        for section in Section::ALL {
            let tab = ctx.page.is_visible(section.tab()).await?;
            ctx.checks
                .require(tab, format!("{section} tab should be visible"))?;
        }
        Ok(())
    })
}

pub(super) fn responsive_layout<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.page.goto().await?;
        for viewport in [Viewport::MOBILE, Viewport::DESKTOP] {
            ctx.page.set_viewport(viewport).await?;
            let Some(width) = ctx.page.layout_width().await? else {
                ctx.checks.note("app container has no layout box");
                return Ok(());
            };
            info!(?viewport, width, "layout measured");
            ctx.checks.require(
                width <= viewport.width as f32 + LAYOUT_TOLERANCE,
                format!("layout {width}px overflows a {}px viewport", viewport.width),
            )?;
            ctx.page.find(Element::LoginButton).await?;
        }
        Ok(())
    })
}

pub(super) fn theme_toggle<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.page.goto().await?;
        match ctx.page.toggle_theme().await? {
            Some((before, after)) => {
                ctx.checks.note_unless(
                    before != after,
                    format!("theme toggle left the background at {before}"),
                );
            }
            None => ctx.checks.note("theme toggle not available"),
        }
        Ok(())
    })
}

pub(super) fn loading_state<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.page.goto().await?;
        let seen = ctx
            .page
            .wait_visible(Element::LoadingIndicator, ctx.page.config().timeouts.probe())
            .await?;
        ctx.checks
            .note_unless(seen, "no loading state observed");
        ctx.page.find(Element::AppContainer).await?;
        Ok(())
    })
}

pub(super) fn offline_error_state<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.page.goto().await?;
        ctx.page.go_offline().await?;
        match ctx.page.reload().await {
            Ok(()) => {
                let reported = ctx
                    .page
                    .wait_visible(Element::OfflineNotice, ctx.page.config().timeouts.action())
                    .await?;
                ctx.checks
                    .note_unless(reported, "no offline banner while requests are blocked");
            }
            Err(error @ HarnessError::Navigation { .. }) => {
                warn!(%error, "offline reload failed");
                ctx.checks.note("offline reload shows the browser error page");
            }
            Err(error) => return Err(error),
        }

        ctx.page.go_online().await?;
        ctx.page.reload().await?;
        let recovered = ctx
            .page
            .wait_any(
                &[Element::LoginEmail, Element::MainNav],
                ctx.page.config().timeouts.element(),
            )
            .await?;
        ctx.checks
            .require(recovered.is_some(), "app should recover when back online")
    })
}

pub(super) fn accessible_buttons<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.page.goto().await?;
        ctx.page.find(Element::LoginButton).await?;
        let audit = ctx.page.button_accessibility().await?;
        ctx.checks.require(audit.total > 0, "no visible buttons")?;
        ctx.checks.require(
            audit.unnamed.is_empty(),
            format!("buttons without an accessible name: {:?}", audit.unnamed),
        )?;
        let headings = ctx.page.heading_count().await?;
        ctx.checks.note_unless(headings > 0, "page has no headings");
        Ok(())
    })
}

pub(super) fn section_navigation<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.signed_in().await?;
        for section in [Section::Profile, Section::Messages, Section::Swipe] {
            ctx.page.navigate_to_section(section).await?;
            ctx.page.navigate_to_section(section).await?;
            let shown = ctx.page.is_visible(section.marker()).await?;
            ctx.checks
                .require(shown, format!("{section} section should be showing"))?;
        }
        Ok(())
    })
}

pub(super) fn form_validation<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.page.goto().await?;
        ctx.page.fill(Element::LoginEmail, "invalid-email").await?;
        let natively_invalid = !ctx.page.email_input_valid().await?;
        if natively_invalid {
            return Ok(());
        }
        ctx.page.fill(Element::LoginPassword, "whatever1").await?;
        ctx.page.click(Element::LoginButton).await?;
        let flagged =
            ctx.page.has_validation_error().await? || ctx.page.has_error_notice().await?;
        ctx.checks
            .require(flagged, "an invalid email address should be flagged")
    })
}

pub(super) fn branding<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.page.goto().await?;
        ctx.page.find(Element::Branding).await?;
        let title = ctx.page.title().await?;
        ctx.checks
            .note_unless(!title.trim().is_empty(), "document has no title");
        Ok(())
    })
}

pub(super) fn back_navigation<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.signed_in().await?;
        ctx.page.navigate_to_section(Section::Profile).await?;
        ctx.page.navigate_to_section(Section::Messages).await?;
        ctx.page.go_back().await?;

        let restored = ctx
            .page
            .wait_visible(
                Section::Profile.marker(),
                ctx.page.config().timeouts.action(),
            )
            .await?;
        ctx.checks
            .note_unless(restored, "back did not restore the previous section");
        let nav = ctx.page.is_logged_in().await?;
        ctx.checks
            .require(nav, "the app should stay signed in after going back")
    })
}
