//! Swipe suite

use futures::future::BoxFuture;
use tracing::info;

use crate::driver::BrowserDriver;
use crate::elements::Element;
use crate::page::{Section, SwipeDirection};
use crate::result::HarnessResult;
use crate::session::ScenarioContext;

/// Upper bound on swipes when walking the deck
const MAX_SWIPES: usize = 50;

async fn open_deck<D: BrowserDriver>(ctx: &mut ScenarioContext<D>) -> HarnessResult<()> {
    ctx.signed_in().await?;
    ctx.page.navigate_to_section(Section::Swipe).await
}

pub(super) fn navigate_to_swipe<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        open_deck(ctx).await?;
        let shown = ctx.page.is_visible(Element::SwipeSection).await?;
        ctx.checks.require(shown, "swipe section should be showing")
    })
}

pub(super) fn cards_displayed<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        open_deck(ctx).await?;
        let card = ctx
            .page
            .wait_for(Element::SwipeCard, ctx.page.config().timeouts.element())
            .await?;
        if card.is_none() {
            let exhausted = ctx.page.deck_exhausted().await?;
            ctx.checks
                .require(exhausted, "neither a card nor an end-of-deck state is shown")?;
            ctx.checks.note("deck is empty for a new user");
        }
        Ok(())
    })
}

async fn swipe_advances<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
    direction: SwipeDirection,
) -> HarnessResult<()> {
    open_deck(ctx).await?;
    let outcome = ctx.page.swipe(direction).await?;
    info!(?outcome, "swiped");
    ctx.checks.require(
        outcome.advanced(),
        format!("{direction:?} should replace card {:?}", outcome.before),
    )
}

pub(super) fn like_action<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(swipe_advances(ctx, SwipeDirection::Like))
}

pub(super) fn pass_action<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(swipe_advances(ctx, SwipeDirection::Pass))
}

pub(super) fn drag_gesture<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        open_deck(ctx).await?;
        let outcome = ctx.page.drag_swipe(SwipeDirection::Like).await?;
        ctx.checks
            .note_unless(outcome.advanced(), "cards do not respond to dragging");
        Ok(())
    })
}

pub(super) fn match_notification<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        open_deck(ctx).await?;
        for _ in 0..MAX_SWIPES {
            if ctx.page.card_identity().await?.is_none() {
                break;
            }
            let outcome = ctx.page.swipe(SwipeDirection::Like).await?;
            if outcome.matched {
                let lingering = ctx.page.is_visible(Element::MatchNotice).await?;
                return ctx
                    .checks
                    .require(!lingering, "match notice should be dismissable");
            }
            ctx.checks
                .require(outcome.advanced(), "like should advance the deck")?;
        }
        ctx.checks.note("no match notice while liking the deck");
        Ok(())
    })
}

pub(super) fn end_of_deck<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        open_deck(ctx).await?;
        let mut swiped = 0;
        while swiped < MAX_SWIPES && ctx.page.card_identity().await?.is_some() {
            let outcome = ctx.page.swipe(SwipeDirection::Pass).await?;
            ctx.checks
                .require(outcome.advanced(), "pass should advance the deck")?;
            swiped += 1;
        }
        info!(swiped, "deck walked");
        if swiped == MAX_SWIPES {
            ctx.checks
                .note(format!("deck still has cards after {MAX_SWIPES} swipes"));
            return Ok(());
        }
        let exhausted = ctx.page.deck_exhausted().await?;
        ctx.checks
            .note_unless(exhausted, "no end-of-deck message");
        Ok(())
    })
}
