//! Messaging suite

use futures::future::BoxFuture;

use crate::driver::BrowserDriver;
use crate::elements::Element;
use crate::page::Section;
use crate::result::HarnessResult;
use crate::session::ScenarioContext;

async fn open_messages<D: BrowserDriver>(ctx: &mut ScenarioContext<D>) -> HarnessResult<()> {
    ctx.signed_in().await?;
    ctx.page.navigate_to_section(Section::Messages).await
}

/// Open the first conversation; notes and returns false when there is none
async fn open_conversation_or_note<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> HarnessResult<bool> {
    open_messages(ctx).await?;
    let opened = ctx.page.open_first_conversation().await?;
    Ok(ctx
        .checks
        .note_unless(opened, "no conversations for a new user"))
}

fn greeting<D: BrowserDriver>(ctx: &ScenarioContext<D>) -> String {
    match ctx.suffix() {
        Some(suffix) => format!("Hello from swipecheck {suffix}"),
        None => "Hello from swipecheck".to_string(),
    }
}

pub(super) fn navigate_to_messages<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        open_messages(ctx).await?;
        let shown = ctx.page.is_visible(Element::MessagesSection).await?;
        ctx.checks.require(shown, "messages section should be showing")
    })
}

pub(super) fn conversation_list<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        open_messages(ctx).await?;
        let listed = ctx
            .page
            .wait_any(
                &[Element::ConversationItem, Element::EmptyConversations],
                ctx.page.config().timeouts.element(),
            )
            .await?;
        match listed {
            Some(Element::ConversationItem) => {
                let count = ctx.page.count(Element::ConversationItem).await?;
                ctx.checks.require(count > 0, "conversation items listed")
            }
            Some(_) => {
                ctx.checks.note("no conversations for a new user");
                Ok(())
            }
            None => {
                ctx.checks
                    .note("neither conversations nor an empty state shown");
                Ok(())
            }
        }
    })
}

pub(super) fn open_conversation<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        if !open_conversation_or_note(ctx).await? {
            return Ok(());
        }
        let input = ctx.page.is_visible(Element::MessageInput).await?;
        ctx.checks
            .require(input, "an open conversation should offer a message box")
    })
}

pub(super) fn send_message<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        if !open_conversation_or_note(ctx).await? {
            return Ok(());
        }
        let text = greeting(ctx);
        let sent = ctx.page.send_message(&text).await?;
        ctx.checks.require(sent, "message should appear after sending")?;
        let last = ctx.page.last_message().await?;
        let last = ctx.checks.require_some(last, "last message")?;
        ctx.checks
            .require(last.contains(&text), format!("last message was {last:?}"))
    })
}

pub(super) fn message_history<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        if !open_conversation_or_note(ctx).await? {
            return Ok(());
        }
        let shown = ctx
            .page
            .wait_any(
                &[Element::MessageHistory, Element::EmptyHistory],
                ctx.page.config().timeouts.element(),
            )
            .await?;
        ctx.checks
            .require(shown.is_some(), "conversation history area should show")?;
        let count = ctx.page.message_count().await?;
        ctx.checks
            .note_unless(count > 0, "conversation has no messages yet");
        Ok(())
    })
}

pub(super) fn realtime_update<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        if !open_conversation_or_note(ctx).await? {
            return Ok(());
        }
        let before = ctx.page.message_count().await?;
        let text = greeting(ctx);
        let sent = ctx.page.send_message(&text).await?;
        ctx.checks.require(sent, "message should appear without a reload")?;
        let after = ctx.page.message_count().await?;
        ctx.checks
            .require(after > before, format!("message count {before} -> {after}"))
    })
}

pub(super) fn empty_message_rejected<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        if !open_conversation_or_note(ctx).await? {
            return Ok(());
        }
        let before = ctx.page.message_count().await?;
        let sent = ctx.page.send_message("").await?;
        ctx.checks.require(!sent, "an empty message must not be sent")?;
        let after = ctx.page.message_count().await?;
        ctx.checks
            .require_eq(&after, &before, "message count after empty send")
    })
}

pub(super) fn typing_indicator<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        if !open_conversation_or_note(ctx).await? {
            return Ok(());
        }
        ctx.page.type_without_sending("Typing...").await?;
        let shown = ctx.page.typing_indicator_visible().await?;
        ctx.checks
            .note_unless(shown, "typing indicator not implemented");
        Ok(())
    })
}
