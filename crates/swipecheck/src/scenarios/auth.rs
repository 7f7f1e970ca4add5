//! Authentication suite

use futures::future::BoxFuture;

use crate::driver::BrowserDriver;
use crate::elements::Element;
use crate::fixture::generate_user;
use crate::page::AuthMode;
use crate::result::HarnessResult;
use crate::session::ScenarioContext;

pub(super) fn login_screen_on_load<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.page.goto().await?;
        for element in [
            Element::LoginEmail,
            Element::LoginPassword,
            Element::LoginButton,
        ] {
            ctx.page.find(element).await?;
        }
        let logged_in = ctx.page.is_visible(Element::MainNav).await?;
        ctx.checks
            .require(!logged_in, "a fresh session must start signed out")
    })
}

pub(super) fn register_new_user<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = ctx.user();
        ctx.page.goto().await?;
        let registered = ctx.page.register_user(&user).await?;
        ctx.checks
            .require(registered, "registration should succeed for a new user")?;
        let signed_in = ctx.page.is_logged_in().await?;
        ctx.checks
            .note_unless(signed_in, "registration did not sign the user in");
        Ok(())
    })
}

pub(super) fn login_existing_user<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let user = ctx.user();
        ctx.page.goto().await?;
        let registered = ctx.page.register_user(&user).await?;
        ctx.checks.require(registered, "account setup failed")?;

        ctx.page.reload().await?;
        if ctx.page.is_logged_in().await? {
            ctx.checks
                .note("session survived a reload; login form not reachable");
            return Ok(());
        }
        let logged_in = ctx.page.login_user(&user).await?;
        ctx.checks
            .require(logged_in, "a registered user should be able to log in")
    })
}

pub(super) fn invalid_credentials_error<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        let stranger = generate_user(None);
        ctx.page.goto().await?;
        let logged_in = ctx
            .page
            .authenticate(&stranger.email, "WrongPassword1!", AuthMode::Login)
            .await?;
        ctx.checks
            .require(!logged_in, "unknown credentials must not log in")?;
        let reported =
            ctx.page.has_error_notice().await? || ctx.page.has_validation_error().await?;
        ctx.checks
            .require(reported, "refused login should show an error")
    })
}

pub(super) fn required_field_validation<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.page.goto().await?;
        ctx.page.click(Element::LoginButton).await?;
        let logged_in = ctx.page.is_logged_in().await?;
        ctx.checks
            .require(!logged_in, "an empty login form must not sign in")?;
        let shown = ctx.page.has_validation_error().await?;
        ctx.checks
            .note_unless(shown, "no visible message for empty required fields");
        Ok(())
    })
}
