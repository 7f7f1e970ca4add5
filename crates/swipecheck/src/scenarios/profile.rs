//! Profile suite

use futures::future::BoxFuture;

use crate::driver::BrowserDriver;
use crate::elements::Element;
use crate::fixture::{generate_profile, ProfileUpdate};
use crate::page::Section;
use crate::result::HarnessResult;
use crate::session::ScenarioContext;

pub(super) fn navigate_to_profile<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.signed_in().await?;
        ctx.page.navigate_to_section(Section::Profile).await?;
        let shown = ctx.page.is_visible(Element::ProfileSection).await?;
        ctx.checks.require(shown, "profile section should be showing")
    })
}

pub(super) fn update_profile<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.signed_in().await?;
        let profile = generate_profile();
        let saved = ctx
            .page
            .update_profile(&ProfileUpdate::from(profile.clone()))
            .await?;
        ctx.checks.require(saved, "profile save should be confirmed")?;

        match ctx.page.read_input(Element::CityInput).await? {
            Some(city) => ctx
                .checks
                .require_eq(&city.as_str(), &profile.city.as_str(), "saved city"),
            None => {
                ctx.checks.note("city field value not readable");
                Ok(())
            }
        }
    })
}

pub(super) fn photo_upload_interface<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.signed_in().await?;
        ctx.page.navigate_to_section(Section::Profile).await?;
        let offered = ctx.page.has_photo_upload().await?;
        ctx.checks
            .note_unless(offered, "photo upload not available");
        Ok(())
    })
}

pub(super) fn profile_fields_displayed<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.signed_in().await?;
        ctx.page.navigate_to_section(Section::Profile).await?;
        for element in [Element::BioInput, Element::AgeInput, Element::CityInput] {
            ctx.page.find(element).await?;
        }
        let labels = ctx.page.profile_field_labels().await?;
        ctx.checks
            .note_unless(!labels.is_empty(), "profile fields have no visible labels");
        Ok(())
    })
}

pub(super) fn invalid_age_rejected<D: BrowserDriver>(
    ctx: &mut ScenarioContext<D>,
) -> BoxFuture<'_, HarnessResult<()>> {
    Box::pin(async move {
        ctx.signed_in().await?;
        let saved = ctx
            .page
            .update_profile(&ProfileUpdate::new().age(150))
            .await?;
        ctx.checks.require(!saved, "age 150 must not be saved")?;
        let explained = ctx.page.has_validation_error().await?;
        ctx.checks
            .note_unless(explained, "age rejected without a validation message");
        Ok(())
    })
}
