//! Scenario catalogue.
//!
//! Every scenario is a plain async function over a [`ScenarioContext`],
//! registered under `suite::name`. Hard expectations go through
//! [`Checks::require`](crate::Checks::require); behaviour the application may
//! not implement is recorded with [`Checks::note`](crate::Checks::note).

use futures::future::BoxFuture;
use std::fmt;

use crate::driver::BrowserDriver;
use crate::result::HarnessResult;
use crate::session::ScenarioContext;

mod auth;
mod messaging;
mod profile;
mod swipe;
mod ui;

/// Scenario body
pub type ScenarioFn<D> =
    for<'c> fn(&'c mut ScenarioContext<D>) -> BoxFuture<'c, HarnessResult<()>>;

/// A named scenario
pub struct Scenario<D: BrowserDriver> {
    /// Suite the scenario belongs to
    pub suite: &'static str,
    /// Name within the suite
    pub name: &'static str,
    /// One-line description
    pub summary: &'static str,
    /// Body
    pub run: ScenarioFn<D>,
}

impl<D: BrowserDriver> Scenario<D> {
    /// `suite::name`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}::{}", self.suite, self.name)
    }

    /// Whether `filter` selects this scenario.
    ///
    /// A suite name, a scenario name, or a prefix of `suite::name`
    /// containing `::`.
    #[must_use]
    pub fn matches(&self, filter: &str) -> bool {
        filter == self.suite
            || filter == self.name
            || (filter.contains("::") && self.id().starts_with(filter))
    }
}

impl<D: BrowserDriver> Clone for Scenario<D> {
    fn clone(&self) -> Self {
        Self {
            suite: self.suite,
            name: self.name,
            summary: self.summary,
            run: self.run,
        }
    }
}

impl<D: BrowserDriver> fmt::Debug for Scenario<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("suite", &self.suite)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

macro_rules! catalogue {
    ($($suite:ident => [$($name:ident: $summary:literal),+ $(,)?]),+ $(,)?) => {
        /// Every scenario, in suite order
        #[must_use]
        pub fn catalogue<D: BrowserDriver>() -> Vec<Scenario<D>> {
            vec![$($(
                Scenario {
                    suite: stringify!($suite),
                    name: stringify!($name),
                    summary: $summary,
                    run: $suite::$name::<D>,
                },
            )+)+]
        }

        /// Names of the suites
        pub const SUITES: &[&str] = &[$(stringify!($suite)),+];
    };
}

catalogue! {
    auth => [
        login_screen_on_load: "login form is shown on first load",
        register_new_user: "a new account can be registered",
        login_existing_user: "a registered account can log in",
        invalid_credentials_error: "wrong credentials are refused with an error",
        required_field_validation: "submitting an empty login form is blocked",
    ],
    profile => [
        navigate_to_profile: "the profile section opens",
        update_profile: "profile fields can be edited and saved",
        photo_upload_interface: "a photo upload control is offered",
        profile_fields_displayed: "profile form fields are present",
        invalid_age_rejected: "an out-of-range age is not saved",
    ],
    swipe => [
        navigate_to_swipe: "the swipe section opens",
        cards_displayed: "a card or the end of the deck is shown",
        like_action: "liking a card advances the deck",
        pass_action: "passing a card advances the deck",
        drag_gesture: "cards respond to a pointer drag",
        match_notification: "a mutual like shows a match notice",
        end_of_deck: "swiping through the deck reaches its end",
    ],
    messaging => [
        navigate_to_messages: "the messages section opens",
        conversation_list: "conversations or an empty state are listed",
        open_conversation: "a conversation opens with a message box",
        send_message: "a sent message appears in the conversation",
        message_history: "an open conversation shows its history",
        realtime_update: "a new message shows without reloading",
        empty_message_rejected: "an empty message is never sent",
        typing_indicator: "typing shows an indicator",
    ],
    ui => [
        main_navigation: "the main navigation shows every tab",
        responsive_layout: "the layout follows the viewport width",
        theme_toggle: "the theme toggle changes the background",
        loading_state: "a loading state is shown while content loads",
        offline_error_state: "losing the network is reported",
        accessible_buttons: "every button has an accessible name",
        section_navigation: "every section is reachable from the navigation",
        form_validation: "an invalid email is flagged",
        branding: "the application branding is visible",
        back_navigation: "browser back returns to the previous section",
    ],
}

/// Scenarios selected by any of `filters`; all when `filters` is empty
#[must_use]
pub fn select<D: BrowserDriver>(filters: &[String]) -> Vec<Scenario<D>> {
    catalogue()
        .into_iter()
        .filter(|s| filters.is_empty() || filters.iter().any(|f| s.matches(f)))
        .collect()
}
