//! Logical UI elements and their locator candidates.
//!
//! Every element the scenarios touch is named here once, together with the
//! ordered selectors that may find it: a stable `data-testid` first, then
//! attribute and text based fallbacks for builds without test ids. The table
//! is built at startup, optionally patched from configuration, and read-only
//! afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::locator::{CandidateSet, Selector};
use crate::result::{HarnessError, HarnessResult};

macro_rules! elements {
    ($($variant:ident => $name:literal: [$($sel:expr),+ $(,)?]),+ $(,)?) => {
        /// A named capability of the application's UI
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Element {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl Element {
            /// Every element, in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stable snake_case name, used in errors and config overrides
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }

            /// Built-in candidates, most specific first
            #[must_use]
            pub fn default_candidates(self) -> &'static [&'static str] {
                match self {
                    $(Self::$variant => &[$($sel),+]),+
                }
            }
        }
    };
}

elements! {
    // authentication
    LoginEmail => "login_email": ["testid=login-email", "input[type=\"email\"]"],
    LoginPassword => "login_password": ["testid=login-password", "input[type=\"password\"]"],
    LoginButton => "login_button": [
        "testid=login-button",
        "button:has-text(\"Login\")",
        "button:has-text(\"Log In\")",
        "button[type=\"submit\"]",
    ],
    LoginLink => "login_link": [
        "testid=login-link",
        "a:has-text(\"Login\")",
        "a:has-text(\"Log In\")",
        "button:has-text(\"Back to Login\")",
    ],
    RegisterLink => "register_link": [
        "testid=register-link",
        "a:has-text(\"Register\")",
        "a:has-text(\"Sign Up\")",
        "button:has-text(\"Create Account\")",
    ],
    RegisterEmail => "register_email": ["testid=email-input", "input[type=\"email\"]"],
    RegisterPassword => "register_password": ["testid=password-input", "input[type=\"password\"]"],
    FirstNameInput => "first_name_input": [
        "testid=firstName-input",
        "input[name*=\"firstName\"]",
        "input[placeholder*=\"First\"]",
    ],
    LastNameInput => "last_name_input": [
        "testid=lastName-input",
        "input[name*=\"lastName\"]",
        "input[placeholder*=\"Last\"]",
    ],
    RegisterButton => "register_button": [
        "testid=register-button",
        "button:has-text(\"Register\")",
        "button:has-text(\"Sign Up\")",
        "button[type=\"submit\"]",
    ],
    MainNav => "main_nav": [
        "testid=main-nav",
        ".bottom-nav",
        ".tab-bar",
        ".bottom-navigation",
        ".nav-tabs",
    ],
    SuccessNotice => "success_notice": [
        "testid=success-message",
        "text=\"registered successfully\"",
        "text=\"Registration successful\"",
        "text=\"Welcome\"",
    ],
    ErrorNotice => "error_notice": [
        "testid=error-message",
        "text=\"Invalid\"",
        "text=\"credentials\"",
        ".alert-error",
        ".error",
    ],
    ValidationError => "validation_error": [
        "testid=validation-error",
        "text=\"required\"",
        "text=\"Required\"",
        ".validation-error",
        ".error",
    ],
    // navigation
    ProfileTab => "profile_tab": [
        "testid=profile-tab",
        "button:has-text(\"Profile\")",
        ".tab:has-text(\"Profile\")",
    ],
    SwipeTab => "swipe_tab": [
        "testid=swipe-tab",
        "button:has-text(\"Swipe\")",
        "button:has-text(\"Discover\")",
        "button:has-text(\"Cards\")",
        ".tab:has-text(\"Swipe\")",
    ],
    MessagesTab => "messages_tab": [
        "testid=messages-tab",
        "button:has-text(\"Messages\")",
        "button:has-text(\"Chat\")",
        ".tab:has-text(\"Messages\")",
    ],
    ProfileSection => "profile_section": [
        "testid=profile-screen",
        ".profile-form",
        ".profile-editor",
        "textarea[name*=\"bio\"]",
    ],
    SwipeSection => "swipe_section": [
        "testid=swipe-screen",
        ".card-stack",
        ".swipe-container",
        ".swipe-card",
    ],
    MessagesSection => "messages_section": [
        "testid=messages-screen",
        ".messages-list",
        ".chat-list",
        ".conversations",
    ],
    // profile
    BioInput => "bio_input": [
        "testid=bio-input",
        "textarea[name*=\"bio\"]",
        "placeholder=bio",
        "textarea",
    ],
    AgeInput => "age_input": [
        "testid=age-input",
        "input[name*=\"age\"]",
        "placeholder=age",
        "input[type=\"number\"]",
    ],
    CityInput => "city_input": [
        "testid=city-input",
        "input[name*=\"city\"]",
        "placeholder=city",
        "placeholder=location",
    ],
    OccupationInput => "occupation_input": [
        "testid=occupation-input",
        "input[name*=\"occupation\"]",
        "placeholder=occupation",
        "placeholder=job",
    ],
    InterestsInput => "interests_input": [
        "testid=interests-input",
        "input[name*=\"interests\"]",
        "placeholder=interest",
    ],
    SaveProfileButton => "save_profile_button": [
        "testid=save-profile-button",
        "button:has-text(\"Save\")",
        "button:has-text(\"Update\")",
    ],
    SaveConfirmation => "save_confirmation": [
        "testid=profile-saved",
        "text=\"saved successfully\"",
        "text=\"updated successfully\"",
        "text=\"Profile updated\"",
    ],
    PhotoUpload => "photo_upload": [
        "testid=photo-upload",
        "input[type=\"file\"]",
        "button:has-text(\"Upload\")",
        "button:has-text(\"Photo\")",
    ],
    ProfileFieldLabel => "profile_field_label": [
        "label",
        "text=\"Bio\"",
        "text=\"Age\"",
    ],
    // swipe
    SwipeCard => "swipe_card": [
        "testid=swipe-card",
        ".swipe-card",
        ".profile-card",
        ".card",
    ],
    LikeButton => "like_button": [
        "testid=like-button",
        ".like-button",
        "button:has-text(\"Like\")",
        "button:has-text(\"♥\")",
        "button:has-text(\"❤\")",
    ],
    PassButton => "pass_button": [
        "testid=pass-button",
        ".pass-button",
        "button:has-text(\"Pass\")",
        "button:has-text(\"Nope\")",
        "button:has-text(\"✕\")",
    ],
    MatchNotice => "match_notice": [
        "testid=match-notification",
        ".match-modal",
        ".match-notification",
        "text=\"It's a match\"",
        "text=\"Match!\"",
    ],
    MatchDismiss => "match_dismiss": [
        "testid=match-dismiss",
        ".match-modal button",
        "button:has-text(\"Keep Swiping\")",
        "button:has-text(\"Close\")",
        "button:has-text(\"Continue\")",
    ],
    EndOfDeck => "end_of_deck": [
        "testid=no-more-profiles",
        "text=\"No more profiles\"",
        "text=\"No more cards\"",
        "text=\"Come back later\"",
    ],
    // messaging
    ConversationItem => "conversation_item": [
        "testid=conversation-item",
        ".conversation-item",
        ".match-item",
        ".chat-preview",
    ],
    EmptyConversations => "empty_conversations": [
        "testid=no-conversations",
        "text=\"No matches yet\"",
        "text=\"No conversations\"",
    ],
    MessageInput => "message_input": [
        "testid=message-input",
        "placeholder=message",
        ".message-input input",
        ".message-input textarea",
    ],
    SendButton => "send_button": [
        "testid=send-message-button",
        "testid=send-button",
        ".send-button",
        "button:has-text(\"Send\")",
    ],
    MessageBubble => "message_bubble": [
        "testid=message-bubble",
        ".message-bubble",
        ".message",
    ],
    MessageHistory => "message_history": [
        "testid=message-history",
        ".message-history",
        ".chat-messages",
        ".messages-container",
    ],
    EmptyHistory => "empty_history": [
        "testid=no-messages",
        "text=\"No messages\"",
        "text=\"Say hello\"",
        "text=\"Start the conversation\"",
    ],
    TypingIndicator => "typing_indicator": [
        "testid=typing-indicator",
        ".typing-indicator",
        "text=\"typing\"",
    ],
    // general UI
    ThemeToggle => "theme_toggle": [
        "testid=theme-toggle",
        ".theme-toggle",
        "button:has-text(\"Dark\")",
        "button:has-text(\"Light\")",
    ],
    LoadingIndicator => "loading_indicator": [
        "testid=loading",
        ".loading",
        ".spinner",
        "text=\"Loading\"",
    ],
    OfflineNotice => "offline_notice": [
        "testid=offline-banner",
        ".offline-banner",
        ".error-message",
        "text=\"offline\"",
        "text=\"connection\"",
    ],
    AppContainer => "app_container": ["#root", ".app-container", ".app", "body"],
    Branding => "branding": [
        "testid=app-logo",
        ".logo",
        ".app-title",
        "img[alt*=\"logo\"]",
        "h1",
    ],
    Heading => "heading": ["h1, h2, h3, h4, h5, h6"],
    Button => "button": ["button"],
    EmailField => "email_field": ["input[type=\"email\"]"],
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Element {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.name() == s)
            .ok_or_else(|| HarnessError::config(format!("unknown element name: {s}")))
    }
}

/// Element to candidate-set mapping.
///
/// Complete by construction: every [`Element`] has a set.
#[derive(Debug, Clone)]
pub struct LocatorTable {
    sets: BTreeMap<Element, CandidateSet>,
}

impl LocatorTable {
    /// Table of built-in candidates
    pub fn defaults() -> HarnessResult<Self> {
        let sets = Element::ALL
            .iter()
            .map(|&e| Ok((e, CandidateSet::parse(e.name(), e.default_candidates())?)))
            .collect::<HarnessResult<_>>()?;
        Ok(Self { sets })
    }

    /// Built-in candidates with per-element replacements
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> HarnessResult<Self> {
        let mut table = Self::defaults()?;
        for (name, raw) in overrides {
            let element: Element = name.parse()?;
            let set = CandidateSet::parse(element.name(), raw)?;
            debug!(element = element.name(), candidates = %set, "locator override");
            table.sets.insert(element, set);
        }
        Ok(table)
    }

    /// Candidates for an element
    #[must_use]
    pub fn get(&self, element: Element) -> &CandidateSet {
        &self.sets[&element]
    }

    /// Candidates for an element narrowed to those containing `text`
    #[must_use]
    pub fn containing_text(&self, element: Element, text: &str) -> CandidateSet {
        self.get(element).containing_text(text)
    }

    /// The first candidate of an element, for display
    #[must_use]
    pub fn primary(&self, element: Element) -> &Selector {
        &self.get(element).selectors()[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_element() {
        let table = LocatorTable::defaults().unwrap();
        for &e in Element::ALL {
            assert!(!table.get(e).is_empty(), "{e} has no candidates");
        }
    }

    #[test]
    fn test_test_id_comes_first_where_present() {
        let table = LocatorTable::defaults().unwrap();
        assert_eq!(
            table.primary(Element::LikeButton),
            &Selector::test_id("like-button")
        );
        assert_eq!(
            table.primary(Element::SendButton),
            &Selector::test_id("send-message-button")
        );
    }

    #[test]
    fn test_names_unique_and_parse_back() {
        let mut names: Vec<_> = Element::ALL.iter().map(|e| e.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Element::ALL.len());
        for &e in Element::ALL {
            assert_eq!(e.name().parse::<Element>().unwrap(), e);
        }
    }

    #[test]
    fn test_override_replaces_candidates() {
        let mut overrides = BTreeMap::new();
        overrides.insert("like_button".to_string(), vec!["button.heart".to_string()]);
        let table = LocatorTable::with_overrides(&overrides).unwrap();
        assert_eq!(table.get(Element::LikeButton).selectors(), &[Selector::css("button.heart")]);
        assert_eq!(
            table.primary(Element::PassButton),
            &Selector::test_id("pass-button")
        );
    }

    #[test]
    fn test_override_errors() {
        let mut unknown = BTreeMap::new();
        unknown.insert("superlike_button".to_string(), vec!["x".to_string()]);
        assert!(matches!(
            LocatorTable::with_overrides(&unknown),
            Err(HarnessError::Config { .. })
        ));

        let mut empty = BTreeMap::new();
        empty.insert("like_button".to_string(), Vec::new());
        assert!(matches!(
            LocatorTable::with_overrides(&empty),
            Err(HarnessError::EmptyCandidateSet { .. })
        ));
    }
}
