//! Page Facade
//!
//! [`DatingAppPage`] exposes the dating client as domain operations
//! (authenticate, navigate to a section, edit the profile, swipe, send a
//! message) built on locator resolution and predicate waits. Scenarios never
//! see selectors; they ask domain questions and get domain answers.
//!
//! Operations whose effect may legitimately not happen return `Ok(false)` (or
//! an outcome value) so the caller decides whether that is a failure. Errors
//! are reserved for elements that never appeared and broken sessions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::driver::{BrowserDriver, ElementHandle, Viewport};
use crate::elements::{Element, LocatorTable};
use crate::fixture::{ProfileUpdate, TestUser};
use crate::locator::{CandidateSet, LocatorResolver, Point, Selector};
use crate::result::{HarnessError, HarnessResult};
use crate::wait::{await_condition, poll_until, WaitOptions, WaitOutcome};

/// Script reading the computed page background, used to observe theme changes
pub const BODY_BACKGROUND_JS: &str = "getComputedStyle(document.body).backgroundColor";

/// Selector matching email inputs that fail native constraint validation
pub const INVALID_EMAIL_SELECTOR: &str = "input[type=\"email\"]:invalid";

/// Minimum horizontal travel of a drag swipe, in CSS pixels
const DRAG_DISTANCE: f32 = 200.0;

/// Intermediate pointer moves per drag
const DRAG_STEPS: u16 = 5;

/// Names typed into registration forms that ask for them
const DEFAULT_NAMES: (&str, &str) = ("Test", "User");

/// How to authenticate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthMode {
    /// Create a new account
    Register,
    /// Sign in to an existing account
    Login,
}

/// Top-level areas of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    /// Profile editor
    Profile,
    /// Card deck
    Swipe,
    /// Conversations
    Messages,
}

impl Section {
    /// Every section
    pub const ALL: [Self; 3] = [Self::Profile, Self::Swipe, Self::Messages];

    /// Navigation control leading to the section
    #[must_use]
    pub const fn tab(self) -> Element {
        match self {
            Self::Profile => Element::ProfileTab,
            Self::Swipe => Element::SwipeTab,
            Self::Messages => Element::MessagesTab,
        }
    }

    /// Element whose visibility means the section is showing
    #[must_use]
    pub const fn marker(self) -> Element {
        match self {
            Self::Profile => Element::ProfileSection,
            Self::Swipe => Element::SwipeSection,
            Self::Messages => Element::MessagesSection,
        }
    }

    /// Route segment
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Swipe => "swipe",
            Self::Messages => "messages",
        }
    }

    /// Section for a route segment
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.path() == path)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Swipe decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwipeDirection {
    /// Swipe right
    Like,
    /// Swipe left
    Pass,
}

impl SwipeDirection {
    /// Explicit action button for the direction
    #[must_use]
    pub const fn button(self) -> Element {
        match self {
            Self::Like => Element::LikeButton,
            Self::Pass => Element::PassButton,
        }
    }

    /// Horizontal drag sign
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Like => 1.0,
            Self::Pass => -1.0,
        }
    }
}

/// How a swipe was performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwipeStrategy {
    /// Clicked the like/pass button
    Button,
    /// Dragged the card with the pointer
    Drag,
}

/// What a swipe did to the deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeOutcome {
    /// How the swipe was performed
    pub strategy: SwipeStrategy,
    /// Card shown before the swipe
    pub before: String,
    /// Card shown afterwards, if any
    pub after: Option<String>,
    /// A match notice appeared
    pub matched: bool,
    /// The top card is no longer the one swiped
    pub card_changed: bool,
    /// The end-of-deck state is showing
    pub deck_exhausted: bool,
}

impl SwipeOutcome {
    /// The deck moved on: a new card or the end of the deck
    #[must_use]
    pub const fn advanced(&self) -> bool {
        self.card_changed || self.deck_exhausted
    }
}

/// Visible buttons and those lacking an accessible name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonAudit {
    /// Visible buttons
    pub total: usize,
    /// Handle ids of buttons with neither text nor `aria-label`
    pub unnamed: Vec<String>,
}

fn card_identity_of(card: &ElementHandle) -> String {
    let text = card.text();
    if text.is_empty() {
        card.id.clone()
    } else {
        text.to_string()
    }
}

fn script_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Semantic facade over one browser session.
///
/// Owns the driver for the lifetime of a scenario.
#[derive(Debug)]
pub struct DatingAppPage<D: BrowserDriver> {
    driver: D,
    locators: Arc<LocatorTable>,
    config: Arc<HarnessConfig>,
}

impl<D: BrowserDriver> DatingAppPage<D> {
    /// Wrap a driver
    pub fn new(driver: D, locators: Arc<LocatorTable>, config: Arc<HarnessConfig>) -> Self {
        Self {
            driver,
            locators,
            config,
        }
    }

    /// Underlying driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Underlying driver, mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give the driver back
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Run configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Locator table
    pub fn locators(&self) -> &LocatorTable {
        &self.locators
    }

    fn resolver(&self) -> LocatorResolver<'_, D> {
        LocatorResolver::new(&self.driver, self.config.timeouts.poll_interval())
    }

    fn candidates(&self, element: Element) -> &CandidateSet {
        self.locators.get(element)
    }

    fn action_wait(&self) -> WaitOptions {
        self.config.timeouts.action_wait()
    }

    // =========================================================================
    // Element access
    // =========================================================================

    /// Resolve an element, waiting up to the element timeout
    pub async fn find(&self, element: Element) -> HarnessResult<ElementHandle> {
        self.resolver()
            .resolve(
                element.name(),
                self.candidates(element),
                self.config.timeouts.element(),
            )
            .await
    }

    /// Resolve an element if it appears within `timeout`
    pub async fn wait_for(
        &self,
        element: Element,
        timeout: Duration,
    ) -> HarnessResult<Option<ElementHandle>> {
        self.resolver()
            .probe(self.candidates(element), timeout)
            .await
    }

    /// Look for an optional element, waiting up to the probe timeout
    pub async fn probe(&self, element: Element) -> HarnessResult<Option<ElementHandle>> {
        self.wait_for(element, self.config.timeouts.probe()).await
    }

    /// Whether an element shows within `timeout`
    pub async fn wait_visible(&self, element: Element, timeout: Duration) -> HarnessResult<bool> {
        Ok(self.wait_for(element, timeout).await?.is_some())
    }

    /// Whether an element is showing right now
    pub async fn is_visible(&self, element: Element) -> HarnessResult<bool> {
        self.resolver().is_visible(self.candidates(element)).await
    }

    /// All matches (visible or not) of the element's first matching candidate
    pub async fn all(&self, element: Element) -> HarnessResult<Vec<ElementHandle>> {
        self.resolver().all(self.candidates(element)).await
    }

    /// Number of matches of the element's first matching candidate
    pub async fn count(&self, element: Element) -> HarnessResult<usize> {
        self.resolver().count(self.candidates(element)).await
    }

    /// Resolve and click
    pub async fn click(&self, element: Element) -> HarnessResult<()> {
        let handle = self.find(element).await?;
        debug!(element = element.name(), "click");
        self.driver.click(&handle).await
    }

    /// Resolve and replace a form value
    pub async fn fill(&self, element: Element, value: &str) -> HarnessResult<()> {
        let handle = self.find(element).await?;
        debug!(element = element.name(), "fill");
        self.driver.fill(&handle, value).await
    }

    /// Current value of a form control
    pub async fn read_input(&self, element: Element) -> HarnessResult<Option<String>> {
        Ok(self.find(element).await?.value)
    }

    /// First of `elements` to become visible within `timeout`
    pub async fn wait_any(
        &self,
        elements: &[Element],
        timeout: Duration,
    ) -> HarnessResult<Option<Element>> {
        let resolver = self.resolver();
        let options = self.action_wait().with_timeout(timeout.as_millis() as u64);
        let outcome = poll_until(&options, || {
            let resolver = &resolver;
            async move {
                for &element in elements {
                    if resolver
                        .resolve_once(self.candidates(element))
                        .await?
                        .is_some()
                    {
                        return Ok(Some(element));
                    }
                }
                Ok(None)
            }
        })
        .await;
        match outcome {
            WaitOutcome::Satisfied { value, .. } => Ok(Some(value)),
            WaitOutcome::TimedOut { .. } => Ok(None),
            WaitOutcome::PredicateErrored { error, .. } => Err(error),
        }
    }

    /// Wait until an element is no longer showing
    async fn wait_gone(&self, element: Element) -> HarnessResult<bool> {
        let resolver = &self.resolver();
        let candidates = self.candidates(element);
        let outcome = await_condition(&self.action_wait(), || async move {
            Ok(!resolver.is_visible(candidates).await?)
        })
        .await;
        match outcome {
            WaitOutcome::PredicateErrored { error, .. } => Err(error),
            other => Ok(other.is_satisfied()),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Open the application's start page
    pub async fn goto(&mut self) -> HarnessResult<()> {
        self.goto_path("").await
    }

    /// Open a path under the base URL
    pub async fn goto_path(&mut self, path: &str) -> HarnessResult<()> {
        let url = self.config.url_for(path);
        info!(%url, "navigate");
        self.driver.navigate(&url).await
    }

    /// Show a section; does nothing when it is already showing
    pub async fn navigate_to_section(&self, section: Section) -> HarnessResult<()> {
        if self.is_visible(section.marker()).await? {
            debug!(%section, "already in section");
            return Ok(());
        }
        self.click(section.tab()).await?;
        let timeout = self.config.timeouts.action();
        if self.wait_visible(section.marker(), timeout).await? {
            info!(%section, "section shown");
            Ok(())
        } else {
            Err(HarnessError::ActionTimeout {
                action: format!("{section} section to appear"),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }

    /// Reload the current document
    pub async fn reload(&mut self) -> HarnessResult<()> {
        self.driver.reload().await
    }

    /// Go back in history
    pub async fn go_back(&mut self) -> HarnessResult<()> {
        self.driver.go_back().await
    }

    /// Document title
    pub async fn title(&self) -> HarnessResult<String> {
        self.driver.title().await
    }

    /// Current URL
    pub async fn current_url(&self) -> HarnessResult<String> {
        self.driver.current_url().await
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Register or log in; true when the main app (or a success notice) shows
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        mode: AuthMode,
    ) -> HarnessResult<bool> {
        match mode {
            AuthMode::Register => self.submit_registration(email, password, DEFAULT_NAMES).await,
            AuthMode::Login => self.submit_login(email, password).await,
        }
    }

    /// Register a fixture user, filling name fields when the form has them
    pub async fn register_user(&self, user: &TestUser) -> HarnessResult<bool> {
        self.submit_registration(
            &user.email,
            &user.password,
            (user.first_name.as_str(), user.last_name.as_str()),
        )
        .await
    }

    /// Log a fixture user in
    pub async fn login_user(&self, user: &TestUser) -> HarnessResult<bool> {
        self.submit_login(&user.email, &user.password).await
    }

    /// Get a fixture user into the main app: register, falling back to login
    pub async fn ensure_signed_in(&self, user: &TestUser) -> HarnessResult<()> {
        if self.register_user(user).await? {
            return Ok(());
        }
        warn!(email = %user.email, "registration did not reach the app, trying login");
        if self.login_user(user).await? {
            return Ok(());
        }
        Err(HarnessError::assertion(format!(
            "could not sign in as {}",
            user.email
        )))
    }

    async fn submit_registration(
        &self,
        email: &str,
        password: &str,
        (first_name, last_name): (&str, &str),
    ) -> HarnessResult<bool> {
        info!(%email, "register");
        if let Some(link) = self.probe(Element::RegisterLink).await? {
            self.driver.click(&link).await?;
        }
        self.fill(Element::RegisterEmail, email).await?;
        self.fill(Element::RegisterPassword, password).await?;
        for (element, value) in [
            (Element::FirstNameInput, first_name),
            (Element::LastNameInput, last_name),
        ] {
            match self.probe(element).await? {
                Some(input) => self.driver.fill(&input, value).await?,
                None => debug!(element = element.name(), "optional field absent"),
            }
        }
        self.click(Element::RegisterButton).await?;

        let reached = self
            .wait_any(
                &[
                    Element::MainNav,
                    Element::SuccessNotice,
                    Element::ErrorNotice,
                    Element::ValidationError,
                ],
                self.config.timeouts.action(),
            )
            .await?;
        debug!(?reached, "registration settled");
        Ok(matches!(
            reached,
            Some(Element::MainNav | Element::SuccessNotice)
        ))
    }

    async fn submit_login(&self, email: &str, password: &str) -> HarnessResult<bool> {
        info!(%email, "login");
        if self.is_visible(Element::LoginLink).await? {
            self.click(Element::LoginLink).await?;
        }
        self.fill(Element::LoginEmail, email).await?;
        self.fill(Element::LoginPassword, password).await?;
        self.click(Element::LoginButton).await?;

        let reached = self
            .wait_any(
                &[
                    Element::MainNav,
                    Element::ErrorNotice,
                    Element::ValidationError,
                ],
                self.config.timeouts.action(),
            )
            .await?;
        debug!(?reached, "login settled");
        Ok(reached == Some(Element::MainNav))
    }

    /// Whether the main app navigation is showing
    pub async fn is_logged_in(&self) -> HarnessResult<bool> {
        self.wait_visible(Element::MainNav, self.config.timeouts.probe())
            .await
    }

    /// Whether an error notice appears
    pub async fn has_error_notice(&self) -> HarnessResult<bool> {
        self.wait_visible(Element::ErrorNotice, self.config.timeouts.action())
            .await
    }

    /// Whether a validation message appears
    pub async fn has_validation_error(&self) -> HarnessResult<bool> {
        self.wait_visible(Element::ValidationError, self.config.timeouts.action())
            .await
    }

    /// Whether every email input passes native validation
    pub async fn email_input_valid(&self) -> HarnessResult<bool> {
        let invalid = self
            .driver
            .query_all(&Selector::css(INVALID_EMAIL_SELECTOR))
            .await?;
        Ok(invalid.is_empty())
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Fill the fields present in `update`, save, and wait for confirmation.
    ///
    /// A requested field that cannot be found is an error; fields left `None`
    /// are never touched.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> HarnessResult<bool> {
        self.navigate_to_section(Section::Profile).await?;
        let interests = update.interests.as_ref().map(|i| i.join(", "));
        let fields = [
            (Element::BioInput, update.bio.as_deref()),
            (Element::AgeInput, update.age.as_deref()),
            (Element::CityInput, update.city.as_deref()),
            (Element::OccupationInput, update.occupation.as_deref()),
            (Element::InterestsInput, interests.as_deref()),
        ];
        for (element, value) in fields {
            if let Some(value) = value {
                self.fill(element, value).await?;
            }
        }
        self.click(Element::SaveProfileButton).await?;

        let reached = self
            .wait_any(
                &[
                    Element::SaveConfirmation,
                    Element::ValidationError,
                    Element::ErrorNotice,
                ],
                self.config.timeouts.action(),
            )
            .await?;
        info!(?reached, "profile save settled");
        Ok(reached == Some(Element::SaveConfirmation))
    }

    /// Whether a photo upload control exists (file inputs are often hidden)
    pub async fn has_photo_upload(&self) -> HarnessResult<bool> {
        Ok(self.count(Element::PhotoUpload).await? > 0)
    }

    /// Texts of the profile field labels
    pub async fn profile_field_labels(&self) -> HarnessResult<Vec<String>> {
        Ok(self
            .all(Element::ProfileFieldLabel)
            .await?
            .iter()
            .filter(|l| l.visible)
            .map(|l| l.text().to_string())
            .filter(|t| !t.is_empty())
            .collect())
    }

    // =========================================================================
    // Swipe
    // =========================================================================

    /// Identity (text) of the top card, if one is showing
    pub async fn card_identity(&self) -> HarnessResult<Option<String>> {
        Ok(self
            .resolver()
            .resolve_once(self.candidates(Element::SwipeCard))
            .await?
            .map(|card| card_identity_of(&card)))
    }

    /// Whether the end-of-deck state is showing
    pub async fn deck_exhausted(&self) -> HarnessResult<bool> {
        self.wait_visible(Element::EndOfDeck, self.config.timeouts.probe())
            .await
    }

    /// Like or pass the top card.
    ///
    /// Uses the action button when one is present and enabled, otherwise drags
    /// the card across its own width. A match notice is dismissed when it has
    /// a dismiss control.
    pub async fn swipe(&self, direction: SwipeDirection) -> HarnessResult<SwipeOutcome> {
        self.swipe_with(direction, true).await
    }

    /// Swipe by dragging the card even when action buttons exist
    pub async fn drag_swipe(&self, direction: SwipeDirection) -> HarnessResult<SwipeOutcome> {
        self.swipe_with(direction, false).await
    }

    async fn swipe_with(
        &self,
        direction: SwipeDirection,
        allow_button: bool,
    ) -> HarnessResult<SwipeOutcome> {
        let card = self.find(Element::SwipeCard).await?;
        let before = card_identity_of(&card);

        let button = if allow_button {
            self.probe(direction.button()).await?
        } else {
            None
        };
        let strategy = match button {
            Some(button) if button.enabled => {
                self.driver.click(&button).await?;
                SwipeStrategy::Button
            }
            _ => {
                self.drag_card(&card, direction).await?;
                SwipeStrategy::Drag
            }
        };
        info!(?direction, ?strategy, card = %before, "swipe");

        let resolver = &self.resolver();
        let card_set = self.candidates(Element::SwipeCard);
        let match_set = self.candidates(Element::MatchNotice);
        let swiped = before.as_str();
        let settled = poll_until(&self.action_wait(), || async move {
            let current = resolver.resolve_once(card_set).await?;
            if current.map(|c| card_identity_of(&c)).as_deref() != Some(swiped) {
                return Ok(Some(()));
            }
            Ok(resolver.resolve_once(match_set).await?.map(|_| ()))
        })
        .await;
        match settled {
            WaitOutcome::PredicateErrored { error, .. } => return Err(error),
            WaitOutcome::TimedOut { elapsed, .. } => {
                warn!(card = %before, elapsed_ms = elapsed.as_millis() as u64, "deck did not react to swipe");
            }
            WaitOutcome::Satisfied { .. } => {}
        }

        // the card can leave before the match response arrives
        let matched = self
            .wait_visible(Element::MatchNotice, self.config.timeouts.probe())
            .await?;
        if matched {
            info!("match notice shown");
            self.dismiss_match().await?;
        }

        let after = self.card_identity().await?;
        let deck_exhausted = after.is_none() && self.deck_exhausted().await?;
        let card_changed = after.as_deref() != Some(before.as_str());
        Ok(SwipeOutcome {
            strategy,
            before,
            after,
            matched,
            card_changed,
            deck_exhausted,
        })
    }

    async fn drag_card(&self, card: &ElementHandle, direction: SwipeDirection) -> HarnessResult<()> {
        let bbox = card.bounding_box.ok_or_else(|| HarnessError::Input {
            message: "swipe card has no layout box to drag".to_string(),
        })?;
        let start = bbox.center();
        let distance = bbox.width.max(DRAG_DISTANCE) * direction.sign();
        debug!(?start, distance, "drag card");

        self.driver.pointer_move(start).await?;
        self.driver.pointer_down(start).await?;
        for step in 1..=DRAG_STEPS {
            let t = f32::from(step) / f32::from(DRAG_STEPS);
            self.driver
                .pointer_move(Point::new(start.x + distance * t, start.y))
                .await?;
        }
        self.driver
            .pointer_up(Point::new(start.x + distance, start.y))
            .await
    }

    /// Close the match notice if it has a dismiss control
    pub async fn dismiss_match(&self) -> HarnessResult<bool> {
        let Some(button) = self.probe(Element::MatchDismiss).await? else {
            debug!("match notice has no dismiss control");
            return Ok(false);
        };
        self.driver.click(&button).await?;
        self.wait_gone(Element::MatchNotice).await
    }

    // =========================================================================
    // Messaging
    // =========================================================================

    /// Open the first conversation; false when the list is empty
    pub async fn open_first_conversation(&self) -> HarnessResult<bool> {
        let listed = self
            .wait_any(
                &[Element::ConversationItem, Element::EmptyConversations],
                self.config.timeouts.element(),
            )
            .await?;
        if listed != Some(Element::ConversationItem) {
            return Ok(false);
        }
        self.click(Element::ConversationItem).await?;
        self.wait_visible(Element::MessageInput, self.config.timeouts.action())
            .await
    }

    /// Type and send a message in the open conversation.
    ///
    /// Fails closed: a disabled send control is never clicked and yields
    /// false. Success means a new message containing `text` appeared.
    pub async fn send_message(&self, text: &str) -> HarnessResult<bool> {
        let input = self.find(Element::MessageInput).await?;
        self.driver.fill(&input, text).await?;

        let resolver = &self.resolver();
        let sent = &self.locators.containing_text(Element::MessageBubble, text);
        let before = resolver.count(sent).await?;

        let send = self.find(Element::SendButton).await?;
        if !send.enabled {
            warn!("send control disabled, message not sent");
            return Ok(false);
        }
        self.driver.click(&send).await?;

        let outcome = await_condition(&self.action_wait(), || async move {
            Ok(resolver.count(sent).await? > before)
        })
        .await;
        match outcome {
            WaitOutcome::Satisfied { .. } => Ok(true),
            WaitOutcome::TimedOut { .. } => {
                warn!(before, "sent message never appeared");
                Ok(false)
            }
            WaitOutcome::PredicateErrored { error, .. } => Err(error),
        }
    }

    /// Type into the message box without sending
    pub async fn type_without_sending(&self, text: &str) -> HarnessResult<()> {
        self.fill(Element::MessageInput, text).await
    }

    /// Text of the newest message bubble
    pub async fn last_message(&self) -> HarnessResult<Option<String>> {
        Ok(self
            .all(Element::MessageBubble)
            .await?
            .last()
            .map(|m| m.text().to_string()))
    }

    /// Number of message bubbles
    pub async fn message_count(&self) -> HarnessResult<usize> {
        self.count(Element::MessageBubble).await
    }

    /// Whether a typing indicator shows
    pub async fn typing_indicator_visible(&self) -> HarnessResult<bool> {
        self.wait_visible(Element::TypingIndicator, self.config.timeouts.probe())
            .await
    }

    // =========================================================================
    // General UI
    // =========================================================================

    async fn background(&self) -> HarnessResult<String> {
        Ok(script_text(self.driver.evaluate(BODY_BACKGROUND_JS).await?))
    }

    /// Click the theme toggle; the page background before and after.
    ///
    /// `None` when the application has no toggle.
    pub async fn toggle_theme(&self) -> HarnessResult<Option<(String, String)>> {
        let Some(toggle) = self.probe(Element::ThemeToggle).await? else {
            return Ok(None);
        };
        let before = self.background().await?;
        self.driver.click(&toggle).await?;
        let previous = before.as_str();
        let outcome = await_condition(&self.action_wait(), || async move {
            Ok(self.background().await? != previous)
        })
        .await;
        if let WaitOutcome::PredicateErrored { error, .. } = outcome {
            return Err(error);
        }
        let after = self.background().await?;
        Ok(Some((before, after)))
    }

    /// Resize the viewport
    pub async fn set_viewport(&mut self, viewport: Viewport) -> HarnessResult<()> {
        self.driver.set_viewport(viewport).await
    }

    /// Rendered width of the application container
    pub async fn layout_width(&self) -> HarnessResult<Option<f32>> {
        Ok(self
            .find(Element::AppContainer)
            .await?
            .bounding_box
            .map(|b| b.width))
    }

    /// Block all requests
    pub async fn go_offline(&mut self) -> HarnessResult<()> {
        self.driver.block_requests(&["*".to_string()]).await
    }

    /// Lift request blocking
    pub async fn go_online(&mut self) -> HarnessResult<()> {
        self.driver.unblock_requests().await
    }

    /// Visible buttons and those without an accessible name
    pub async fn button_accessibility(&self) -> HarnessResult<ButtonAudit> {
        let buttons: Vec<ElementHandle> = self
            .all(Element::Button)
            .await?
            .into_iter()
            .filter(|b| b.visible)
            .collect();
        Ok(ButtonAudit {
            total: buttons.len(),
            unnamed: buttons
                .iter()
                .filter(|b| b.accessible_name().is_none())
                .map(|b| b.id.clone())
                .collect(),
        })
    }

    /// Number of headings
    pub async fn heading_count(&self) -> HarnessResult<usize> {
        self.count(Element::Heading).await
    }

    /// PNG screenshot
    pub async fn screenshot(&self) -> HarnessResult<Vec<u8>> {
        self.driver.screenshot().await
    }

    /// Close the session
    pub async fn close(&mut self) -> HarnessResult<()> {
        self.driver.close().await
    }
}
