//! A fake dating application rendered into a [`MockPage`].
//!
//! Enough of the real client to run every scenario: login and registration
//! with validation, three tabbed sections, a card deck that produces a match
//! on the second like, one pre-existing conversation, a theme toggle and an
//! offline banner when requests are blocked.

use std::collections::HashMap;

use super::{MockBehavior, MockDriver, MockElement, MockPage};
use crate::locator::Point;
use crate::page::{Section, BODY_BACKGROUND_JS};

const DECK: &[&str] = &["Alex, 27", "Sam, 31", "Jordan, 24", "Riley, 29", "Casey, 26"];

const LIGHT_BACKGROUND: &str = "rgb(255, 255, 255)";
const DARK_BACKGROUND: &str = "rgb(18, 18, 18)";

/// Horizontal travel that counts as a swipe
const DRAG_THRESHOLD: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Login,
    Register,
    Main,
}

#[derive(Debug, Clone)]
struct Conversation {
    name: String,
    messages: Vec<String>,
}

/// Behaviour of the fake dating application
#[derive(Debug, Clone)]
pub struct DemoApp {
    origin: String,
    swipe_buttons: bool,
    users: HashMap<String, String>,
    view: View,
    section: Section,
    form: HashMap<String, String>,
    error: Option<String>,
    validation: Option<String>,
    notice: Option<String>,
    profile_saved: bool,
    position: usize,
    likes: u32,
    pending_match: Option<String>,
    conversations: Vec<Conversation>,
    open: Option<usize>,
    dark: bool,
}

impl Default for DemoApp {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoApp {
    /// App with like/pass buttons on the card deck
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: String::new(),
            swipe_buttons: true,
            users: HashMap::new(),
            view: View::Login,
            section: Section::Swipe,
            form: HashMap::new(),
            error: None,
            validation: None,
            notice: None,
            profile_saved: false,
            position: 0,
            likes: 0,
            pending_match: None,
            conversations: vec![Conversation {
                name: "Taylor".to_string(),
                messages: vec!["Hey! How's your week going?".to_string()],
            }],
            open: None,
            dark: false,
        }
    }

    /// Remove the like/pass buttons so cards can only be dragged
    #[must_use]
    pub fn without_swipe_buttons(mut self) -> Self {
        self.swipe_buttons = false;
        self
    }

    /// Pre-register an account
    #[must_use]
    pub fn with_user(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(email.into(), password.into());
        self
    }

    fn field(&self, key: &str) -> &str {
        self.form.get(key).map_or("", String::as_str)
    }

    fn clear_messages(&mut self) {
        self.error = None;
        self.validation = None;
        self.notice = None;
        self.profile_saved = false;
    }

    fn route(&mut self, page: &mut MockPage, section: Section) {
        self.section = section;
        page.push_url(format!("{}/{}", self.origin, section.path()));
    }

    fn login(&mut self, page: &mut MockPage) {
        let email = self.field("login-email").to_string();
        let password = self.field("login-password").to_string();
        if email.is_empty() {
            self.validation = Some("Email is required".to_string());
        } else if password.is_empty() {
            self.validation = Some("Password is required".to_string());
        } else if self.users.get(&email) == Some(&password) {
            self.view = View::Main;
            self.route(page, Section::Swipe);
        } else {
            self.error = Some("Invalid email or password".to_string());
        }
    }

    fn register(&mut self, page: &mut MockPage) {
        let email = self.field("email-input").to_string();
        let password = self.field("password-input").to_string();
        if email.is_empty() || password.is_empty() {
            self.validation = Some("Email and password are required".to_string());
        } else if !email.contains('@') {
            self.validation = Some("Enter a valid email address".to_string());
        } else if password.len() < 8 {
            self.validation = Some("Password must be at least 8 characters".to_string());
        } else if self.users.contains_key(&email) {
            self.error = Some("Email already registered".to_string());
        } else {
            self.users.insert(email, password);
            self.view = View::Main;
            self.notice = Some("Registered successfully! Welcome".to_string());
            self.route(page, Section::Swipe);
        }
    }

    fn save_profile(&mut self) {
        let age = self.field("age-input").trim().to_string();
        let valid = age.is_empty() || age.parse::<u32>().is_ok_and(|a| (18..=100).contains(&a));
        if valid {
            self.profile_saved = true;
        } else {
            self.validation = Some("Age must be between 18 and 100".to_string());
        }
    }

    fn swipe(&mut self, like: bool) {
        let Some(&name) = DECK.get(self.position) else {
            return;
        };
        self.position += 1;
        if like {
            self.likes += 1;
            if self.likes == 2 {
                let first = name.split(',').next().unwrap_or(name).to_string();
                self.pending_match = Some(first.clone());
                self.conversations.push(Conversation {
                    name: first,
                    messages: Vec::new(),
                });
            }
        }
    }

    fn send(&mut self) {
        let draft = self.field("message-input").trim().to_string();
        if draft.is_empty() {
            return;
        }
        if let Some(conversation) = self.open.and_then(|i| self.conversations.get_mut(i)) {
            conversation.messages.push(draft);
            self.form.remove("message-input");
        }
    }

    fn card_box(page: &MockPage) -> (f32, f32, f32, f32) {
        let w = page.viewport.width as f32;
        (w / 2.0 - 150.0, 120.0, 300.0, 400.0)
    }

    fn input(&self, key: &str, tag: &str) -> MockElement {
        MockElement::new(key, tag)
            .test_id(key)
            .value(self.field(key))
    }

    fn render(&self, page: &mut MockPage) {
        let width = page.viewport.width as f32;
        let height = page.viewport.height as f32;
        page.title = "Dating App".to_string();
        page.scripts.insert(
            BODY_BACKGROUND_JS.to_string(),
            serde_json::Value::String(
                if self.dark {
                    DARK_BACKGROUND
                } else {
                    LIGHT_BACKGROUND
                }
                .to_string(),
            ),
        );

        let mut els = vec![
            MockElement::new("root", "div")
                .css("#root")
                .bbox(0.0, 0.0, width, height),
            MockElement::new("title", "h1")
                .css(".app-title")
                .text("Dating App"),
            MockElement::new("theme-toggle", "button")
                .test_id("theme-toggle")
                .css(".theme-toggle")
                .text(if self.dark { "Light" } else { "Dark" })
                .aria_label("Toggle theme"),
        ];

        if page.is_offline() {
            els.truncate(1);
            els.push(
                MockElement::new("offline", "div")
                    .test_id("offline-banner")
                    .css(".offline-banner")
                    .text("You are offline. Check your connection."),
            );
            page.elements = els;
            return;
        }

        match self.view {
            View::Login => self.render_login(&mut els),
            View::Register => self.render_register(&mut els),
            View::Main => self.render_main(page, &mut els),
        }

        if let Some(message) = &self.validation {
            els.push(
                MockElement::new("validation", "div")
                    .test_id("validation-error")
                    .css(".validation-error")
                    .css(".error")
                    .text(message.as_str()),
            );
        }
        if let Some(message) = &self.error {
            els.push(
                MockElement::new("error", "div")
                    .test_id("error-message")
                    .css(".error")
                    .text(message.as_str()),
            );
        }
        page.elements = els;
    }

    fn email_input(&self, key: &str) -> MockElement {
        let value = self.field(key);
        let mut el = self
            .input(key, "input")
            .css("input[type=\"email\"]")
            .placeholder("Email");
        if !value.is_empty() && !value.contains('@') {
            el = el.css("input[type=\"email\"]:invalid");
        }
        el
    }

    fn render_login(&self, els: &mut Vec<MockElement>) {
        els.push(MockElement::new("heading", "h2").text("Sign in"));
        els.push(self.email_input("login-email"));
        els.push(
            self.input("login-password", "input")
                .css("input[type=\"password\"]")
                .placeholder("Password"),
        );
        els.push(
            MockElement::new("login-button", "button")
                .test_id("login-button")
                .css("button[type=\"submit\"]")
                .text("Login"),
        );
        els.push(
            MockElement::new("register-link", "a")
                .test_id("register-link")
                .text("Create an account"),
        );
    }

    fn render_register(&self, els: &mut Vec<MockElement>) {
        els.push(MockElement::new("heading", "h2").text("Create account"));
        els.push(self.email_input("email-input"));
        els.push(
            self.input("password-input", "input")
                .css("input[type=\"password\"]")
                .placeholder("Password"),
        );
        els.push(
            self.input("firstName-input", "input")
                .css("input[name*=\"firstName\"]")
                .placeholder("First name"),
        );
        els.push(
            self.input("lastName-input", "input")
                .css("input[name*=\"lastName\"]")
                .placeholder("Last name"),
        );
        els.push(
            MockElement::new("register-button", "button")
                .test_id("register-button")
                .css("button[type=\"submit\"]")
                .text("Register"),
        );
        els.push(
            MockElement::new("login-link", "a")
                .test_id("login-link")
                .text("Back to Login"),
        );
    }

    fn render_main(&self, page: &MockPage, els: &mut Vec<MockElement>) {
        els.push(
            MockElement::new("main-nav", "nav")
                .test_id("main-nav")
                .css(".bottom-nav"),
        );
        for (section, label) in [
            (Section::Profile, "Profile"),
            (Section::Swipe, "Swipe"),
            (Section::Messages, "Messages"),
        ] {
            let key = format!("{}-tab", section.path());
            els.push(
                MockElement::new(key.as_str(), "button")
                    .test_id(key.as_str())
                    .css(".tab")
                    .text(label),
            );
        }
        if let Some(notice) = &self.notice {
            els.push(
                MockElement::new("notice", "div")
                    .test_id("success-message")
                    .text(notice.as_str()),
            );
        }

        match self.section {
            Section::Profile => self.render_profile(els),
            Section::Swipe => self.render_swipe(page, els),
            Section::Messages => self.render_messages(els),
        }
    }

    fn render_profile(&self, els: &mut Vec<MockElement>) {
        els.push(
            MockElement::new("profile-screen", "div")
                .test_id("profile-screen")
                .css(".profile-form"),
        );
        els.push(MockElement::new("heading", "h2").text("Your Profile"));
        for (key, tag, label) in [
            ("bio-input", "textarea", "Bio"),
            ("age-input", "input", "Age"),
            ("city-input", "input", "City"),
            ("occupation-input", "input", "Occupation"),
            ("interests-input", "input", "Interests"),
        ] {
            els.push(MockElement::new(format!("label-{key}"), "label").text(label));
            els.push(
                self.input(key, tag)
                    .placeholder(label.to_lowercase()),
            );
        }
        els.push(
            MockElement::new("photo-upload", "input")
                .test_id("photo-upload")
                .css("input[type=\"file\"]")
                .hidden(),
        );
        els.push(
            MockElement::new("photo-button", "button")
                .css(".upload-button")
                .text("Upload Photo"),
        );
        els.push(
            MockElement::new("save-profile", "button")
                .test_id("save-profile-button")
                .text("Save Profile"),
        );
        if self.profile_saved {
            els.push(
                MockElement::new("profile-saved", "div")
                    .test_id("profile-saved")
                    .text("Profile updated successfully"),
            );
        }
    }

    fn render_swipe(&self, page: &MockPage, els: &mut Vec<MockElement>) {
        els.push(
            MockElement::new("swipe-screen", "div")
                .test_id("swipe-screen")
                .css(".card-stack"),
        );
        if let Some(name) = DECK.get(self.position) {
            let (x, y, w, h) = Self::card_box(page);
            els.push(
                MockElement::new(format!("card-{}", self.position), "div")
                    .test_id("swipe-card")
                    .css(".swipe-card")
                    .text(*name)
                    .bbox(x, y, w, h),
            );
            if self.swipe_buttons {
                els.push(
                    MockElement::new("pass-button", "button")
                        .test_id("pass-button")
                        .css(".pass-button")
                        .text("✕")
                        .aria_label("Pass"),
                );
                els.push(
                    MockElement::new("like-button", "button")
                        .test_id("like-button")
                        .css(".like-button")
                        .text("♥")
                        .aria_label("Like"),
                );
            }
        } else {
            els.push(
                MockElement::new("end-of-deck", "div")
                    .test_id("no-more-profiles")
                    .text("No more profiles. Come back later!"),
            );
        }
        if let Some(name) = &self.pending_match {
            els.push(
                MockElement::new("match-modal", "div")
                    .test_id("match-notification")
                    .css(".match-modal")
                    .text(format!("It's a match! You and {name} liked each other.")),
            );
            els.push(
                MockElement::new("match-dismiss", "button")
                    .test_id("match-dismiss")
                    .css(".match-modal button")
                    .text("Keep Swiping"),
            );
        }
    }

    fn render_messages(&self, els: &mut Vec<MockElement>) {
        els.push(
            MockElement::new("messages-screen", "div")
                .test_id("messages-screen")
                .css(".chat-list"),
        );
        els.push(MockElement::new("heading", "h2").text("Matches"));
        if self.conversations.is_empty() {
            els.push(
                MockElement::new("no-conversations", "div")
                    .test_id("no-conversations")
                    .text("No matches yet"),
            );
        }
        for (i, conversation) in self.conversations.iter().enumerate() {
            els.push(
                MockElement::new(format!("conversation-{i}"), "div")
                    .test_id("conversation-item")
                    .css(".conversation-item")
                    .text(conversation.name.as_str()),
            );
        }

        let Some((i, conversation)) = self
            .open
            .and_then(|i| self.conversations.get(i).map(|c| (i, c)))
        else {
            return;
        };
        els.push(
            MockElement::new("message-history", "div")
                .test_id("message-history")
                .css(".message-history"),
        );
        if conversation.messages.is_empty() {
            els.push(
                MockElement::new("no-messages", "div")
                    .test_id("no-messages")
                    .text(format!("Say hello to {}!", conversation.name)),
            );
        }
        for (j, message) in conversation.messages.iter().enumerate() {
            els.push(
                MockElement::new(format!("message-{i}-{j}"), "div")
                    .test_id("message-bubble")
                    .css(".message-bubble")
                    .text(message.as_str()),
            );
        }
        let draft = self.field("message-input");
        els.push(
            self.input("message-input", "input")
                .placeholder("Type a message..."),
        );
        els.push(
            MockElement::new("send-button", "button")
                .test_id("send-message-button")
                .css(".send-button")
                .text("Send")
                .enabled(!draft.trim().is_empty()),
        );
    }
}

fn origin_of(url: &str) -> String {
    let after_scheme = url.find("://").map_or(0, |i| i + 3);
    match url[after_scheme..].find('/') {
        Some(i) => url[..after_scheme + i].to_string(),
        None => url.to_string(),
    }
}

impl MockBehavior for DemoApp {
    fn on_load(&mut self, page: &mut MockPage) {
        self.origin = origin_of(&page.url);
        self.view = View::Login;
        self.section = Section::Swipe;
        self.open = None;
        self.pending_match = None;
        self.form.clear();
        self.clear_messages();
        self.render(page);
    }

    fn on_click(&mut self, page: &mut MockPage, key: &str) {
        match key {
            "register-link" => {
                self.clear_messages();
                self.view = View::Register;
            }
            "login-link" => {
                self.clear_messages();
                self.view = View::Login;
            }
            "login-button" => {
                self.clear_messages();
                self.login(page);
            }
            "register-button" => {
                self.clear_messages();
                self.register(page);
            }
            "profile-tab" => {
                self.clear_messages();
                self.route(page, Section::Profile);
            }
            "swipe-tab" => {
                self.clear_messages();
                self.route(page, Section::Swipe);
            }
            "messages-tab" => {
                self.clear_messages();
                self.route(page, Section::Messages);
            }
            "like-button" => self.swipe(true),
            "pass-button" => self.swipe(false),
            "match-dismiss" => self.pending_match = None,
            "save-profile" => {
                self.clear_messages();
                self.save_profile();
            }
            "send-button" => self.send(),
            "theme-toggle" => self.dark = !self.dark,
            other => {
                if let Some(i) = other
                    .strip_prefix("conversation-")
                    .and_then(|i| i.parse::<usize>().ok())
                {
                    self.open = Some(i);
                }
            }
        }
        self.render(page);
    }

    fn on_fill(&mut self, page: &mut MockPage, key: &str, value: &str) {
        self.form.insert(key.to_string(), value.to_string());
        self.render(page);
    }

    fn on_press(&mut self, page: &mut MockPage, key: &str, pressed: &str) {
        if key == "message-input" && pressed == "Enter" {
            self.send();
            self.render(page);
        }
    }

    fn on_drag(&mut self, page: &mut MockPage, from: Point, to: Point) {
        if self.view != View::Main || self.section != Section::Swipe {
            return;
        }
        let (x, y, w, h) = Self::card_box(page);
        let on_card = from.x >= x && from.x <= x + w && from.y >= y && from.y <= y + h;
        let dx = to.x - from.x;
        if on_card && dx.abs() >= DRAG_THRESHOLD {
            self.swipe(dx > 0.0);
            self.render(page);
        }
    }

    fn on_back(&mut self, page: &mut MockPage) {
        let path = page.url.rsplit('/').next().unwrap_or_default();
        if let Some(section) = Section::from_path(path) {
            self.section = section;
        }
        self.render(page);
    }

    fn on_resize(&mut self, page: &mut MockPage) {
        self.render(page);
    }
}

/// A mock session running the fake dating application
#[must_use]
pub fn demo_app() -> MockDriver {
    MockDriver::with_behavior(DemoApp::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::BrowserDriver;
    use crate::locator::Selector;

    async fn click(driver: &MockDriver, test_id: &str) {
        let el = driver
            .query_all(&Selector::test_id(test_id))
            .await
            .unwrap()
            .remove(0);
        driver.click(&el).await.unwrap();
    }

    async fn fill(driver: &MockDriver, test_id: &str, value: &str) {
        let el = driver
            .query_all(&Selector::test_id(test_id))
            .await
            .unwrap()
            .remove(0);
        driver.fill(&el, value).await.unwrap();
    }

    async fn visible(driver: &MockDriver, test_id: &str) -> bool {
        !driver
            .query_all(&Selector::test_id(test_id))
            .await
            .unwrap()
            .is_empty()
    }

    #[test]
    fn test_origin_of() {
        assert_eq!(origin_of("http://localhost:3001/swipe"), "http://localhost:3001");
        assert_eq!(origin_of("http://localhost:3001"), "http://localhost:3001");
    }

    #[tokio::test]
    async fn test_register_lands_in_swipe_section() {
        let mut driver = demo_app();
        driver.navigate("http://localhost:3001/").await.unwrap();
        assert!(visible(&driver, "login-email").await);

        click(&driver, "register-link").await;
        fill(&driver, "email-input", "a@example.com").await;
        fill(&driver, "password-input", "TestPassword123!").await;
        click(&driver, "register-button").await;

        assert!(visible(&driver, "main-nav").await);
        assert!(visible(&driver, "swipe-card").await);
        assert_eq!(
            driver.current_url().await.unwrap(),
            "http://localhost:3001/swipe"
        );
    }

    #[tokio::test]
    async fn test_bad_login_shows_error() {
        let mut driver = MockDriver::with_behavior(DemoApp::new().with_user("a@b.c", "secret123"));
        driver.navigate("http://localhost:3001/").await.unwrap();
        fill(&driver, "login-email", "a@b.c").await;
        fill(&driver, "login-password", "wrong").await;
        click(&driver, "login-button").await;
        assert!(visible(&driver, "error-message").await);
        assert!(!visible(&driver, "main-nav").await);
    }

    #[tokio::test]
    async fn test_match_on_second_like_only() {
        let mut driver = MockDriver::with_behavior(DemoApp::new().with_user("a@b.c", "secret123"));
        driver.navigate("http://localhost:3001/").await.unwrap();
        fill(&driver, "login-email", "a@b.c").await;
        fill(&driver, "login-password", "secret123").await;
        click(&driver, "login-button").await;

        click(&driver, "like-button").await;
        assert!(!visible(&driver, "match-notification").await);
        click(&driver, "like-button").await;
        assert!(visible(&driver, "match-notification").await);
        click(&driver, "match-dismiss").await;
        click(&driver, "like-button").await;
        assert!(!visible(&driver, "match-notification").await);
    }

    #[tokio::test]
    async fn test_blocked_reload_shows_offline_banner() {
        let mut driver = demo_app();
        driver.navigate("http://localhost:3001/").await.unwrap();
        driver.block_requests(&["*".to_string()]).await.unwrap();
        driver.reload().await.unwrap();
        assert!(visible(&driver, "offline-banner").await);
        assert!(!visible(&driver, "login-email").await);
    }
}
