//! Two-tier scenario checks.
//!
//! A scenario distinguishes what must hold (a hard check: failing it ends the
//! scenario with [`HarnessError::AssertionFailed`]) from what the application
//! may or may not implement (a note: recorded, logged, never a failure).
//!
//! ## Example
//!
//! ```ignore
//! let mut checks = Checks::new();
//! checks.require(page.is_logged_in().await?, "user should be logged in")?;
//! if !page.has_photo_upload().await? {
//!     checks.note("photo upload not available");
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::info;

use crate::result::{HarnessError, HarnessResult};

/// Informational observation recorded during a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// What was observed
    pub message: String,
    /// Position among the scenario's checks
    pub index: usize,
}

/// Hard checks and informational notes for one scenario
#[derive(Debug, Default)]
pub struct Checks {
    notes: Vec<Note>,
    count: usize,
}

impl Checks {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(message: String) -> HarnessResult<()> {
        Err(HarnessError::AssertionFailed { message })
    }

    /// Hard check on a condition
    pub fn require(&mut self, condition: bool, message: impl Into<String>) -> HarnessResult<()> {
        self.count += 1;
        if condition {
            Ok(())
        } else {
            Self::fail(message.into())
        }
    }

    /// Hard check that two values are equal
    pub fn require_eq<T: PartialEq + Debug>(
        &mut self,
        actual: &T,
        expected: &T,
        message: &str,
    ) -> HarnessResult<()> {
        self.count += 1;
        if actual == expected {
            Ok(())
        } else {
            Self::fail(format!("{message}: expected {expected:?}, got {actual:?}"))
        }
    }

    /// Hard check that two values differ
    pub fn require_ne<T: PartialEq + Debug>(
        &mut self,
        actual: &T,
        other: &T,
        message: &str,
    ) -> HarnessResult<()> {
        self.count += 1;
        if actual == other {
            Self::fail(format!("{message}: expected values to differ, both were {actual:?}"))
        } else {
            Ok(())
        }
    }

    /// Hard check that a value is present, returning it
    pub fn require_some<T>(&mut self, value: Option<T>, message: &str) -> HarnessResult<T> {
        self.count += 1;
        value.ok_or_else(|| HarnessError::AssertionFailed {
            message: format!("{message}: expected a value, got none"),
        })
    }

    /// Record an informational note
    pub fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(note = %message, "scenario note");
        self.notes.push(Note {
            message,
            index: self.count,
        });
        self.count += 1;
    }

    /// Record `message` as a note when `condition` is false; returns `condition`
    pub fn note_unless(&mut self, condition: bool, message: impl Into<String>) -> bool {
        if !condition {
            self.note(message);
        }
        condition
    }

    /// Notes recorded so far
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Take the recorded notes
    #[must_use]
    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }

    /// Hard checks and notes performed
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_passes_and_fails() {
        let mut checks = Checks::new();
        assert!(checks.require(true, "fine").is_ok());
        let err = checks.require(false, "nav visible").unwrap_err();
        assert!(matches!(err, HarnessError::AssertionFailed { ref message } if message == "nav visible"));
        assert_eq!(checks.count(), 2);
    }

    #[test]
    fn test_require_eq_message() {
        let mut checks = Checks::new();
        let err = checks.require_eq(&3, &4, "bubbles").unwrap_err();
        assert_eq!(err.to_string(), "Assertion failed: bubbles: expected 4, got 3");
    }

    #[test]
    fn test_require_ne() {
        let mut checks = Checks::new();
        assert!(checks.require_ne(&"Alex", &"Sam", "card changed").is_ok());
        assert!(checks.require_ne(&"Alex", &"Alex", "card changed").is_err());
    }

    #[test]
    fn test_require_some_returns_value() {
        let mut checks = Checks::new();
        assert_eq!(checks.require_some(Some(5), "x").unwrap(), 5);
        assert!(checks.require_some::<u8>(None, "x").is_err());
    }

    #[test]
    fn test_notes_never_fail() {
        let mut checks = Checks::new();
        checks.note("typing indicator not implemented");
        assert!(checks.note_unless(true, "unused"));
        assert!(!checks.note_unless(false, "no loading state"));
        assert_eq!(checks.notes().len(), 2);
        assert_eq!(checks.notes()[1].message, "no loading state");
        assert_eq!(checks.into_notes()[0].index, 0);
    }
}
