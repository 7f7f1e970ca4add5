//! Result and error types for Swipecheck.

use thiserror::Error;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can occur while driving the application under test
#[derive(Debug, Error)]
pub enum HarnessError {
    /// No candidate locator matched a visible element within the timeout
    #[error("Element not found: {element} (waited {timeout_ms}ms)")]
    ElementNotFound {
        /// Logical element name
        element: String,
        /// How long resolution was attempted
        timeout_ms: u64,
    },

    /// An expected state transition did not happen in time
    #[error("Timed out after {timeout_ms}ms waiting for {action}")]
    ActionTimeout {
        /// What was being waited for
        action: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Query failed while the DOM was mid-mutation
    #[error("Transient query error: {message}")]
    TransientQuery {
        /// Error message
        message: String,
    },

    /// Element handle no longer attached to the document
    #[error("Stale element handle: {id}")]
    StaleElement {
        /// Driver-issued handle id
        id: String,
    },

    /// A candidate set was built without any selector
    #[error("Candidate set for {element} is empty")]
    EmptyCandidateSet {
        /// Logical element name
        element: String,
    },

    /// Selector string could not be parsed
    #[error("Invalid selector: {selector}")]
    InvalidSelector {
        /// Offending selector text
        selector: String,
    },

    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set SWIPECHECK_CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// The browser session was closed or its connection dropped
    #[error("Browser session closed: {message}")]
    SessionClosed {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Script evaluation error
    #[error("Script evaluation failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    Input {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Hard scenario assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl HarnessError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a transient query error
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientQuery {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Errors caused by a half-rendered or mutating page.
    ///
    /// Polling loops retry these instead of surfacing them.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TransientQuery { .. } | Self::StaleElement { .. } | Self::Script { .. }
        )
    }

    /// Errors after which the session cannot make progress.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SessionClosed { .. } | Self::BrowserNotFound | Self::BrowserLaunch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_not_found_names_logical_element() {
        let err = HarnessError::ElementNotFound {
            element: "like_button".to_string(),
            timeout_ms: 5000,
        };
        let msg = err.to_string();
        assert!(msg.contains("like_button"));
        assert!(msg.contains("5000ms"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(HarnessError::transient("detached").is_transient());
        assert!(HarnessError::StaleElement { id: "3".into() }.is_transient());
        assert!(!HarnessError::assertion("nope").is_transient());
        assert!(!HarnessError::ActionTimeout {
            action: "save".into(),
            timeout_ms: 1
        }
        .is_transient());
    }

    #[test]
    fn test_fatal_classification() {
        let closed = HarnessError::SessionClosed {
            message: "websocket".into(),
        };
        assert!(closed.is_fatal());
        assert!(!closed.is_transient());
        assert!(!HarnessError::transient("x").is_fatal());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: HarnessError = io.into();
        assert!(matches!(err, HarnessError::Io(_)));
    }
}
