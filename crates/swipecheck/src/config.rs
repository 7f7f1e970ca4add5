//! Harness Configuration
//!
//! Configuration for a test run: where the application lives, how the browser
//! is launched, how long waits may take and which locator candidates to use in
//! place of the built-in ones. Loaded from YAML; every field has a default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::driver::DriverConfig;
use crate::result::{HarnessError, HarnessResult};
use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};

/// Default base URL of the application under test
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// Timeouts used by the facade and the runner, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Element resolution
    pub element_ms: u64,
    /// Waiting for an action's observable effect
    pub action_ms: u64,
    /// Probing optional affordances that may legitimately be absent
    pub probe_ms: u64,
    /// Poll interval for every wait
    pub poll_interval_ms: u64,
    /// Whole-scenario budget
    pub scenario_ms: u64,
    /// Whole-run budget; unbounded when `None`
    pub run_ms: Option<u64>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element_ms: DEFAULT_WAIT_TIMEOUT_MS,
            action_ms: DEFAULT_WAIT_TIMEOUT_MS,
            probe_ms: 1_000,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            scenario_ms: 60_000,
            run_ms: None,
        }
    }
}

impl Timeouts {
    /// Element resolution timeout
    #[must_use]
    pub const fn element(&self) -> Duration {
        Duration::from_millis(self.element_ms)
    }

    /// Action-effect timeout
    #[must_use]
    pub const fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    /// Optional-affordance probe timeout
    #[must_use]
    pub const fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms)
    }

    /// Poll interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Scenario budget
    #[must_use]
    pub const fn scenario(&self) -> Duration {
        Duration::from_millis(self.scenario_ms)
    }

    /// Wait options for action effects
    #[must_use]
    pub fn action_wait(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.action_ms)
            .with_poll_interval(self.poll_interval_ms)
    }
}

/// Configuration for a harness run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Base URL of the application under test
    pub base_url: String,
    /// Browser launch options
    pub browser: DriverConfig,
    /// Wait and budget timeouts
    pub timeouts: Timeouts,
    /// Scenarios run concurrently, each in its own session
    pub jobs: usize,
    /// Where failure screenshots are written
    pub artifacts_dir: Option<PathBuf>,
    /// Locator overrides keyed by element name, replacing the defaults
    pub locators: BTreeMap<String, Vec<String>>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            browser: DriverConfig::default(),
            timeouts: Timeouts::default(),
            jobs: 1,
            artifacts_dir: None,
            locators: BTreeMap::new(),
        }
    }
}

impl HarnessConfig {
    /// Create config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML
    pub fn from_yaml(yaml: &str) -> HarnessResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load YAML from a file
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> HarnessResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject values no run could work with
    pub fn validate(&self) -> HarnessResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(HarnessError::config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.jobs == 0 {
            return Err(HarnessError::config("jobs must be at least 1"));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(HarnessError::config("poll_interval_ms must be positive"));
        }
        Ok(())
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set browser options
    #[must_use]
    pub fn with_browser(mut self, browser: DriverConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Set timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set concurrency
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set artifacts directory
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }

    /// Override the candidates of one element
    #[must_use]
    pub fn with_locator(mut self, element: impl Into<String>, candidates: Vec<String>) -> Self {
        self.locators.insert(element.into(), candidates);
        self
    }

    /// Absolute URL for a path under the base URL
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.is_empty() {
            format!("{base}/")
        } else if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.base_url, "http://localhost:3001");
        assert_eq!(config.timeouts.element_ms, 5_000);
        assert_eq!(config.timeouts.poll_interval_ms, 100);
        assert_eq!(config.jobs, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r"
base_url: http://staging.local:8080
timeouts:
  element_ms: 2000
locators:
  like_button:
    - testid=like
    - button.heart
";
        let config = HarnessConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.base_url, "http://staging.local:8080");
        assert_eq!(config.timeouts.element_ms, 2_000);
        assert_eq!(config.timeouts.poll_interval_ms, 100);
        assert_eq!(config.locators["like_button"].len(), 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(HarnessConfig::from_yaml("base_url: localhost\n").is_err());
        assert!(HarnessConfig::from_yaml("jobs: 0\n").is_err());
        assert!(HarnessConfig::from_yaml("timeouts:\n  poll_interval_ms: 0\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "jobs: 4").unwrap();
        let config = HarnessConfig::load(file.path()).unwrap();
        assert_eq!(config.jobs, 4);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = HarnessConfig::new()
            .with_base_url("https://app.example")
            .with_jobs(2)
            .with_locator("send_button", vec!["testid=send".into()]);
        let back = HarnessConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_url_for() {
        let config = HarnessConfig::new().with_base_url("http://localhost:3001/");
        assert_eq!(config.url_for(""), "http://localhost:3001/");
        assert_eq!(config.url_for("/profile"), "http://localhost:3001/profile");
        assert_eq!(config.url_for("chat"), "http://localhost:3001/chat");
    }
}
