//! Scenario runner.
//!
//! Runs catalogue scenarios, each in its own session, up to `jobs` at a time.
//! Every scenario is bounded by the per-scenario timeout and, when set, by
//! what is left of the whole-run budget.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, info_span, warn, Instrument};

use crate::assertion::Note;
use crate::config::HarnessConfig;
use crate::elements::LocatorTable;
use crate::result::HarnessResult;
use crate::scenarios::Scenario;
use crate::session::{with_session, SessionEnd, SessionFactory};

/// Final state of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    /// Every hard check held
    Passed,
    /// A hard check or an interaction failed
    Failed {
        /// Failure description
        message: String,
    },
    /// The scenario exceeded its time budget
    TimedOut {
        /// Budget that was exceeded
        timeout_ms: u64,
    },
}

impl Verdict {
    /// Whether the scenario passed
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed { message } => write!(f, "failed: {message}"),
            Self::TimedOut { timeout_ms } => write!(f, "timed out after {timeout_ms}ms"),
        }
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// `suite::name`
    pub id: String,
    /// Suite
    pub suite: String,
    /// Verdict
    pub verdict: Verdict,
    /// Informational notes
    pub notes: Vec<Note>,
    /// Wall time, milliseconds
    pub duration_ms: u64,
    /// Failure screenshot, when one was saved
    pub screenshot: Option<PathBuf>,
}

impl ScenarioResult {
    /// Whether the scenario passed
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.verdict.is_passed()
    }
}

/// Results of a run, in catalogue order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Per-scenario results
    pub results: Vec<ScenarioResult>,
    /// Wall time of the whole run, milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    /// Check if all scenarios passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(ScenarioResult::passed)
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Count failed scenarios (including timeouts)
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.total() - self.passed_count()
    }

    /// Count timed-out scenarios
    #[must_use]
    pub fn timed_out_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.verdict, Verdict::TimedOut { .. }))
            .count()
    }

    /// Total scenario count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Results that did not pass
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results.iter().filter(|r| !r.passed()).collect()
    }

    /// Total notes across scenarios
    #[must_use]
    pub fn note_count(&self) -> usize {
        self.results.iter().map(|r| r.notes.len()).sum()
    }

    /// Pretty JSON
    pub fn to_json(&self) -> HarnessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs scenarios against sessions from a factory
#[derive(Debug)]
pub struct ScenarioRunner<F: SessionFactory> {
    factory: Arc<F>,
    locators: Arc<LocatorTable>,
    config: Arc<HarnessConfig>,
    suffix: Option<String>,
}

impl<F: SessionFactory> ScenarioRunner<F> {
    /// Build a runner; the locator table is built once from the config
    pub fn new(factory: F, config: HarnessConfig) -> HarnessResult<Self> {
        config.validate()?;
        let locators = LocatorTable::with_overrides(&config.locators)?;
        Ok(Self {
            factory: Arc::new(factory),
            locators: Arc::new(locators),
            config: Arc::new(config),
            suffix: None,
        })
    }

    /// Fixed fixture suffix for every scenario
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Run configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run scenarios
    pub async fn run(&self, scenarios: Vec<Scenario<F::Driver>>) -> RunReport {
        self.run_with(scenarios, |_| {}).await
    }

    /// Run scenarios, calling `on_result` as each one finishes
    pub async fn run_with(
        &self,
        scenarios: Vec<Scenario<F::Driver>>,
        mut on_result: impl FnMut(&ScenarioResult),
    ) -> RunReport {
        let started = Instant::now();
        let deadline = self
            .config
            .timeouts
            .run_ms
            .map(|ms| started + Duration::from_millis(ms));
        let jobs = self.config.jobs.max(1);
        info!(scenarios = scenarios.len(), jobs, "run started");

        let mut finished: Vec<(usize, ScenarioResult)> = Vec::with_capacity(scenarios.len());
        let mut pending = stream::iter(scenarios.into_iter().enumerate())
            .map(|(index, scenario)| async move { (index, self.run_one(scenario, deadline).await) })
            .buffer_unordered(jobs);
        while let Some((index, result)) = pending.next().await {
            on_result(&result);
            finished.push((index, result));
        }
        finished.sort_by_key(|(index, _)| *index);

        let report = RunReport {
            results: finished.into_iter().map(|(_, r)| r).collect(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            passed = report.passed_count(),
            failed = report.failed_count(),
            notes = report.note_count(),
            "run finished"
        );
        report
    }

    async fn run_one(
        &self,
        scenario: Scenario<F::Driver>,
        deadline: Option<Instant>,
    ) -> ScenarioResult {
        let id = scenario.id();
        let mut timeout = self.config.timeouts.scenario();
        if let Some(deadline) = deadline {
            timeout = timeout.min(deadline.saturating_duration_since(Instant::now()));
        }
        if timeout.is_zero() {
            warn!(scenario = %id, "run budget exhausted before start");
            return ScenarioResult {
                id,
                suite: scenario.suite.to_string(),
                verdict: Verdict::TimedOut { timeout_ms: 0 },
                notes: Vec::new(),
                duration_ms: 0,
                screenshot: None,
            };
        }

        let span = info_span!("scenario", id = %id);
        let run = with_session(
            self.factory.as_ref(),
            Arc::clone(&self.locators),
            Arc::clone(&self.config),
            self.suffix.clone(),
            timeout,
            scenario.run,
        )
        .instrument(span)
        .await;

        let verdict = match run.end {
            SessionEnd::Finished(Ok(())) => Verdict::Passed,
            SessionEnd::Finished(Err(error)) => Verdict::Failed {
                message: error.to_string(),
            },
            SessionEnd::Panicked(message) => Verdict::Failed {
                message: format!("panicked: {message}"),
            },
            SessionEnd::TimedOut(budget) => Verdict::TimedOut {
                timeout_ms: budget.as_millis() as u64,
            },
        };
        info!(scenario = %id, %verdict, notes = run.notes.len(), "scenario finished");

        let screenshot = match run.screenshot {
            Some(png) => self.save_screenshot(&id, &png).await,
            None => None,
        };
        ScenarioResult {
            id,
            suite: scenario.suite.to_string(),
            verdict,
            notes: run.notes,
            duration_ms: run.duration.as_millis() as u64,
            screenshot,
        }
    }

    async fn save_screenshot(&self, id: &str, png: &[u8]) -> Option<PathBuf> {
        let dir = self.config.artifacts_dir.as_ref()?;
        let path = dir.join(format!("{}.png", id.replace("::", "__")));
        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, png).await
        }
        .await;
        match written {
            Ok(()) => Some(path),
            Err(error) => {
                warn!(%error, path = %path.display(), "screenshot not saved");
                None
            }
        }
    }
}
