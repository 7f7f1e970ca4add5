//! `run` and `list` command implementations

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use swipecheck::{select, HarnessConfig, MockDriver, RunReport, ScenarioRunner, SessionFactory};
use tracing::info;

use crate::commands::{Backend, ListFormat, RunArgs};
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;

/// Report file written by `run --report`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFile {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Application under test
    pub base_url: String,
    /// Backend the sessions came from
    pub backend: String,
    /// Scenario results
    #[serde(flatten)]
    pub report: RunReport,
}

/// Fold run flags into the harness config
#[must_use]
pub fn apply_run_args(mut config: HarnessConfig, args: &RunArgs) -> HarnessConfig {
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(dir) = &args.artifacts {
        config.artifacts_dir = Some(dir.clone());
    }
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(path) = &args.chromium {
        config.browser.executable_path = Some(path.clone());
    }
    if let Some(ms) = args.scenario_timeout {
        config.timeouts.scenario_ms = ms;
    }
    if let Some(ms) = args.run_timeout {
        config.timeouts.run_ms = Some(ms);
    }
    config
}

/// Scenario ids and summaries selected by `filters`, one per line or as JSON
pub fn render_list(filters: &[String], format: ListFormat) -> CliResult<String> {
    let scenarios = select::<MockDriver>(filters);
    if scenarios.is_empty() {
        return Err(no_match(filters));
    }
    match format {
        ListFormat::Text => {
            let width = scenarios.iter().map(|s| s.id().len()).max().unwrap_or(0);
            Ok(scenarios
                .iter()
                .map(|s| format!("{:width$}  {}", s.id(), s.summary))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        ListFormat::Json => {
            let entries: Vec<_> = scenarios
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "id": s.id(),
                        "suite": s.suite,
                        "summary": s.summary,
                    })
                })
                .collect();
            Ok(serde_json::to_string_pretty(&entries)?)
        }
    }
}

fn no_match(filters: &[String]) -> CliError {
    CliError::invalid_argument(format!("no scenario matches {}", filters.join(", ")))
}

/// Run the selected scenarios on the chosen backend
pub async fn execute_run(
    config: HarnessConfig,
    args: &RunArgs,
    reporter: &mut ProgressReporter,
) -> CliResult<RunReport> {
    match args.backend {
        Backend::Mock => {
            reporter.warning("mock backend: running against the built-in fake application");
            run_on(swipecheck::MockFactory::demo(), config, args, reporter).await
        }
        #[cfg(feature = "browser")]
        Backend::Cdp => run_on(swipecheck::CdpFactory, config, args, reporter).await,
        #[cfg(not(feature = "browser"))]
        Backend::Cdp => Err(CliError::invalid_argument(
            "built without the `browser` feature; use --backend mock",
        )),
    }
}

async fn run_on<F: SessionFactory>(
    factory: F,
    config: HarnessConfig,
    args: &RunArgs,
    reporter: &mut ProgressReporter,
) -> CliResult<RunReport> {
    let scenarios = select::<F::Driver>(&args.filter);
    if scenarios.is_empty() {
        return Err(no_match(&args.filter));
    }
    let base_url = config.base_url.clone();
    let mut runner = ScenarioRunner::new(factory, config)?;
    if let Some(suffix) = &args.suffix {
        runner = runner.with_suffix(suffix.clone());
    }

    let started_at = Utc::now();
    info!(%base_url, scenarios = scenarios.len(), "starting run");
    reporter.info(&format!(
        "{} scenario(s) against {base_url}",
        scenarios.len()
    ));
    reporter.start_progress(scenarios.len() as u64, "running");
    let report = runner
        .run_with(scenarios, |result| reporter.scenario_finished(result))
        .await;
    reporter.finish();
    reporter.summary(&report);

    if let Some(path) = &args.report {
        let file = ReportFile {
            started_at,
            base_url,
            backend: format!("{:?}", args.backend).to_lowercase(),
            report,
        };
        write_report(path, &file)?;
        reporter.info(&format!("report written to {}", path.display()));
        return Ok(file.report);
    }
    Ok(report)
}

/// Write a report as pretty JSON, creating parent directories
pub fn write_report(path: &Path, file: &ReportFile) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            CliError::report_generation(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    let json = serde_json::to_string_pretty(file)?;
    std::fs::write(path, json)
        .map_err(|e| CliError::report_generation(format!("cannot write {}: {e}", path.display())))
}
