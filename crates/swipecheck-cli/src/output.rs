//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use swipecheck::{RunReport, ScenarioResult, Verdict};

/// Progress reporter for scenario runs.
///
/// Writes to stderr so `list --format json` output on stdout stays clean.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn line(&self, text: &str) {
        let write = || {
            let _ = self.term.write_line(text);
        };
        match self.progress_bar {
            Some(ref pb) => pb.suspend(write),
            None => write(),
        }
    }

    fn prefixed(&self, symbol: &str, plain: &str, paint: fn(&str) -> String) -> String {
        if self.use_color {
            paint(symbol)
        } else {
            plain.to_string()
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefixed("✓", "PASS", |s| style(s).green().bold().to_string());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a failure message; shown even in quiet mode
    pub fn failure(&self, message: &str) {
        let prefix = self.prefixed("✗", "FAIL", |s| style(s).red().bold().to_string());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefixed("⚠", "WARN", |s| style(s).yellow().bold().to_string());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefixed("ℹ", "INFO", |s| style(s).blue().bold().to_string());
        self.line(&format!("{prefix} {message}"));
    }

    /// Report one finished scenario and advance the bar
    pub fn scenario_finished(&self, result: &ScenarioResult) {
        let took = format!("({}ms)", result.duration_ms);
        match &result.verdict {
            Verdict::Passed => self.success(&format!("{} {took}", result.id)),
            Verdict::Failed { message } => {
                self.failure(&format!("{} {took}: {message}", result.id));
            }
            Verdict::TimedOut { timeout_ms } => {
                self.failure(&format!("{} timed out after {timeout_ms}ms", result.id));
            }
        }
        if !self.quiet {
            for note in &result.notes {
                self.line(&format!("    note: {}", note.message));
            }
        }
        if let Some(path) = &result.screenshot {
            self.line(&format!("    screenshot: {}", path.display()));
        }
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
    }

    /// Print the run summary
    pub fn summary(&self, report: &RunReport) {
        let failed = report.failed_count();
        if self.quiet && failed == 0 {
            return;
        }

        let passed = report.passed_count();
        let timed_out = report.timed_out_count();
        let errored = failed - timed_out;
        let notes = report.note_count();
        let secs = Duration::from_millis(report.duration_ms).as_secs_f64();

        self.line("");
        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };
            self.line(&format!(
                "{status} {} scenarios in {secs:.2}s ({} passed, {} failed, {timed_out} timed out, {notes} notes)",
                report.total(),
                passed_style.apply_to(passed),
                if errored > 0 {
                    failed_style.apply_to(errored).to_string()
                } else {
                    errored.to_string()
                },
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            self.line(&format!(
                "{status} {} scenarios in {secs:.2}s ({passed} passed, {errored} failed, {timed_out} timed out, {notes} notes)",
                report.total()
            ));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use swipecheck::Note;

    fn result(verdict: Verdict) -> ScenarioResult {
        ScenarioResult {
            id: "swipe::like_action".into(),
            suite: "swipe".into(),
            verdict,
            notes: vec![Note {
                message: "no match notice".into(),
                index: 0,
            }],
            duration_ms: 12,
            screenshot: None,
        }
    }

    #[test]
    fn test_new_reporter() {
        let reporter = ProgressReporter::new(true, false);
        assert!(reporter.use_color);
        assert!(!reporter.quiet);
    }

    #[test]
    fn test_plain_prefix_without_color() {
        let reporter = ProgressReporter::new(false, false);
        let prefix = reporter.prefixed("✓", "PASS", |s| s.to_string());
        assert_eq!(prefix, "PASS");
    }

    #[test]
    fn test_progress_counts_finished_scenarios() {
        let mut reporter = ProgressReporter::new(false, false);
        reporter.start_progress(2, "running");
        reporter.scenario_finished(&result(Verdict::Passed));
        reporter.scenario_finished(&result(Verdict::TimedOut { timeout_ms: 5 }));
        assert_eq!(reporter.progress_bar.as_ref().unwrap().position(), 2);
        reporter.finish();
    }

    #[test]
    fn test_quiet_mode_has_no_bar() {
        let mut reporter = ProgressReporter::new(false, true);
        reporter.start_progress(10, "running");
        assert!(reporter.progress_bar.is_none());
        reporter.scenario_finished(&result(Verdict::Failed {
            message: "boom".into(),
        }));
    }

    #[test]
    fn test_summary_does_not_panic() {
        let reporter = ProgressReporter::new(false, false);
        let report = RunReport {
            results: vec![result(Verdict::Passed)],
            duration_ms: 1_500,
        };
        reporter.summary(&report);
    }
}
