//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::ColorChoice;

/// Swipecheck: end-to-end scenarios for a dating web client
#[derive(Parser, Debug)]
#[command(name = "swipecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Harness config file (YAML)
    #[arg(short, long, global = true, env = "SWIPECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the application under test
    #[arg(long, global = true, env = "SWIPECHECK_BASE_URL")]
    pub base_url: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List scenarios
    List(ListArgs),

    /// Run scenarios
    Run(RunArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Suite, scenario name or `suite::name` prefix; all when omitted
    pub filter: Vec<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ListFormat,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite, scenario name or `suite::name` prefix; all when omitted
    pub filter: Vec<String>,

    /// Session backend
    #[arg(short, long, default_value = "cdp")]
    pub backend: Backend,

    /// Scenarios run concurrently
    #[arg(short, long, env = "SWIPECHECK_JOBS")]
    pub jobs: Option<usize>,

    /// Fixed suffix for generated accounts
    #[arg(long, env = "SWIPECHECK_SUFFIX")]
    pub suffix: Option<String>,

    /// Write a JSON report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Directory for failure screenshots
    #[arg(long, env = "SWIPECHECK_ARTIFACTS")]
    pub artifacts: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chromium executable
    #[arg(long, env = "SWIPECHECK_CHROMIUM")]
    pub chromium: Option<String>,

    /// Per-scenario budget in milliseconds
    #[arg(long)]
    pub scenario_timeout: Option<u64>,

    /// Whole-run budget in milliseconds
    #[arg(long)]
    pub run_timeout: Option<u64>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Print built-in defaults, ignoring files and flags
    #[arg(long)]
    pub default: bool,
}

/// Where sessions come from
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// Chromium over the DevTools protocol
    #[default]
    Cdp,
    /// Built-in fake of the application
    Mock,
}

/// Output format for `list`
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// One scenario per line
    #[default]
    Text,
    /// JSON array
    Json,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Detect from the terminal
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["swipecheck", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.backend, Backend::Cdp);
        assert!(args.filter.is_empty());
        assert!(args.jobs.is_none());
        assert!(!args.headed);
    }

    #[test]
    fn test_run_with_filters_and_flags() {
        let cli = Cli::try_parse_from([
            "swipecheck",
            "-vv",
            "run",
            "swipe",
            "auth::login_screen_on_load",
            "--backend",
            "mock",
            "-j",
            "4",
            "--suffix",
            "abc123",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.filter, vec!["swipe", "auth::login_screen_on_load"]);
        assert_eq!(args.backend, Backend::Mock);
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.suffix.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["swipecheck", "list", "--base-url", "http://app:8080", "-q"])
                .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.base_url.as_deref(), Some("http://app:8080"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(Cli::try_parse_from(["swipecheck", "run", "--backend", "firefox"]).is_err());
    }

    #[test]
    fn test_color_arg_conversion() {
        assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
        assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
    }
}
