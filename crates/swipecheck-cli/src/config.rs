//! CLI configuration and logging setup

use std::path::Path;

use serde::{Deserialize, Serialize};
use swipecheck::HarnessConfig;
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, CliResult};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// From `-q` and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default log filter when `RUST_LOG` is unset
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "swipecheck=info,swipecheck_cli=info,warn",
            Self::Debug => "swipecheck=debug,swipecheck_cli=debug,info",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Log as JSON lines
    pub log_json: bool,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set JSON logging
    #[must_use]
    pub const fn with_log_json(mut self, log_json: bool) -> Self {
        self.log_json = log_json;
        self
    }

    /// Log filter: `RUST_LOG` when set, otherwise from the verbosity
    #[must_use]
    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.verbosity.filter_directive()))
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// A second call leaves the first subscriber in place.
    pub fn init_logging(&self) {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.log_filter())
            .with_writer(std::io::stderr)
            .with_ansi(self.color.should_color());
        let installed = if self.log_json {
            builder.json().try_init()
        } else {
            builder.with_target(false).try_init()
        };
        if installed.is_err() {
            tracing::debug!("tracing subscriber already installed");
        }
    }
}

/// Load the harness config: defaults, then the file, then `--base-url`
pub fn load_harness_config(path: Option<&Path>, base_url: Option<&str>) -> CliResult<HarnessConfig> {
    let mut config = match path {
        Some(path) => HarnessConfig::load(path).map_err(|e| {
            CliError::config(format!("cannot load {}: {e}", path.display()))
        })?,
        None => HarnessConfig::new(),
    };
    if let Some(url) = base_url {
        config = config.with_base_url(url);
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_default_verbosity() {
            assert_eq!(Verbosity::default(), Verbosity::Normal);
        }

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(true, 3), Verbosity::Quiet);
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Debug);
        }

        #[test]
        fn test_is_verbose() {
            assert!(!Verbosity::Quiet.is_verbose());
            assert!(!Verbosity::Normal.is_verbose());
            assert!(Verbosity::Verbose.is_verbose());
            assert!(Verbosity::Debug.is_verbose());
        }

        #[test]
        fn test_filter_directives_parse() {
            for v in [
                Verbosity::Quiet,
                Verbosity::Normal,
                Verbosity::Verbose,
                Verbosity::Debug,
            ] {
                assert!(EnvFilter::try_new(v.filter_directive()).is_ok(), "{v:?}");
            }
        }
    }

    mod color_choice_tests {
        use super::*;

        #[test]
        fn test_default_color() {
            assert_eq!(ColorChoice::default(), ColorChoice::Auto);
        }

        #[test]
        fn test_should_color_fixed() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }
    }

    mod harness_config_tests {
        use super::*;
        use std::fs;

        #[test]
        fn test_defaults_without_file() {
            let config = load_harness_config(None, None).unwrap();
            assert_eq!(config.base_url, swipecheck::DEFAULT_BASE_URL);
        }

        #[test]
        fn test_flag_overrides_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("swipecheck.yaml");
            fs::write(&path, "base_url: http://from-file:3001\njobs: 3\n").unwrap();

            let from_file = load_harness_config(Some(&path), None).unwrap();
            assert_eq!(from_file.base_url, "http://from-file:3001");
            assert_eq!(from_file.jobs, 3);

            let overridden = load_harness_config(Some(&path), Some("http://flag:9000")).unwrap();
            assert_eq!(overridden.base_url, "http://flag:9000");
            assert_eq!(overridden.jobs, 3);
        }

        #[test]
        fn test_missing_file_is_config_error() {
            let err = load_harness_config(Some(Path::new("/nonexistent/sc.yaml")), None)
                .unwrap_err();
            assert!(matches!(err, CliError::Config { .. }));
        }
    }
}
