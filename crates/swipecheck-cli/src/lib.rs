//! Swipecheck CLI library
//!
//! Argument parsing, configuration layering, progress output and the
//! `run`/`list` implementations behind the `swipecheck` binary.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{Backend, Cli, ColorArg, Commands, ConfigArgs, ListArgs, ListFormat, RunArgs};
pub use config::{load_harness_config, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use runner::{apply_run_args, execute_run, render_list, write_report, ReportFile};
