//! Swipecheck CLI: run end-to-end scenarios against a dating web client
//!
//! ## Usage
//!
//! ```bash
//! swipecheck list                              # List every scenario
//! swipecheck run                               # Run everything in Chromium
//! swipecheck run swipe messaging::send_message # Filter by suite or id
//! swipecheck run --backend mock --report r.json
//! swipecheck config --config swipecheck.yaml   # Show the effective config
//! ```
//!
//! Exit status: 0 when every scenario passed, 1 when any failed or timed
//! out, 2 on usage or setup errors.

use clap::Parser;
use std::process::ExitCode;
use swipecheck::HarnessConfig;
use swipecheck_cli::{
    apply_run_args, execute_run, load_harness_config, render_list, Cli, CliConfig, CliError,
    CliResult, Commands, ConfigArgs, ProgressReporter, RunArgs, Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether every scenario passed
fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    config.init_logging();

    match &cli.command {
        Commands::List(args) => {
            println!("{}", render_list(&args.filter, args.format)?);
            Ok(true)
        }
        Commands::Run(args) => {
            let harness = load_harness_config(cli.config.as_deref(), cli.base_url.as_deref())?;
            run_scenarios(&config, apply_run_args(harness, args), args)
        }
        Commands::Config(args) => {
            show_config(&cli, args)?;
            Ok(true)
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_json(cli.log_json)
}

fn run_scenarios(config: &CliConfig, harness: HarnessConfig, args: &RunArgs) -> CliResult<bool> {
    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::config(format!("cannot start async runtime: {e}")))?;
    let report = runtime.block_on(execute_run(harness, args, &mut reporter))?;
    Ok(report.all_passed())
}

fn show_config(cli: &Cli, args: &ConfigArgs) -> CliResult<()> {
    let harness = if args.default {
        HarnessConfig::new()
    } else {
        load_harness_config(cli.config.as_deref(), cli.base_url.as_deref())?
    };
    print!("{}", harness.to_yaml()?);
    Ok(())
}
