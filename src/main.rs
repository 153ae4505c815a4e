//! ferry CLI - deploy a local file tree over FTP or SFTP
//!
//! Usage: ferry <COMMAND>
//!
//! Commands:
//!   deploy  Connect and run the actions
//!   plan    Compile and print the actions without connecting
//!
//! Exit codes: 0 success, 1 some action failed, 2 configuration or input error

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::deploy::{cmd_deploy, Reporting};
use commands::inputs::{load, print_config_warnings};
use commands::plan::cmd_plan;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let reporting = Reporting {
        json: cli.json,
        ci: cli.ci,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Deploy { input, dry_run } => {
            let (raw, warnings) = load(&input)?;
            init_tracing(raw.debug_enabled() || cli.verbose >= 2);
            print_config_warnings(&warnings);
            cmd_deploy(raw.validate()?, dry_run, reporting)
        }
        Commands::Plan { input } => {
            let (raw, warnings) = load(&input)?;
            init_tracing(raw.debug_enabled() || cli.verbose >= 2);
            print_config_warnings(&warnings);
            cmd_plan(&raw.validate_plan()?, cli.json)
        }
    }
}

/// Diagnostics go to stderr; `RUST_LOG` wins over the debug flag
fn init_tracing(debug: bool) {
    let fallback = if debug { "ferry=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}
