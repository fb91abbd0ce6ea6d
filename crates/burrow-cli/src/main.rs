//! Burrow CLI binary entrypoint.
//!
//! This is the main entry point for the `burrow` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use burrow_cli::cli::Cli;
use burrow_cli::commands::run;

fn main() -> ExitCode {
    // warn by default so ignored filters are visible
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout().lock();
    let mut stdin = io::stdin().lock();
    match runtime.block_on(run(&cli, &mut stdout, &mut stdin)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_validation() {
                eprintln!();
                eprintln!("{}", Cli::usage_for(&cli.command_path()));
            }
            ExitCode::FAILURE
        }
    }
}
