//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`login`] - Human login and session caching
//! - [`workspace`] - Workspace listing
//! - [`user`] - User listing
//! - [`config`] - Session file inspection

pub mod config;
pub mod login;
pub mod user;
pub mod workspace;

use std::io::{BufRead, Write};

pub use config::ConfigCommand;
pub use login::LoginCommand;
pub use user::UserCommand;
pub use workspace::WorkspaceCommand;

use crate::cli::{Cli, Commands, UserCommands, WorkspaceCommands};
use crate::error::CliError;
use crate::output::OutputFormat;
use crate::transport::{config_store, select};

/// Run the parsed command line.
///
/// # Errors
///
/// Returns the first error raised by backend selection or the command.
pub async fn run<W: Write, R: BufRead>(
    cli: &Cli,
    writer: &mut W,
    stdin: &mut R,
) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);

    match &cli.command {
        Commands::Login(args) => {
            let cmd = LoginCommand::new(&cli.connect);
            cmd.execute(writer, &format, args, stdin).await?;
        }
        Commands::Workspace { command } => {
            let WorkspaceCommands::List(args) = command;
            check_filters(&args.filters)?;
            let backend = select(&cli.connect).await?;
            let cmd = WorkspaceCommand::new(&backend);
            cmd.execute(writer, &format, command).await?;
        }
        Commands::User { command } => {
            let UserCommands::List(args) = command;
            check_filters(&args.filters)?;
            let backend = select(&cli.connect).await?;
            let cmd = UserCommand::new(&backend);
            cmd.execute(writer, &format, command).await?;
        }
        Commands::Config { command } => {
            let store = config_store(&cli.connect)?;
            let cmd = ConfigCommand::new(&store);
            cmd.execute(writer, &format, command)?;
        }
    }
    Ok(())
}

/// Reject malformed filters before any backend is contacted.
fn check_filters(filters: &[String]) -> Result<(), CliError> {
    burrow_filter::parse(filters)?;
    Ok(())
}
