//! User command implementation.

use std::io::Write;

use burrow_filter::{apply_all, parse};

use crate::api::WorkspaceApi;
use crate::cli::{UserCommands, UserListArgs};
use crate::error::CliError;
use crate::output::{OutputFormat, UserList};
use crate::types::User;

/// User command executor.
pub struct UserCommand<'a, A> {
    api: &'a A,
}

impl<'a, A: WorkspaceApi> UserCommand<'a, A> {
    /// Create a new user command.
    #[must_use]
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Execute a user subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the filters are malformed, the backend call
    /// fails, or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &UserCommands,
    ) -> Result<(), CliError> {
        match command {
            UserCommands::List(args) => {
                let items = self.list(args).await?;
                format.write(writer, &UserList { items })?;
            }
        }
        Ok(())
    }

    /// List the users selected by `args`.
    pub async fn list(&self, args: &UserListArgs) -> Result<Vec<User>, CliError> {
        let filters = parse(&args.filters)?;
        let items = self.api.list_users().await?;
        Ok(apply_all(items, &filters))
    }
}
