//! Workspace command implementation.

use std::io::Write;

use burrow_filter::{apply_all, parse};
use tracing::debug;

use crate::api::WorkspaceApi;
use crate::cli::{WorkspaceCommands, WorkspaceListArgs};
use crate::error::CliError;
use crate::output::{OutputFormat, WorkspaceList};
use crate::types::Workspace;

/// Workspace command executor.
pub struct WorkspaceCommand<'a, A> {
    api: &'a A,
}

impl<'a, A: WorkspaceApi> WorkspaceCommand<'a, A> {
    /// Create a new workspace command.
    #[must_use]
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Execute a workspace subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the filters are malformed, the owner cannot be
    /// determined, the backend call fails, or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &WorkspaceCommands,
    ) -> Result<(), CliError> {
        match command {
            WorkspaceCommands::List(args) => {
                let items = self.list(args).await?;
                format.write(writer, &WorkspaceList { items })?;
            }
        }
        Ok(())
    }

    /// List the workspaces selected by `args`.
    pub async fn list(&self, args: &WorkspaceListArgs) -> Result<Vec<Workspace>, CliError> {
        let filters = parse(&args.filters)?;
        let user = args
            .user
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.api.current_user())
            .ok_or_else(|| {
                CliError::Validation("--user is required when no session user is known".into())
            })?;

        let items = self.api.list_workspaces(user).await?;
        debug!(user = %user, count = items.len(), "fetched workspaces");
        Ok(apply_all(items, &filters))
    }
}
