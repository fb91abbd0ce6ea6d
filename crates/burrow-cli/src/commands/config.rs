//! Session file command implementation.

use std::io::Write;

use burrow_config::ConfigStore;

use crate::cli::ConfigCommands;
use crate::error::CliError;
use crate::output::{OutputFormat, SessionView};

/// Config command executor.
pub struct ConfigCommand<'a> {
    store: &'a ConfigStore,
}

impl<'a> ConfigCommand<'a> {
    /// Create a new config command.
    #[must_use]
    pub fn new(store: &'a ConfigStore) -> Self {
        Self { store }
    }

    /// Execute a config subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be read or output fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &ConfigCommands,
    ) -> Result<(), CliError> {
        match command {
            ConfigCommands::View => {
                let session = self.store.load()?;
                format.write(writer, &SessionView::new(self.store.path(), &session))?;
            }
        }
        Ok(())
    }
}
