//! Turns Dashboard transport failures into messages a user can act on.
//!
//! The Dashboard answers an expired human session with a redirect to its
//! login page. Redirects are never followed, so the call fails with a status
//! error whose text carries [`REDIRECT_STATUS_MARKER`]. Detection is a plain
//! substring match on that text; it only changes if the Dashboard starts
//! returning a structured error code for expired sessions.

use tracing::debug;

use crate::error::CliError;

/// Status text that marks a redirected Dashboard call.
pub const REDIRECT_STATUS_MARKER: &str = "302 Found";

/// Hint appended to every other Dashboard transport failure.
pub const SESSION_HINT: &str = "session might have expired";

/// Classify an error returned by a Dashboard call.
///
/// Only [`CliError::Transport`] is rewritten; everything else passes through.
pub fn classify(err: CliError) -> CliError {
    match err {
        CliError::Transport(msg) if msg.contains(REDIRECT_STATUS_MARKER) => {
            debug!(error = %msg, "dashboard redirected, treating session as expired");
            CliError::SessionExpired
        }
        CliError::Transport(msg) if msg.contains(SESSION_HINT) => CliError::Transport(msg),
        CliError::Transport(msg) => CliError::Transport(format!("{msg} ({SESSION_HINT})")),
        other => other,
    }
}
