//! CLI error types.

use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad flag combination or missing required value. Detected before any
    /// network activity.
    #[error("{0}")]
    Validation(String),

    /// DNS, connect, TLS, timeout or unexpected HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The authentication service rejected the credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The Dashboard redirected a call, which means the human session is gone.
    #[error("session has been expired: please login again")]
    SessionExpired,

    /// The requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed response from a server.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Session file could not be read or written.
    #[error("configuration error: {0}")]
    Config(#[from] burrow_config::Error),

    /// Malformed `--filter` expression.
    #[error(transparent)]
    Filter(#[from] burrow_filter::FilterError),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Build a transport error from an underlying failure, keeping its
    /// source chain in the message.
    pub fn transport(context: &str, err: &(dyn std::error::Error + 'static)) -> Self {
        Self::Transport(format!("{context}: {}", error_chain(err)))
    }

    /// Whether the error was raised before any network activity.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Filter(_))
    }
}

/// Render an error and all of its sources on one line.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn validation_display_is_bare() {
        let err = CliError::Validation("--user is required".into());
        assert_eq!(err.to_string(), "--user is required");
        assert!(err.is_validation());
    }

    #[test]
    fn session_expired_display() {
        assert_eq!(
            CliError::SessionExpired.to_string(),
            "session has been expired: please login again"
        );
    }

    #[test]
    fn transport_keeps_source_chain() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = CliError::transport("Verify", &Outer(inner));
        assert_eq!(err.to_string(), "transport error: Verify: outer: connection refused");
        assert!(!err.is_validation());
    }

    #[test]
    fn filter_error_converts() {
        let err: CliError = burrow_filter::Filter::parse("bogus").unwrap_err().into();
        assert!(err.is_validation());
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
