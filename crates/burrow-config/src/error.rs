//! Session store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Session store error variants.
#[derive(Debug, Error)]
pub enum Error {
    /// The session file exists but is not a valid session document.
    #[error("failed to parse session file '{path}': {source}")]
    Parse {
        /// Path of the malformed file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the session file failed.
    #[error("session file '{path}': {source}")]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The cached CA certificate is not valid base64.
    #[error("invalid CA certificate encoding: {0}")]
    CaEncoding(String),

    /// No home directory could be determined for the default path.
    #[error("cannot determine home directory; pass --config or set BURROW_CONFIG")]
    HomeNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display_includes_path() {
        let err = Error::Io {
            path: PathBuf::from("/tmp/burrow/config.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/burrow/config.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn parse_error_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::Parse {
            path: PathBuf::from("config.json"),
            source,
        };
        assert!(err.to_string().starts_with("failed to parse session file 'config.json'"));
    }

    #[test]
    fn home_not_found_mentions_override() {
        assert!(Error::HomeNotFound.to_string().contains("BURROW_CONFIG"));
    }
}
