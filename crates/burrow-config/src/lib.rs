//! Session store for the Burrow CLI.
//!
//! Provides [`ConfigStore`], a single JSON file holding the [`Session`] that
//! lets later invocations skip logging in again.
//!
//! The file is read once near the start of an invocation and written at most
//! once near the end. There is no locking: two concurrent logins on the same
//! machine race and the later writer wins.

#![forbid(unsafe_code)]

pub mod error;
pub mod session;

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

pub use error::{Error, Result};
pub use session::{Session, redact};

/// Environment variable overriding the session file location.
pub const CONFIG_PATH_ENV: &str = "BURROW_CONFIG";

/// Default session file location relative to the home directory.
pub const DEFAULT_CONFIG_RELATIVE_PATH: &str = ".config/burrow/config.json";

/// Resolve the session file path.
///
/// `explicit` is the value of `--config`, which clap already merges with
/// [`CONFIG_PATH_ENV`]. Falls back to `<home>/.config/burrow/config.json`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path.to_path_buf());
    }
    let home = dirs::home_dir().ok_or(Error::HomeNotFound)?;
    Ok(home.join(DEFAULT_CONFIG_RELATIVE_PATH))
}

/// JSON file-backed session store.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a store bound to `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session.
    ///
    /// A missing file yields an empty [`Session`]. A file that exists but
    /// does not parse is a hard error; nothing is recovered from it.
    pub fn load(&self) -> Result<Session> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no session file, starting empty");
                return Ok(Session::default());
            }
            Err(source) => {
                return Err(Error::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let session: Session = serde_json::from_slice(&raw).map_err(|source| Error::Parse {
            path: self.path.clone(),
            source,
        })?;
        debug!(
            path = %self.path.display(),
            user = %session.user,
            platform = session.use_platform_identity,
            "loaded session"
        );
        Ok(session)
    }

    /// Persist the whole session, replacing the file contents.
    ///
    /// Parent directories are created as needed. The file is owner
    /// read/write only.
    pub fn save(&self, session: &Session) -> Result<()> {
        let io_err = |source| Error::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent).map_err(io_err)?;
        }

        let mut body = serde_json::to_vec_pretty(session).map_err(|e| Error::Io {
            path: self.path.clone(),
            source: std::io::Error::other(e),
        })?;
        body.push(b'\n');

        let mut file = open_private(&self.path).map_err(io_err)?;
        file.write_all(&body).map_err(io_err)?;
        restrict_permissions(&self.path).map_err(io_err)?;

        debug!(path = %self.path.display(), user = %session.user, "saved session");
        Ok(())
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

// An existing file keeps its old mode on open, so tighten it explicitly.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
