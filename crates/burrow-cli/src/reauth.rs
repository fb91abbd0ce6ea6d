//! Session verification with a single re-authentication.
//!
//! Used on the platform-identity path only. A workload's session is checked
//! against the Dashboard before use; if it was rejected, trust and
//! credentials are re-established exactly once.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use burrow_config::ConfigStore;
use burrow_config::session::Session;
use tracing::{debug, info, warn};

use crate::credentials::login_with_platform_identity;
use crate::dashboard::DashboardClient;
use crate::error::CliError;
use crate::trust::{fetch_ca_cert, trusted_client};

/// Boxed future returned by [`PlatformAuth`] methods.
pub type AuthFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CliError>> + Send + 'a>>;

/// Session obtained from a platform-identity login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformLogin {
    /// Encoded session token.
    pub token: String,
    /// User name the Dashboard assigned.
    pub user: String,
}

/// Network operations needed to establish and check a platform session.
pub trait PlatformAuth: Send + Sync {
    /// Fetch the Dashboard CA.
    fn bootstrap(&self) -> AuthFuture<'_, Vec<u8>>;

    /// Log in with the platform identity, trusting only `ca_pem`.
    fn login<'a>(&'a self, endpoint: &'a str, ca_pem: &'a [u8]) -> AuthFuture<'a, PlatformLogin>;

    /// Check that `token` is still accepted.
    fn verify<'a>(
        &'a self,
        endpoint: &'a str,
        ca_pem: &'a [u8],
        token: &'a str,
    ) -> AuthFuture<'a, ()>;
}

/// [`PlatformAuth`] backed by the real bootstrap endpoint and Dashboard.
#[derive(Debug, Clone)]
pub struct DashboardPlatformAuth {
    bootstrap_url: String,
    token_path: PathBuf,
}

impl DashboardPlatformAuth {
    /// Create an authenticator.
    pub fn new(bootstrap_url: impl Into<String>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            bootstrap_url: bootstrap_url.into(),
            token_path: token_path.into(),
        }
    }
}

impl PlatformAuth for DashboardPlatformAuth {
    fn bootstrap(&self) -> AuthFuture<'_, Vec<u8>> {
        Box::pin(async move { fetch_ca_cert(&self.bootstrap_url).await })
    }

    fn login<'a>(&'a self, endpoint: &'a str, ca_pem: &'a [u8]) -> AuthFuture<'a, PlatformLogin> {
        Box::pin(async move {
            let client = DashboardClient::new(endpoint, trusted_client(ca_pem)?)?;
            let (token, user) = login_with_platform_identity(&client, &self.token_path).await?;
            Ok(PlatformLogin { token, user })
        })
    }

    fn verify<'a>(
        &'a self,
        endpoint: &'a str,
        ca_pem: &'a [u8],
        token: &'a str,
    ) -> AuthFuture<'a, ()> {
        Box::pin(async move {
            let client =
                DashboardClient::new(endpoint, trusted_client(ca_pem)?)?.with_session_token(token)?;
            client.verify().await?;
            Ok(())
        })
    }
}

/// How [`ensure_valid`] arrived at a usable session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Cached session was accepted as is.
    Verified,
    /// No CA was cached; trust and session were established from scratch.
    Bootstrapped,
    /// Cached session was rejected and replaced once.
    Reauthenticated,
}

/// Make sure `session` holds a CA and a token the Dashboard accepts.
///
/// Bootstraps when no CA is cached. Otherwise verifies the cached session
/// and, on failure, re-bootstraps and logs in again exactly once. The
/// session is persisted whenever it changes. A second verification failure
/// is an [`CliError::Auth`].
pub async fn ensure_valid<A: PlatformAuth>(
    session: &mut Session,
    auth: &A,
    store: &ConfigStore,
) -> Result<Outcome, CliError> {
    if session.endpoint.is_empty() {
        return Err(CliError::Validation(
            "no dashboard endpoint: set --dashboard-url or BURROW_DASHBOARD_URL".into(),
        ));
    }

    let cached_ca = match session.ca_pem() {
        Ok(ca) => ca,
        Err(e) => {
            warn!(error = %e, "cached CA is unreadable, bootstrapping again");
            None
        }
    };

    let Some(ca) = cached_ca else {
        debug!(endpoint = %session.endpoint, "no cached CA, bootstrapping");
        let ca = establish(session, auth).await?;
        auth.verify(&session.endpoint, &ca, &session.token).await?;
        store.save(session)?;
        info!(user = %session.user, "platform session established");
        return Ok(Outcome::Bootstrapped);
    };

    match auth.verify(&session.endpoint, &ca, &session.token).await {
        Ok(()) => {
            debug!(user = %session.user, "cached session verified");
            Ok(Outcome::Verified)
        }
        Err(first) => {
            warn!(error = %first, "session rejected, re-authenticating");
            let ca = establish(session, auth)
                .await
                .map_err(|e| CliError::Auth(format!("re-authentication failed: {e}")))?;
            store.save(session)?;

            auth.verify(&session.endpoint, &ca, &session.token)
                .await
                .map_err(|e| {
                    CliError::Auth(format!("session rejected after re-authentication: {e}"))
                })?;
            info!(user = %session.user, "platform session re-established");
            Ok(Outcome::Reauthenticated)
        }
    }
}

/// Bootstrap the CA and log in, writing the result into `session`.
async fn establish<A: PlatformAuth>(session: &mut Session, auth: &A) -> Result<Vec<u8>, CliError> {
    let ca = auth.bootstrap().await?;
    let login = auth.login(&session.endpoint, &ca).await?;

    session.set_ca_pem(&ca);
    session.token = login.token;
    session.user = login.user;
    session.use_platform_identity = true;
    Ok(ca)
}
