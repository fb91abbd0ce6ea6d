//! Picks the backend for an invocation.
//!
//! `--direct` goes straight to the cluster API. Otherwise the Dashboard is
//! used, either with the cached human session or with the platform identity
//! of the workload the CLI runs in.

use burrow_config::{ConfigStore, Session, resolve_config_path};
use tracing::debug;

use crate::api::Backend;
use crate::cli::ConnectOpts;
use crate::cluster::DirectClient;
use crate::dashboard::{DashboardClient, TrustRoots, build_http_client};
use crate::error::CliError;
use crate::reauth::{DashboardPlatformAuth, ensure_valid};
use crate::trust::{ClusterLocation, trusted_client};

/// Message shown when there is no usable human session.
pub const NOT_LOGGED_IN: &str = "not logged in: run 'burrow login <user>' first";

/// Which identity talks to the Dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    /// Cached session of a person who ran `burrow login`.
    Human,
    /// Session derived from the workload's platform identity token.
    Platform,
}

/// Decide the identity mode.
///
/// Platform when the session says so, or when nothing was ever cached and
/// a platform identity token is mounted.
pub fn identity_mode(session: &Session, token_present: bool) -> IdentityMode {
    if session.use_platform_identity || (session.is_empty() && token_present) {
        IdentityMode::Platform
    } else {
        IdentityMode::Human
    }
}

/// Resolve the Dashboard URL.
///
/// Explicit URL first, then the cached one. The in-cluster address is used
/// only when the session is completely empty.
pub fn resolve_endpoint(
    explicit: Option<&str>,
    session: &Session,
    location: &ClusterLocation,
) -> Option<String> {
    if let Some(url) = explicit.filter(|u| !u.is_empty()) {
        return Some(url.to_string());
    }
    if !session.endpoint.is_empty() {
        return Some(session.endpoint.clone());
    }
    session.is_empty().then(|| location.dashboard_url())
}

/// Session store selected by the connection options.
pub fn config_store(opts: &ConnectOpts) -> Result<ConfigStore, CliError> {
    Ok(ConfigStore::new(resolve_config_path(opts.config.as_deref())?))
}

/// Select and connect the backend.
pub async fn select(opts: &ConnectOpts) -> Result<Backend, CliError> {
    if opts.direct {
        debug!("using the cluster API directly");
        let client =
            DirectClient::resolve(opts.kubeconfig_path().as_deref(), opts.context.as_deref())
                .await?;
        return Ok(Backend::Direct(client));
    }

    let store = config_store(opts)?;
    let mut session = store.load()?;
    let location = opts.location();

    let token_path = opts.identity_token_path();
    let mode = identity_mode(&session, token_path.is_file());
    let endpoint = resolve_endpoint(opts.dashboard_url(), &session, &location);
    debug!(
        ?mode,
        endpoint = ?endpoint,
        config = %store.path().display(),
        "selected dashboard transport"
    );

    match mode {
        IdentityMode::Platform => {
            let endpoint = endpoint.ok_or_else(|| {
                CliError::Validation(
                    "no dashboard endpoint: set --dashboard-url or BURROW_DASHBOARD_URL".into(),
                )
            })?;
            session.endpoint = endpoint;

            let auth = DashboardPlatformAuth::new(opts.bootstrap_url(), token_path);
            ensure_valid(&mut session, &auth, &store).await?;

            let ca = session.ca_pem()?.ok_or_else(|| {
                CliError::Protocol("platform session has no CA after bootstrap".into())
            })?;
            let client = DashboardClient::new(&session.endpoint, trusted_client(&ca)?)?
                .with_session_token(&session.token)?;
            Ok(Backend::Facade {
                client,
                user: session.user,
            })
        }
        IdentityMode::Human => {
            let endpoint = endpoint
                .filter(|_| session.has_token())
                .ok_or_else(|| CliError::Validation(NOT_LOGGED_IN.into()))?;

            let ca = session.ca_pem()?;
            let roots = ca.as_deref().map_or(TrustRoots::System, TrustRoots::Extra);
            let client = DashboardClient::new(&endpoint, build_http_client(roots)?)?
                .with_session_token(&session.token)?;
            Ok(Backend::Facade {
                client,
                user: session.user,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn human_session() -> Session {
        Session {
            endpoint: "https://dash.example.com".into(),
            token: crate::credentials::encode_token("burrow-session=abc"),
            user: "alice".into(),
            ..Session::default()
        }
    }

    #[test_case(Session::default(), true => IdentityMode::Platform ; "empty session with token file")]
    #[test_case(Session::default(), false => IdentityMode::Human ; "empty session without token file")]
    #[test_case(human_session(), true => IdentityMode::Human ; "human session ignores token file")]
    #[test_case(Session { use_platform_identity: true, ..human_session() }, false => IdentityMode::Platform ; "platform flag wins")]
    fn detects_identity_mode(session: Session, token_present: bool) -> IdentityMode {
        identity_mode(&session, token_present)
    }

    #[test]
    fn endpoint_precedence() {
        let location = ClusterLocation::default();
        let session = human_session();

        assert_eq!(
            resolve_endpoint(Some("https://flag"), &session, &location).as_deref(),
            Some("https://flag")
        );
        assert_eq!(
            resolve_endpoint(None, &session, &location).as_deref(),
            Some("https://dash.example.com")
        );
        assert_eq!(
            resolve_endpoint(None, &Session::default(), &location),
            Some(location.dashboard_url())
        );
    }

    #[test]
    fn in_cluster_endpoint_only_for_empty_session() {
        let session = Session {
            user: "alice".into(),
            ..Session::default()
        };
        assert_eq!(resolve_endpoint(None, &session, &ClusterLocation::default()), None);
    }

    fn opts(dir: &tempfile::TempDir) -> ConnectOpts {
        ConnectOpts {
            config: Some(dir.path().join("config.json")),
            identity_token_file: Some(dir.path().join("token")),
            ..ConnectOpts::default()
        }
    }

    #[tokio::test]
    async fn empty_session_without_token_is_not_logged_in() {
        let dir = tempfile::tempdir().unwrap();
        let err = select(&opts(&dir)).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), NOT_LOGGED_IN);
    }

    #[tokio::test]
    async fn human_session_builds_facade_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let options = opts(&dir);
        ConfigStore::new(options.config.clone().unwrap())
            .save(&human_session())
            .unwrap();

        let backend = select(&options).await.unwrap();
        match backend {
            Backend::Facade { client, user } => {
                assert_eq!(user, "alice");
                assert_eq!(client.base_url().as_str(), "https://dash.example.com/");
            }
            Backend::Direct(_) => panic!("expected facade backend"),
        }
    }

    #[tokio::test]
    async fn malformed_session_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let options = opts(&dir);
        std::fs::write(options.config.as_ref().unwrap(), "{not json").unwrap();

        let err = select(&options).await.unwrap_err();
        assert!(matches!(err, CliError::Config(burrow_config::Error::Parse { .. })));
    }

    #[tokio::test]
    async fn direct_with_explicit_kubeconfig() {
        let dir = tempfile::tempdir().unwrap();
        let kubeconfig = dir.path().join("kubeconfig");
        std::fs::write(
            &kubeconfig,
            "current-context: c\nclusters:\n- name: k\n  cluster:\n    server: https://10.0.0.1:6443\ncontexts:\n- name: c\n  context:\n    cluster: k\n    user: u\nusers:\n- name: u\n  user:\n    token: t\n",
        )
        .unwrap();
        let options = ConnectOpts {
            direct: true,
            kubeconfig: Some(kubeconfig.display().to_string()),
            ..opts(&dir)
        };

        let backend = select(&options).await.unwrap();
        assert!(backend.is_direct());
    }
}
