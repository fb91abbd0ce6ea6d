//! Dashboard API client.
//!
//! The Dashboard speaks Connect-style JSON RPC: every procedure is a `POST`
//! to `<base>/<package>.<Service>/<Method>` with a JSON body. Sessions are
//! carried in a cookie set by the login procedures.
//!
//! # Example
//!
//! ```rust,no_run
//! use burrow_cli::dashboard::{DashboardClient, TrustRoots, build_http_client};
//!
//! # async fn example() -> Result<(), burrow_cli::CliError> {
//! let http = build_http_client(TrustRoots::System)?;
//! let client = DashboardClient::new("https://dashboard.example.com", http)?;
//! let reply = client.login("alice", "secret").await?;
//! println!("logged in as {}", reply.user_name);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::redirect::Policy;
use reqwest::{Certificate, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::credentials::{decode_token, session_cookie};
use crate::error::{CliError, error_chain};
use crate::types::{User, Workspace};

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PEM_CERT_HEADER: &str = "-----BEGIN CERTIFICATE-----";

const LOGIN: &str = "dashboard.v1alpha1.AuthService/Login";
const SERVICE_ACCOUNT_LOGIN: &str = "dashboard.v1alpha1.AuthService/ServiceAccountLogin";
const VERIFY: &str = "dashboard.v1alpha1.AuthService/Verify";
const GET_WORKSPACES: &str = "dashboard.v1alpha1.WorkspaceService/GetWorkspaces";
const GET_USERS: &str = "dashboard.v1alpha1.UserService/GetUsers";

/// Which certificate authorities an HTTP client trusts.
#[derive(Debug, Clone, Copy)]
pub enum TrustRoots<'a> {
    /// The platform's built-in roots.
    System,
    /// Built-in roots plus a private CA bundle.
    Extra(&'a [u8]),
    /// Only the given CA bundle.
    Only(&'a [u8]),
}

/// Build an HTTP client with bounded timeouts that never follows redirects.
pub fn build_http_client(roots: TrustRoots<'_>) -> Result<Client, CliError> {
    build_http_client_with_timeout(roots, DEFAULT_REQUEST_TIMEOUT)
}

/// Like [`build_http_client`] with a custom request timeout.
pub fn build_http_client_with_timeout(
    roots: TrustRoots<'_>,
    timeout: Duration,
) -> Result<Client, CliError> {
    let mut builder = Client::builder()
        .redirect(Policy::none())
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(timeout);

    match roots {
        TrustRoots::System => {}
        TrustRoots::Extra(pem) => {
            for cert in parse_pem_bundle(pem)? {
                builder = builder.add_root_certificate(cert);
            }
        }
        TrustRoots::Only(pem) => {
            builder = builder.tls_built_in_root_certs(false);
            for cert in parse_pem_bundle(pem)? {
                builder = builder.add_root_certificate(cert);
            }
        }
    }

    builder
        .build()
        .map_err(|e| CliError::transport("building HTTP client", &e))
}

/// Parse a PEM bundle containing at least one certificate.
pub fn parse_pem_bundle(pem: &[u8]) -> Result<Vec<Certificate>, CliError> {
    let text = String::from_utf8_lossy(pem);
    if !text.contains(PEM_CERT_HEADER) {
        return Err(CliError::Protocol(
            "CA bundle does not contain a PEM certificate".into(),
        ));
    }
    let certs = Certificate::from_pem_bundle(pem).map_err(|e| {
        CliError::Protocol(format!("invalid CA certificate: {}", error_chain(&e)))
    })?;
    if certs.is_empty() {
        return Err(CliError::Protocol(
            "CA bundle does not contain a PEM certificate".into(),
        ));
    }
    Ok(certs)
}

/// Dashboard API client bound to one base URL.
#[derive(Clone)]
pub struct DashboardClient {
    http: Client,
    base_url: Url,
    cookie: Option<String>,
}

impl std::fmt::Debug for DashboardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_session", &self.cookie.is_some())
            .finish_non_exhaustive()
    }
}

impl DashboardClient {
    /// Create a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the URL is not `http://` or `https://`.
    pub fn new(base_url: &str, http: Client) -> Result<Self, CliError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| CliError::Validation(format!("invalid dashboard URL '{base_url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CliError::Validation(format!(
                "invalid dashboard URL '{base_url}': must start with http:// or https://"
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url: url,
            cookie: None,
        })
    }

    /// Attach a stored session token; it is replayed as a cookie.
    pub fn with_session_token(mut self, token: &str) -> Result<Self, CliError> {
        self.cookie = Some(decode_token(token)?);
        Ok(self)
    }

    /// The base URL all procedures are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Log in with a user name and password.
    pub async fn login(&self, user: &str, password: &str) -> Result<LoginReply, CliError> {
        let request = LoginRequest {
            user_name: user,
            password,
        };
        let (response, cookies): (LoginResponse, _) = self.call(LOGIN, &request).await?;
        if response.require_password_update {
            debug!(user = %user, "dashboard requests a password update");
        }
        LoginReply::from_cookies(LOGIN, &cookies, response.user_name, user)
    }

    /// Log in with a platform identity token.
    pub async fn service_account_login(&self, token: &str) -> Result<LoginReply, CliError> {
        let request = ServiceAccountLoginRequest { token };
        let (response, cookies): (ServiceAccountLoginResponse, _) =
            self.call(SERVICE_ACCOUNT_LOGIN, &request).await?;
        if response.user_name.is_empty() {
            return Err(CliError::Protocol(format!(
                "{SERVICE_ACCOUNT_LOGIN}: response carries no user name"
            )));
        }
        LoginReply::from_cookies(SERVICE_ACCOUNT_LOGIN, &cookies, response.user_name, "")
    }

    /// Check that the attached session is still accepted.
    pub async fn verify(&self) -> Result<VerifyResponse, CliError> {
        let (response, _) = self.call(VERIFY, &Empty {}).await?;
        Ok(response)
    }

    /// List the workspaces of `user`.
    pub async fn get_workspaces(&self, user: &str) -> Result<Vec<Workspace>, CliError> {
        let request = GetWorkspacesRequest { user_name: user };
        let (response, _): (ItemsResponse<Workspace>, _) =
            self.call(GET_WORKSPACES, &request).await?;
        Ok(response.items)
    }

    /// List all users.
    pub async fn get_users(&self) -> Result<Vec<User>, CliError> {
        let (response, _): (ItemsResponse<User>, _) = self.call(GET_USERS, &Empty {}).await?;
        Ok(response.items)
    }

    /// Invoke a procedure; returns the decoded body and any `Set-Cookie` values.
    async fn call<Req, Resp>(
        &self,
        procedure: &str,
        request: &Req,
    ) -> Result<(Resp, Vec<String>), CliError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(procedure)
            .map_err(|e| CliError::Validation(format!("invalid procedure URL: {e}")))?;

        trace!(url = %url, "calling dashboard");
        let mut builder = self
            .http
            .post(url)
            .header("Connect-Protocol-Version", "1")
            .json(request);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CliError::transport(procedure, &e))?;

        let status = response.status();
        let cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(
                        procedure,
                        status = %status,
                        error = %error_chain(&e),
                        "failed to read error body"
                    );
                    String::new()
                }
            };
            return Err(status_error(procedure, status, &body));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CliError::transport(procedure, &e))?;
        let decoded = serde_json::from_slice(&body)
            .map_err(|e| CliError::Protocol(format!("{procedure}: {e}")))?;

        debug!(procedure, status = %status, "dashboard call succeeded");
        Ok((decoded, cookies))
    }
}

fn status_error(procedure: &str, status: StatusCode, body: &str) -> CliError {
    let detail = serde_json::from_str::<ConnectError>(body)
        .ok()
        .map(|e| e.message)
        .filter(|m| !m.is_empty());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CliError::Auth(detail.unwrap_or_else(|| format!("{procedure}: {status}")))
        }
        StatusCode::NOT_FOUND if detail.is_some() => {
            CliError::NotFound(detail.unwrap_or_default())
        }
        _ => CliError::Transport(match detail {
            Some(detail) => format!("{procedure}: unexpected status {status}: {detail}"),
            None => format!("{procedure}: unexpected status {status}"),
        }),
    }
}

/// Outcome of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginReply {
    /// Raw session cookie (`name=value` pairs).
    pub cookie: String,
    /// Identity name the Dashboard assigned.
    pub user_name: String,
}

impl LoginReply {
    fn from_cookies(
        procedure: &str,
        cookies: &[String],
        user_name: String,
        fallback_user: &str,
    ) -> Result<Self, CliError> {
        let cookie = session_cookie(cookies).ok_or_else(|| {
            CliError::Protocol(format!("{procedure}: response carries no session cookie"))
        })?;
        let user_name = if user_name.is_empty() {
            fallback_user.to_string()
        } else {
            user_name
        };
        Ok(Self { cookie, user_name })
    }
}

/// Response of the verify procedure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyResponse {
    /// User the session belongs to.
    pub user_name: String,
    /// Session expiry as reported by the server.
    pub expire_at: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    user_name: &'a str,
    password: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct LoginResponse {
    user_name: String,
    require_password_update: bool,
}

#[derive(Serialize)]
struct ServiceAccountLoginRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ServiceAccountLoginResponse {
    user_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetWorkspacesRequest<'a> {
    user_name: &'a str,
}

#[derive(Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct ItemsResponse<T> {
    #[serde(default)]
    items: Vec<T>,
}

#[derive(Serialize)]
struct Empty {}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ConnectError {
    message: String,
}
