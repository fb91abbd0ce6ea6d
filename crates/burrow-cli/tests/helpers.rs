//! Test helpers: an in-process stub of the Dashboard API.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{Router, get, post};
use serde::Deserialize;
use serde_json::json;

/// Cookie the stub hands out and accepts.
pub const SESSION_COOKIE: &str = "burrow-session=stub-session-1";

/// Password the stub accepts for every user.
pub const PASSWORD: &str = "secret";

/// Cookie the stub hands out for a platform identity login.
pub const PLATFORM_COOKIE: &str = "burrow-session=stub-platform-1";

/// Identity token the stub accepts.
pub const IDENTITY_TOKEN: &str = "stub-identity-token";

/// User name assigned to the platform identity.
pub const PLATFORM_USER: &str = "system-serviceaccount-burrow-ci";

/// CA certificate served on the bootstrap route.
pub const CA_CERT: &str = include_str!("fixtures/client.crt");

#[derive(Default)]
struct StubState {
    expired: AtomicBool,
    logins: AtomicUsize,
    platform_logins: AtomicUsize,
    ca_fetches: AtomicUsize,
    verifies: AtomicUsize,
    workspace_calls: AtomicUsize,
}

/// Stub Dashboard bound to an ephemeral loopback port.
pub struct StubDashboard {
    addr: SocketAddr,
    state: Arc<StubState>,
    handle: tokio::task::JoinHandle<()>,
}

impl StubDashboard {
    /// Start the stub.
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let router = Router::new()
            .route("/ca.crt", get(ca_cert))
            .route("/dashboard.v1alpha1.AuthService/Login", post(login))
            .route(
                "/dashboard.v1alpha1.AuthService/ServiceAccountLogin",
                post(service_account_login),
            )
            .route("/dashboard.v1alpha1.AuthService/Verify", post(verify))
            .route(
                "/dashboard.v1alpha1.WorkspaceService/GetWorkspaces",
                post(get_workspaces),
            )
            .route("/dashboard.v1alpha1.UserService/GetUsers", post(get_users))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, state, handle }
    }

    /// Base URL of the stub.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL of the plaintext CA route.
    pub fn ca_url(&self) -> String {
        format!("{}/ca.crt", self.url())
    }

    /// Make every data call answer with a redirect to the login page.
    pub fn expire_sessions(&self) {
        self.state.expired.store(true, Ordering::SeqCst);
    }

    /// Number of login calls received.
    pub fn logins(&self) -> usize {
        self.state.logins.load(Ordering::SeqCst)
    }

    /// Number of platform identity logins received.
    pub fn platform_logins(&self) -> usize {
        self.state.platform_logins.load(Ordering::SeqCst)
    }

    /// Number of CA downloads.
    pub fn ca_fetches(&self) -> usize {
        self.state.ca_fetches.load(Ordering::SeqCst)
    }

    /// Number of session verifications received.
    pub fn verifies(&self) -> usize {
        self.state.verifies.load(Ordering::SeqCst)
    }

    /// Number of workspace list calls received.
    pub fn workspace_calls(&self) -> usize {
        self.state.workspace_calls.load(Ordering::SeqCst)
    }
}

impl Drop for StubDashboard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    user_name: String,
    password: String,
}

#[derive(Deserialize)]
struct ServiceAccountLoginRequest {
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetWorkspacesRequest {
    user_name: String,
}

/// User behind the session cookie, if it is one the stub issued.
fn session_user(headers: &HeaderMap) -> Option<&'static str> {
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok())?;
    cookie.split("; ").find_map(|pair| match pair {
        SESSION_COOKIE => Some("alice"),
        PLATFORM_COOKIE => Some(PLATFORM_USER),
        _ => None,
    })
}

fn has_session(headers: &HeaderMap) -> bool {
    session_user(headers).is_some()
}

fn unauthenticated(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "code": "unauthenticated", "message": message })),
    )
        .into_response()
}

fn redirect_to_login() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/#/signin")]).into_response()
}

async fn login(State(state): State<Arc<StubState>>, Json(req): Json<LoginRequest>) -> Response {
    state.logins.fetch_add(1, Ordering::SeqCst);
    if req.password != PASSWORD {
        return unauthenticated("incorrect user or password");
    }
    (
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}; Path=/; HttpOnly; SameSite=Lax"),
        )],
        Json(json!({ "userName": req.user_name, "requirePasswordUpdate": false })),
    )
        .into_response()
}

async fn ca_cert(State(state): State<Arc<StubState>>) -> Response {
    state.ca_fetches.fetch_add(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "application/x-pem-file")], CA_CERT).into_response()
}

async fn service_account_login(
    State(state): State<Arc<StubState>>,
    Json(req): Json<ServiceAccountLoginRequest>,
) -> Response {
    state.platform_logins.fetch_add(1, Ordering::SeqCst);
    if req.token != IDENTITY_TOKEN {
        return unauthenticated("invalid identity token");
    }
    (
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            format!("{PLATFORM_COOKIE}; Path=/; HttpOnly"),
        )],
        Json(json!({ "userName": PLATFORM_USER })),
    )
        .into_response()
}

async fn verify(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.verifies.fetch_add(1, Ordering::SeqCst);
    match session_user(&headers) {
        Some(user) => Json(json!({ "userName": user })).into_response(),
        None => unauthenticated("session not found"),
    }
}

async fn get_workspaces(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(req): Json<GetWorkspacesRequest>,
) -> Response {
    state.workspace_calls.fetch_add(1, Ordering::SeqCst);
    if state.expired.load(Ordering::SeqCst) {
        return redirect_to_login();
    }
    if !has_session(&headers) {
        return unauthenticated("session not found");
    }
    let items: Vec<_> = ["ws1", "ws2", "db1"]
        .into_iter()
        .map(|name| {
            json!({
                "name": name,
                "ownerName": req.user_name,
                "template": "code-server",
                "phase": "Running",
                "mainUrl": format!("https://{name}.example.com"),
            })
        })
        .collect();
    Json(json!({ "items": items })).into_response()
}

async fn get_users(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if state.expired.load(Ordering::SeqCst) {
        return redirect_to_login();
    }
    if !has_session(&headers) {
        return unauthenticated("session not found");
    }
    Json(json!({
        "items": [
            { "name": "alice", "displayName": "Alice", "roles": ["burrow-admin"] },
            { "name": "bob", "displayName": "Bob", "roles": ["team-b"] },
        ]
    }))
    .into_response()
}
