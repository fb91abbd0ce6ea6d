//! Credential exchange.
//!
//! Trades a password or a platform identity token for a Dashboard session
//! and encodes that session as the opaque token stored in the session file.
//! The token is the base64 of the cookie pairs the Dashboard set; decoding
//! it yields the `Cookie` header value to replay.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info};

use crate::dashboard::DashboardClient;
use crate::error::CliError;

/// Where the platform mounts the identity token inside a pod.
pub const PLATFORM_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Extract the `name=value` pairs from `Set-Cookie` header values.
///
/// Attributes (`Path`, `HttpOnly`, ...) are dropped. Returns `None` when no
/// header carries a pair.
pub fn session_cookie<S: AsRef<str>>(set_cookies: &[S]) -> Option<String> {
    let pairs: Vec<&str> = set_cookies
        .iter()
        .filter_map(|h| h.as_ref().split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('=') && !pair.starts_with('='))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

/// Encode a cookie as a stored session token.
pub fn encode_token(cookie: &str) -> String {
    STANDARD.encode(cookie.as_bytes())
}

/// Decode a stored session token into a cookie header value.
pub fn decode_token(token: &str) -> Result<String, CliError> {
    let bytes = STANDARD.decode(token.trim()).map_err(|e| {
        CliError::Validation(format!("stored session token is corrupt ({e}): run 'burrow login'"))
    })?;
    String::from_utf8(bytes).map_err(|_| {
        CliError::Validation("stored session token is corrupt: run 'burrow login'".into())
    })
}

/// Exchange a user name and password for a session token.
pub async fn login_with_password(
    client: &DashboardClient,
    user: &str,
    password: &str,
) -> Result<String, CliError> {
    if user.is_empty() {
        return Err(CliError::Validation("user name must not be empty".into()));
    }
    if password.is_empty() {
        return Err(CliError::Validation("password must not be empty".into()));
    }

    let reply = client.login(user, password).await?;
    info!(user = %reply.user_name, "logged in with password");
    Ok(encode_token(&reply.cookie))
}

/// Read the platform identity token from `path`.
pub fn read_identity_token(path: &Path) -> Result<String, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        CliError::Auth(format!(
            "cannot read platform identity token {}: {e}",
            path.display()
        ))
    })?;
    let token = raw.trim();
    if token.is_empty() {
        return Err(CliError::Auth(format!(
            "platform identity token {} is empty",
            path.display()
        )));
    }
    Ok(token.to_string())
}

/// Exchange the platform identity token for a session token.
///
/// Returns the session token and the user name the Dashboard resolved from
/// the identity.
pub async fn login_with_platform_identity(
    client: &DashboardClient,
    token_path: &Path,
) -> Result<(String, String), CliError> {
    let identity = read_identity_token(token_path)?;
    debug!(path = %token_path.display(), "exchanging platform identity token");

    let reply = client.service_account_login(&identity).await?;
    info!(user = %reply.user_name, "logged in with platform identity");
    Ok((encode_token(&reply.cookie), reply.user_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cookie_pairs_drop_attributes() {
        let headers = [
            "burrow-session=abc123; Path=/; HttpOnly; Secure",
            "burrow-csrf=xyz; Path=/",
        ];
        assert_eq!(
            session_cookie(&headers).as_deref(),
            Some("burrow-session=abc123; burrow-csrf=xyz")
        );
    }

    #[test]
    fn cookie_pairs_none_when_empty() {
        let headers: [&str; 0] = [];
        assert_eq!(session_cookie(&headers), None);
        assert_eq!(session_cookie(&["; Path=/"]), None);
    }

    #[test]
    fn token_decodes_to_cookie() {
        let token = encode_token("burrow-session=abc123");
        assert_eq!(decode_token(&token).unwrap(), "burrow-session=abc123");
    }

    #[test]
    fn corrupt_token_is_validation_error() {
        let err = decode_token("%%% not base64").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("burrow login"));
    }

    #[test]
    fn identity_token_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  eyJhbGciOi.payload.sig  ").unwrap();
        assert_eq!(read_identity_token(file.path()).unwrap(), "eyJhbGciOi.payload.sig");
    }

    #[test]
    fn missing_identity_token_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_identity_token(&dir.path().join("token")).unwrap_err();
        assert!(matches!(err, CliError::Auth(_)));
    }

    #[test]
    fn empty_identity_token_is_auth_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = read_identity_token(file.path()).unwrap_err();
        assert!(matches!(err, CliError::Auth(ref m) if m.contains("empty")));
    }

    #[tokio::test]
    async fn password_login_rejects_empty_values_before_network() {
        let http = crate::dashboard::build_http_client(crate::dashboard::TrustRoots::System).unwrap();
        // port 9 is discard; no request is made on validation failure
        let client = DashboardClient::new("http://127.0.0.1:9", http).unwrap();

        let err = login_with_password(&client, "", "pw").await.unwrap_err();
        assert!(err.is_validation());
        let err = login_with_password(&client, "alice", "").await.unwrap_err();
        assert!(err.is_validation());
    }
}
