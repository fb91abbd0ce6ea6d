//! The persisted CLI session.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Locally cached connection state for the Dashboard API.
///
/// `token` is the base64 encoding of the raw session cookie returned by the
/// Dashboard login call. It is only ever replayed, never parsed.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Dashboard base URL.
    pub endpoint: String,
    /// Encoded session cookie.
    pub token: String,
    /// Identity name the session belongs to.
    pub user: String,
    /// Whether this session was obtained with the platform identity token.
    #[serde(rename = "usePlatformIdentity", skip_serializing_if = "is_false")]
    pub use_platform_identity: bool,
    /// Base64-encoded PEM of the Dashboard CA.
    #[serde(rename = "cacert", skip_serializing_if = "String::is_empty")]
    pub ca_cert: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(v: &bool) -> bool {
    !*v
}

impl Session {
    /// True when nothing has ever been stored: no endpoint, token, or user.
    pub fn is_empty(&self) -> bool {
        self.endpoint.is_empty() && self.token.is_empty() && self.user.is_empty()
    }

    /// True when the session carries a token that can be replayed.
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    /// Decode the cached CA certificate into PEM bytes.
    ///
    /// Returns `Ok(None)` when no CA is cached.
    pub fn ca_pem(&self) -> Result<Option<Vec<u8>>> {
        if self.ca_cert.is_empty() {
            return Ok(None);
        }
        STANDARD
            .decode(self.ca_cert.trim())
            .map(Some)
            .map_err(|e| Error::CaEncoding(e.to_string()))
    }

    /// Store PEM bytes as the cached CA certificate.
    pub fn set_ca_pem(&mut self, pem: &[u8]) {
        self.ca_cert = STANDARD.encode(pem);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("token", &redact(&self.token))
            .field("user", &self.user)
            .field("use_platform_identity", &self.use_platform_identity)
            .field("ca_cert", &if self.ca_cert.is_empty() { "" } else { "<present>" })
            .finish()
    }
}

/// Render a secret for display without leaking it.
pub fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "<redacted>" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_session() -> Session {
        Session {
            endpoint: "https://dashboard.example.com".into(),
            token: "c2Vzc2lvbj1hYmM=".into(),
            user: "alice".into(),
            use_platform_identity: true,
            ca_cert: STANDARD.encode("-----BEGIN CERTIFICATE-----\n"),
        }
    }

    #[test]
    fn default_session_is_empty() {
        let session = Session::default();
        assert!(session.is_empty());
        assert!(!session.has_token());
        assert_eq!(session.endpoint, "");
    }

    #[test]
    fn session_with_only_user_is_not_empty() {
        let session = Session {
            user: "bob".into(),
            ..Session::default()
        };
        assert!(!session.is_empty());
    }

    #[test]
    fn ca_cert_alone_does_not_make_session_non_empty() {
        let session = Session {
            ca_cert: "Zm9v".into(),
            ..Session::default()
        };
        assert!(session.is_empty());
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_value(full_session()).unwrap();
        assert_eq!(json["endpoint"], "https://dashboard.example.com");
        assert_eq!(json["usePlatformIdentity"], true);
        assert!(json.get("cacert").is_some());
        assert!(json.get("use_platform_identity").is_none());
    }

    #[test]
    fn omits_false_flag_and_empty_ca() {
        let session = Session {
            endpoint: "https://d".into(),
            token: "t".into(),
            user: "u".into(),
            ..Session::default()
        };
        let json = serde_json::to_value(&session).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("usePlatformIdentity"));
        assert!(!obj.contains_key("cacert"));
        assert_eq!(obj.len(), 3);
    }

    #[test]
    fn missing_fields_default() {
        let session: Session = serde_json::from_str(r#"{"user":"carol"}"#).unwrap();
        assert_eq!(session.user, "carol");
        assert!(session.endpoint.is_empty());
        assert!(!session.use_platform_identity);
    }

    #[test]
    fn ca_pem_roundtrip() {
        let mut session = Session::default();
        assert!(session.ca_pem().unwrap().is_none());

        session.set_ca_pem(b"pem-bytes");
        assert_eq!(session.ca_pem().unwrap().as_deref(), Some(&b"pem-bytes"[..]));
    }

    #[test]
    fn ca_pem_rejects_garbage() {
        let session = Session {
            ca_cert: "!!not base64!!".into(),
            ..Session::default()
        };
        assert!(matches!(session.ca_pem(), Err(Error::CaEncoding(_))));
    }

    #[test]
    fn debug_redacts_token() {
        let debug = format!("{:?}", full_session());
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("c2Vzc2lvbj1hYmM="));
    }
}
