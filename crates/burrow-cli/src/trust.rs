//! Trust bootstrap for the Dashboard CA.
//!
//! A workload that has never talked to the Dashboard does not know which CA
//! signed its certificate. The platform publishes that CA on a plaintext
//! in-cluster bootstrap endpoint; the first fetch is trust-on-first-use. The
//! fetched CA then becomes the only root the Dashboard client trusts.

use reqwest::Client;
use tracing::{debug, info};

use crate::dashboard::{TrustRoots, build_http_client, parse_pem_bundle};
use crate::error::CliError;

/// Namespace the platform is installed into by default.
pub const DEFAULT_NAMESPACE: &str = "burrow-system";

/// Port the Dashboard and its bootstrap endpoint listen on by default.
pub const DEFAULT_DASHBOARD_PORT: u16 = 8443;

/// Where the platform's in-cluster services live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLocation {
    /// Platform namespace.
    pub namespace: String,
    /// Dashboard port.
    pub port: u16,
}

impl Default for ClusterLocation {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            port: DEFAULT_DASHBOARD_PORT,
        }
    }
}

impl ClusterLocation {
    /// Dashboard URL reachable from inside the cluster.
    pub fn dashboard_url(&self) -> String {
        format!(
            "https://burrow-dashboard.{}.svc.cluster.local:{}",
            self.namespace, self.port
        )
    }

    /// Plaintext URL serving the Dashboard CA.
    pub fn bootstrap_url(&self) -> String {
        format!(
            "http://burrow-dashboard-bootstrap.{}.svc.cluster.local:{}/ca.crt",
            self.namespace, self.port
        )
    }
}

/// Fetch the Dashboard CA from `url`.
///
/// The body must contain at least one PEM certificate. There is no retry.
pub async fn fetch_ca_cert(url: &str) -> Result<Vec<u8>, CliError> {
    debug!(url = %url, "fetching dashboard CA");
    let http = build_http_client(TrustRoots::System)?;

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| CliError::transport("fetching CA certificate", &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CliError::Transport(format!(
            "fetching CA certificate: unexpected status {status}"
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| CliError::transport("fetching CA certificate", &e))?;
    parse_pem_bundle(&body)?;

    info!(url = %url, bytes = body.len(), "fetched dashboard CA");
    Ok(body.to_vec())
}

/// HTTP client that trusts only `ca_pem`.
pub fn trusted_client(ca_pem: &[u8]) -> Result<Client, CliError> {
    build_http_client(TrustRoots::Only(ca_pem))
}

/// Fetch the CA and build a client that trusts it.
pub async fn bootstrap(url: &str) -> Result<(Vec<u8>, Client), CliError> {
    let ca = fetch_ca_cert(url).await?;
    let client = trusted_client(&ca)?;
    Ok((ca, client))
}
