//! Direct access to the cluster object API.
//!
//! Users and workspaces are custom objects of group `burrow.dev/v1alpha1`.
//! Credentials come from a kubeconfig file or, when none is available, from
//! the service account mounted into the pod. Kubeconfig handling (client
//! certificates in any PEM key format, exec plugins, token files) is left to
//! the `kube` client.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kube::api::{ApiResource, DynamicObject, GroupVersionKind, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{CliError, error_chain};
use crate::types::{User, Workspace};

/// API group of the platform's custom objects.
pub const API_GROUP: &str = "burrow.dev";

/// API version of the platform's custom objects.
pub const API_VERSION: &str = "v1alpha1";

/// Prefix of the namespace holding a user's workspaces.
pub const USER_NAMESPACE_PREFIX: &str = "burrow-user-";

/// Namespace holding the workspaces of `user`.
pub fn user_namespace(user: &str) -> String {
    format!("{USER_NAMESPACE_PREFIX}{user}")
}

/// Kubeconfig path to use when none is given: `~/.kube/config` if it exists.
pub fn default_kubeconfig() -> Option<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".kube").join("config"))
        .filter(|path| path.is_file())
}

/// First entry of a `KUBECONFIG`-style path list.
pub fn first_kubeconfig_path(list: &str) -> Option<PathBuf> {
    std::env::split_paths(list)
        .find(|p| !p.as_os_str().is_empty())
}

/// Client for the cluster object API.
#[derive(Clone)]
pub struct DirectClient {
    client: Client,
    server: String,
}

impl std::fmt::Debug for DirectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectClient")
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

impl DirectClient {
    /// Build a client from a kubeconfig, falling back to in-cluster config.
    ///
    /// `kubeconfig` takes precedence; then `~/.kube/config`; then the
    /// mounted service account.
    pub async fn resolve(
        kubeconfig: Option<&Path>,
        context: Option<&str>,
    ) -> Result<Self, CliError> {
        match kubeconfig.map(Path::to_path_buf).or_else(default_kubeconfig) {
            Some(path) => Self::from_kubeconfig(&path, context).await,
            None => Self::in_cluster(),
        }
    }

    /// Build a client from the kubeconfig at `path`.
    ///
    /// Relative file references inside the kubeconfig are resolved against
    /// its directory.
    pub async fn from_kubeconfig(path: &Path, context: Option<&str>) -> Result<Self, CliError> {
        let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
            CliError::Validation(format!("invalid kubeconfig {}: {}", path.display(), error_chain(&e)))
        })?;
        Self::from_parsed(kubeconfig, context).await
    }

    /// Build a client from the service account mounted into the pod.
    pub fn in_cluster() -> Result<Self, CliError> {
        let config = Config::incluster().map_err(|e| {
            CliError::Validation(format!(
                "no kubeconfig found and not running inside a cluster: set --kubeconfig ({})",
                error_chain(&e)
            ))
        })?;
        Self::from_config(config)
    }

    async fn from_parsed(kubeconfig: Kubeconfig, context: Option<&str>) -> Result<Self, CliError> {
        let options = KubeConfigOptions {
            context: context.filter(|c| !c.is_empty()).map(str::to_string),
            ..KubeConfigOptions::default()
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| CliError::Validation(format!("kubeconfig: {}", error_chain(&e))))?;
        debug!(context = ?options.context, server = %config.cluster_url, "using kubeconfig");
        Self::from_config(config)
    }

    /// Build a client from a resolved configuration.
    pub fn from_config(config: Config) -> Result<Self, CliError> {
        let server = config.cluster_url.to_string();
        let client = Client::try_from(config).map_err(|e| {
            CliError::Validation(format!(
                "cannot use kubeconfig credentials for {server}: {}",
                error_chain(&e)
            ))
        })?;
        Ok(Self { client, server })
    }

    /// API server base URL.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// List the workspaces of `user`.
    pub async fn list_workspaces(&self, user: &str) -> Result<Vec<Workspace>, CliError> {
        let namespace = user_namespace(user);
        debug!(namespace = %namespace, "listing workspaces");
        let api: Api<DynamicObject> = Api::namespaced_with(
            self.client.clone(),
            &namespace,
            &resource("Workspace", "workspaces"),
        );
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| api_error(e, &format!("workspaces of user '{user}'")))?;

        list.items
            .into_iter()
            .map(|obj| decode::<WorkspaceObject>(obj).map(|(name, ws)| ws.into_workspace(name)))
            .collect()
    }

    /// List all users.
    pub async fn list_users(&self) -> Result<Vec<User>, CliError> {
        debug!("listing users");
        let api: Api<DynamicObject> =
            Api::all_with(self.client.clone(), &resource("User", "users"));
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| api_error(e, "users"))?;

        list.items
            .into_iter()
            .map(|obj| decode::<UserObject>(obj).map(|(name, user)| user.into_user(name)))
            .collect()
    }
}

fn resource(kind: &str, plural: &str) -> ApiResource {
    ApiResource::from_gvk_with_plural(&GroupVersionKind::gvk(API_GROUP, API_VERSION, kind), plural)
}

fn api_error(err: kube::Error, what: &str) -> CliError {
    match err {
        kube::Error::Api(resp) => match resp.code {
            404 => CliError::NotFound(what.to_string()),
            401 | 403 => CliError::Auth(format!(
                "cluster API denied access to {what}: {}",
                resp.message
            )),
            code => CliError::Transport(format!(
                "cluster API: unexpected status {code}: {}",
                resp.message
            )),
        },
        other => CliError::transport("cluster API", &other),
    }
}

fn decode<T: DeserializeOwned>(obj: DynamicObject) -> Result<(String, T), CliError> {
    let name = obj.metadata.name.unwrap_or_default();
    let body = serde_json::from_value(obj.data)
        .map_err(|e| CliError::Protocol(format!("cluster API: object '{name}': {e}")))?;
    Ok((name, body))
}

// ============================================================================
// Custom objects
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WorkspaceObject {
    spec: WorkspaceSpec,
    status: WorkspaceStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WorkspaceSpec {
    owner: String,
    template: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WorkspaceStatus {
    phase: String,
    main_url: String,
    urls: BTreeMap<String, String>,
}

impl WorkspaceObject {
    fn into_workspace(self, name: String) -> Workspace {
        let defaults = Workspace::default();
        Workspace {
            name,
            owner_name: self.spec.owner,
            template: self.spec.template,
            phase: if self.status.phase.is_empty() {
                defaults.phase
            } else {
                self.status.phase
            },
            main_url: self.status.main_url,
            urls: self.status.urls.into_values().collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserObject {
    spec: UserSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSpec {
    display_name: String,
    roles: Vec<NameRef>,
    addons: Vec<AddonRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NameRef {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AddonRef {
    template: NameRef,
}

impl UserObject {
    fn into_user(self, name: String) -> User {
        User {
            name,
            display_name: self.spec.display_name,
            roles: self.spec.roles.into_iter().map(|r| r.name).collect(),
            addons: self.spec.addons.into_iter().map(|a| a.template.name).collect(),
        }
    }
}
