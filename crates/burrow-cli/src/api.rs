//! The operations commands run, independent of how the platform is reached.

use std::future::Future;
use std::pin::Pin;

use crate::classify::classify;
use crate::cluster::DirectClient;
use crate::dashboard::DashboardClient;
use crate::error::CliError;
use crate::types::{User, Workspace};

/// Boxed future returned by [`WorkspaceApi`] methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CliError>> + Send + 'a>>;

/// Workspace and user queries.
pub trait WorkspaceApi: Send + Sync {
    /// List the workspaces owned by `user`.
    fn list_workspaces<'a>(&'a self, user: &'a str) -> ApiFuture<'a, Vec<Workspace>>;

    /// List all users.
    fn list_users(&self) -> ApiFuture<'_, Vec<User>>;

    /// User the active session belongs to, if any.
    fn current_user(&self) -> Option<&str>;
}

/// A connected backend, chosen once per invocation.
#[derive(Debug)]
pub enum Backend {
    /// Cluster object API.
    Direct(DirectClient),
    /// Dashboard API with an authenticated session.
    Facade {
        /// Session-bearing Dashboard client.
        client: DashboardClient,
        /// User the session belongs to.
        user: String,
    },
}

impl Backend {
    /// Whether this backend talks to the cluster API.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct(_))
    }
}

impl WorkspaceApi for Backend {
    fn list_workspaces<'a>(&'a self, user: &'a str) -> ApiFuture<'a, Vec<Workspace>> {
        Box::pin(async move {
            match self {
                Self::Direct(client) => client.list_workspaces(user).await,
                Self::Facade { client, .. } => {
                    client.get_workspaces(user).await.map_err(classify)
                }
            }
        })
    }

    fn list_users(&self) -> ApiFuture<'_, Vec<User>> {
        Box::pin(async move {
            match self {
                Self::Direct(client) => client.list_users().await,
                Self::Facade { client, .. } => client.get_users().await.map_err(classify),
            }
        })
    }

    fn current_user(&self) -> Option<&str> {
        match self {
            Self::Direct(_) => None,
            Self::Facade { user, .. } => Some(user.as_str()).filter(|u| !u.is_empty()),
        }
    }
}
