//! # burrow-cli
//!
//! Burrow command-line interface.
//!
//! Provides commands for:
//! - Logging in to the Dashboard
//! - Listing workspaces and users, with `--filter` expressions
//! - Inspecting the cached session
//!
//! # Architecture
//!
//! Every invocation picks one backend. With `--direct` the CLI talks to the
//! cluster object API using a kubeconfig. Otherwise it goes through the
//! Dashboard, either with a cached human session or with the platform
//! identity of the workload it runs in.
//!
//! ```text
//!                  ┌─────────────┐   JSON RPC    ┌──────────────┐
//!              ┌──►│  dashboard  │──────────────►│  Dashboard   │
//! ┌────────────┤   └─────────────┘  (cookie)     └──────────────┘
//! │ burrow-cli │
//! └────────────┤   ┌─────────────┐    REST       ┌──────────────┐
//!              └──►│   cluster   │──────────────►│  API server  │
//!                  └─────────────┘  (--direct)   └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod credentials;
pub mod dashboard;
pub mod error;
pub mod cluster;
pub mod output;
pub mod reauth;
pub mod transport;
pub mod trust;
pub mod types;

pub use api::{Backend, WorkspaceApi};
pub use cli::{Cli, Commands, Format};
pub use dashboard::DashboardClient;
pub use error::CliError;
pub use output::OutputFormat;
pub use types::{User, Workspace};
