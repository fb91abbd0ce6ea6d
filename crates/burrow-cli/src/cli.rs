//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};

use crate::credentials::PLATFORM_TOKEN_PATH;
use crate::trust::{ClusterLocation, DEFAULT_DASHBOARD_PORT, DEFAULT_NAMESPACE};

/// Burrow CLI - manage workspaces on the Burrow platform.
#[derive(Parser, Debug, Clone)]
#[command(name = "burrow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// How to reach the platform.
    #[command(flatten)]
    pub connect: ConnectOpts,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Space-separated path of the selected subcommand, e.g. `workspace list`.
    pub fn command_path(&self) -> Vec<&'static str> {
        match &self.command {
            Commands::Login(_) => vec!["login"],
            Commands::Workspace {
                command: WorkspaceCommands::List(_),
            } => vec!["workspace", "list"],
            Commands::User {
                command: UserCommands::List(_),
            } => vec!["user", "list"],
            Commands::Config {
                command: ConfigCommands::View,
            } => vec!["config", "view"],
        }
    }

    /// Rendered usage of the subcommand at `path`.
    pub fn usage_for(path: &[&str]) -> String {
        let mut cmd = Self::command().bin_name("burrow");
        cmd.build();
        for name in path {
            match cmd.find_subcommand(name) {
                Some(sub) => cmd = sub.clone(),
                None => break,
            }
        }
        cmd.render_usage().to_string()
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Connection options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ConnectOpts {
    /// Talk to the cluster API directly instead of the Dashboard.
    #[arg(long, global = true)]
    pub direct: bool,

    /// Dashboard URL.
    #[arg(long, env = "BURROW_DASHBOARD_URL", global = true)]
    pub dashboard_url: Option<String>,

    /// Session file.
    #[arg(long, env = "BURROW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Kubeconfig file (with --direct). Only the first entry of a path list is used.
    #[arg(long, env = "KUBECONFIG", global = true)]
    pub kubeconfig: Option<String>,

    /// Kubeconfig context (with --direct).
    #[arg(long, env = "BURROW_KUBE_CONTEXT", global = true)]
    pub context: Option<String>,

    /// Namespace the platform is installed in.
    #[arg(long, env = "BURROW_NAMESPACE", default_value = DEFAULT_NAMESPACE, global = true, hide = true)]
    pub namespace: String,

    /// Port of the in-cluster Dashboard.
    #[arg(long, env = "BURROW_DASHBOARD_PORT", default_value_t = DEFAULT_DASHBOARD_PORT, global = true, hide = true)]
    pub dashboard_port: u16,

    /// Plaintext URL serving the Dashboard CA; derived from the namespace by default.
    #[arg(long, env = "BURROW_BOOTSTRAP_URL", global = true, hide = true)]
    pub bootstrap_url: Option<String>,

    /// Platform identity token of the workload.
    #[arg(long, env = "BURROW_IDENTITY_TOKEN_FILE", value_name = "PATH", global = true, hide = true)]
    pub identity_token_file: Option<PathBuf>,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            direct: false,
            dashboard_url: None,
            config: None,
            kubeconfig: None,
            context: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            dashboard_port: DEFAULT_DASHBOARD_PORT,
            bootstrap_url: None,
            identity_token_file: None,
        }
    }
}

impl ConnectOpts {
    /// Where the platform's in-cluster services live.
    pub fn location(&self) -> ClusterLocation {
        ClusterLocation {
            namespace: if self.namespace.is_empty() {
                DEFAULT_NAMESPACE.to_string()
            } else {
                self.namespace.clone()
            },
            port: self.dashboard_port,
        }
    }

    /// Explicit Dashboard URL, ignoring empty values.
    pub fn dashboard_url(&self) -> Option<&str> {
        self.dashboard_url.as_deref().filter(|u| !u.is_empty())
    }

    /// URL the Dashboard CA is fetched from.
    pub fn bootstrap_url(&self) -> String {
        self.bootstrap_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map_or_else(|| self.location().bootstrap_url(), str::to_string)
    }

    /// Where the platform identity token is mounted.
    pub fn identity_token_path(&self) -> PathBuf {
        self.identity_token_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(PLATFORM_TOKEN_PATH))
    }

    /// Kubeconfig path to use, if one was given.
    pub fn kubeconfig_path(&self) -> Option<PathBuf> {
        self.kubeconfig
            .as_deref()
            .and_then(crate::cluster::first_kubeconfig_path)
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in to the Dashboard and cache the session.
    Login(LoginArgs),

    /// Workspace commands.
    #[command(alias = "ws")]
    Workspace {
        /// Workspace subcommand to execute.
        #[command(subcommand)]
        command: WorkspaceCommands,
    },

    /// User commands.
    User {
        /// User subcommand to execute.
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Session file commands.
    Config {
        /// Config subcommand to execute.
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Arguments for the login command.
#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// User name.
    pub user: String,

    /// Read the password from standard input.
    #[arg(long)]
    pub password_stdin: bool,

    /// Password, taken from the environment only.
    #[arg(long, env = "BURROW_PASSWORD", hide = true, hide_env_values = true)]
    pub password: Option<String>,

    /// PEM file of a private CA that signed the Dashboard certificate.
    #[arg(long, value_name = "PATH")]
    pub ca_cert: Option<PathBuf>,
}

/// Workspace subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum WorkspaceCommands {
    /// List workspaces.
    #[command(alias = "ls")]
    List(WorkspaceListArgs),
}

/// Arguments for `workspace list`.
#[derive(Args, Debug, Clone, Default)]
pub struct WorkspaceListArgs {
    /// Owner of the workspaces; defaults to the logged-in user.
    #[arg(short, long)]
    pub user: Option<String>,

    /// Filter rows, e.g. `name==ws*` or `phase!=Running`. Repeatable.
    #[arg(long = "filter", value_name = "KEY==VALUE")]
    pub filters: Vec<String>,
}

/// User subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum UserCommands {
    /// List users.
    #[command(alias = "ls")]
    List(UserListArgs),
}

/// Arguments for `user list`.
#[derive(Args, Debug, Clone, Default)]
pub struct UserListArgs {
    /// Filter rows, e.g. `role==*-admin`. Repeatable.
    #[arg(long = "filter", value_name = "KEY==VALUE")]
    pub filters: Vec<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Show the cached session.
    View,
}
