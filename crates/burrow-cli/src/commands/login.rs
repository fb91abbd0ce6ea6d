//! Login command implementation.
//!
//! Exchanges a user name and password for a Dashboard session and caches it
//! in the session file. Never prompts: the password comes from standard
//! input (`--password-stdin`) or `BURROW_PASSWORD`.

use std::io::{BufRead, Write};

use burrow_config::Session;
use tracing::info;

use crate::cli::{ConnectOpts, LoginArgs};
use crate::credentials::login_with_password;
use crate::dashboard::{DashboardClient, TrustRoots, build_http_client};
use crate::error::CliError;
use crate::output::{Message, OutputFormat};
use crate::transport::{config_store, resolve_endpoint};

/// Login command executor.
pub struct LoginCommand<'a> {
    opts: &'a ConnectOpts,
}

impl<'a> LoginCommand<'a> {
    /// Create a new login command.
    #[must_use]
    pub fn new(opts: &'a ConnectOpts) -> Self {
        Self { opts }
    }

    /// Execute the login command, reading the password from `stdin` when
    /// `--password-stdin` is set.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing input, an auth error if the
    /// Dashboard rejects the credentials, or a transport error.
    pub async fn execute<W: Write, R: BufRead>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &LoginArgs,
        stdin: &mut R,
    ) -> Result<(), CliError> {
        if self.opts.direct {
            return Err(CliError::Validation(
                "login is not needed with --direct: the kubeconfig carries the credentials".into(),
            ));
        }
        let password = read_password(args, stdin)?;

        let store = config_store(self.opts)?;
        let existing = store.load()?;
        let endpoint = resolve_endpoint(self.opts.dashboard_url(), &existing, &self.opts.location())
            .ok_or_else(|| {
                CliError::Validation(
                    "no dashboard endpoint: set --dashboard-url or BURROW_DASHBOARD_URL".into(),
                )
            })?;

        let ca = match &args.ca_cert {
            Some(path) => Some(std::fs::read(path).map_err(|e| {
                CliError::Validation(format!("cannot read CA certificate {}: {e}", path.display()))
            })?),
            None if existing.endpoint == endpoint => existing.ca_pem()?,
            None => None,
        };
        let roots = ca.as_deref().map_or(TrustRoots::System, TrustRoots::Extra);
        let client = DashboardClient::new(&endpoint, build_http_client(roots)?)?;

        let token = login_with_password(&client, &args.user, &password).await?;

        let mut session = Session {
            endpoint,
            token,
            user: args.user.clone(),
            ..Session::default()
        };
        if let Some(ca) = &ca {
            session.set_ca_pem(ca);
        }
        store.save(&session)?;
        info!(user = %session.user, endpoint = %session.endpoint, path = %store.path().display(), "session saved");

        format.write(
            writer,
            &Message::success(format!(
                "logged in as {} to {}",
                session.user, session.endpoint
            )),
        )?;
        Ok(())
    }
}

/// Pick the password from standard input or the environment.
pub fn read_password<R: BufRead>(args: &LoginArgs, stdin: &mut R) -> Result<String, CliError> {
    let password = if args.password_stdin {
        let mut line = String::new();
        stdin.read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_string()
    } else {
        args.password.clone().ok_or_else(|| {
            CliError::Validation(
                "no password given: use --password-stdin or set BURROW_PASSWORD".into(),
            )
        })?
    };

    if password.is_empty() {
        return Err(CliError::Validation("password must not be empty".into()));
    }
    Ok(password)
}
