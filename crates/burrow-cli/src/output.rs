//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use burrow_config::{Session, redact};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;
use crate::types::{User, Workspace};

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Workspaces for display; serialized as a bare array.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct WorkspaceList {
    /// Workspaces to show.
    pub items: Vec<Workspace>,
}

impl TableDisplay for WorkspaceList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.items.is_empty() {
            writeln!(writer, "No workspaces found")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<24}  {:<16}  {:<20}  {:<10}  URL",
            "NAME", "USER", "TEMPLATE", "PHASE"
        )?;
        writeln!(writer, "{}", "─".repeat(96))?;

        for ws in &self.items {
            let urls = ws.all_urls();
            let url = urls.first().map_or("", String::as_str);
            writeln!(
                writer,
                "{:<24}  {:<16}  {:<20}  {:<10}  {}",
                truncate(&ws.name, 24),
                truncate(&ws.owner_name, 16),
                truncate(&ws.template, 20),
                ws.phase,
                url
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} workspace(s)", self.items.len())?;
        Ok(())
    }
}

/// Users for display; serialized as a bare array.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct UserList {
    /// Users to show.
    pub items: Vec<User>,
}

impl TableDisplay for UserList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.items.is_empty() {
            writeln!(writer, "No users found")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<20}  {:<24}  {:<30}  ADDONS",
            "NAME", "DISPLAY NAME", "ROLES"
        )?;
        writeln!(writer, "{}", "─".repeat(96))?;

        for user in &self.items {
            writeln!(
                writer,
                "{:<20}  {:<24}  {:<30}  {}",
                truncate(&user.name, 20),
                truncate(&user.display_name, 24),
                truncate(&user.roles.join(","), 30),
                user.addons.join(",")
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} user(s)", self.items.len())?;
        Ok(())
    }
}

/// Cached session as shown by `config view`. The token is never included.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Session file location.
    pub path: String,
    /// Dashboard URL.
    pub endpoint: String,
    /// Session owner.
    pub user: String,
    /// Whether the session came from the platform identity.
    pub use_platform_identity: bool,
    /// Redacted token, empty when none is cached.
    pub token: String,
    /// Whether a private CA is cached.
    pub has_ca_cert: bool,
}

impl SessionView {
    /// Build a view of `session` stored at `path`.
    #[must_use]
    pub fn new(path: &std::path::Path, session: &Session) -> Self {
        Self {
            path: path.display().to_string(),
            endpoint: session.endpoint.clone(),
            user: session.user.clone(),
            use_platform_identity: session.use_platform_identity,
            token: if session.has_token() {
                redact(&session.token).to_string()
            } else {
                String::new()
            },
            has_ca_cert: !session.ca_cert.is_empty(),
        }
    }
}

impl TableDisplay for SessionView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Session")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Config File:      {}", self.path)?;
        writeln!(writer, "Endpoint:         {}", or_none(&self.endpoint))?;
        writeln!(writer, "User:             {}", or_none(&self.user))?;
        writeln!(writer, "Token:            {}", or_none(&self.token))?;
        writeln!(
            writer,
            "Identity:         {}",
            if self.use_platform_identity { "platform" } else { "human" }
        )?;
        writeln!(
            writer,
            "CA Certificate:   {}",
            if self.has_ca_cert { "cached" } else { "none" }
        )?;
        Ok(())
    }
}

/// Confirmation of a completed action.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "✓ {}", self.message)?;
        Ok(())
    }
}

fn or_none(value: &str) -> &str {
    if value.is_empty() { "<none>" } else { value }
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace(name: &str) -> Workspace {
        Workspace {
            name: name.into(),
            owner_name: "alice".into(),
            template: "code-server".into(),
            phase: "Running".into(),
            main_url: format!("https://{name}.example.com"),
            urls: vec![],
        }
    }

    #[test]
    fn workspace_table_has_rows_and_total() {
        let list = WorkspaceList {
            items: vec![workspace("ws1"), workspace("ws2")],
        };
        let out = OutputFormat::default().to_string(&list).unwrap();
        assert!(out.starts_with("NAME"));
        assert!(out.contains("ws1"));
        assert!(out.contains("https://ws2.example.com"));
        assert!(out.contains("Total: 2 workspace(s)"));
    }

    #[test]
    fn empty_workspace_table() {
        let list = WorkspaceList { items: vec![] };
        let out = OutputFormat::default().to_string(&list).unwrap();
        assert_eq!(out, "No workspaces found\n");
    }

    #[test]
    fn workspace_json_is_array() {
        let list = WorkspaceList {
            items: vec![workspace("ws1")],
        };
        let out = OutputFormat::new(Format::Json).to_string(&list).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["name"], "ws1");
        assert_eq!(value[0]["ownerName"], "alice");
    }

    #[test]
    fn user_table_joins_roles() {
        let list = UserList {
            items: vec![User {
                name: "alice".into(),
                display_name: "Alice".into(),
                roles: vec!["burrow-admin".into(), "team-a".into()],
                addons: vec![],
            }],
        };
        let out = OutputFormat::default().to_string(&list).unwrap();
        assert!(out.contains("burrow-admin,team-a"));
    }

    #[test]
    fn session_view_never_shows_token() {
        let session = Session {
            endpoint: "https://dash".into(),
            token: "c2VjcmV0LWNvb2tpZQ==".into(),
            user: "alice".into(),
            ..Session::default()
        };
        let view = SessionView::new(std::path::Path::new("/tmp/config.json"), &session);
        for format in [Format::Table, Format::Json] {
            let out = OutputFormat::new(format).to_string(&view).unwrap();
            assert!(!out.contains("c2VjcmV0LWNvb2tpZQ=="));
            assert!(out.contains("alice"));
        }
    }

    #[test]
    fn session_view_of_empty_session() {
        let view = SessionView::new(std::path::Path::new("/tmp/config.json"), &Session::default());
        let out = OutputFormat::default().to_string(&view).unwrap();
        assert!(out.contains("Endpoint:         <none>"));
        assert!(out.contains("CA Certificate:   none"));
    }

    #[test]
    fn success_message_table() {
        let out = OutputFormat::default()
            .to_string(&Message::success("logged in"))
            .unwrap();
        assert_eq!(out, "✓ logged in\n");
    }

    #[test]
    fn success_message_json() {
        let out = OutputFormat::new(Format::Json)
            .to_string(&Message::success("logged in"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!({ "message": "logged in" }));
    }

    #[test]
    fn workspace_table_falls_back_to_first_url() {
        let list = WorkspaceList {
            items: vec![Workspace {
                main_url: String::new(),
                urls: vec!["https://alt.example.com".into()],
                ..workspace("ws1")
            }],
        };
        let out = OutputFormat::default().to_string(&list).unwrap();
        assert!(out.contains("https://alt.example.com"));
    }

    #[test]
    fn truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("hello", 3), "hel");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("ワークスペース", 5), "ワー...");
    }
}
