//! Workspace and user rows shared by the Dashboard and direct clients.

use burrow_filter::Filterable;
use serde::{Deserialize, Serialize};

/// A user workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workspace {
    /// Workspace name.
    pub name: String,
    /// Owning user.
    pub owner_name: String,
    /// Template the workspace was created from.
    pub template: String,
    /// Lifecycle phase (`Running`, `Stopped`, ...).
    pub phase: String,
    /// Main URL, if the workspace exposes one.
    pub main_url: String,
    /// All exposed URLs.
    pub urls: Vec<String>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            name: String::new(),
            owner_name: String::new(),
            template: String::new(),
            phase: "Pending".into(),
            main_url: String::new(),
            urls: Vec::new(),
        }
    }
}

impl Filterable for Workspace {
    fn filter_keys() -> &'static [&'static str] {
        &["name", "user", "template", "phase", "url"]
    }

    fn filter_values(&self, key: &str) -> Vec<String> {
        match key {
            "name" => vec![self.name.clone()],
            "user" => vec![self.owner_name.clone()],
            "template" => vec![self.template.clone()],
            "phase" => vec![self.phase.clone()],
            "url" => self.all_urls(),
            _ => Vec::new(),
        }
    }
}

impl Workspace {
    /// Main URL followed by the other exposed URLs, without duplicates.
    pub fn all_urls(&self) -> Vec<String> {
        let mut urls = Vec::with_capacity(self.urls.len() + 1);
        if !self.main_url.is_empty() {
            urls.push(self.main_url.clone());
        }
        for url in &self.urls {
            if !url.is_empty() && !urls.contains(url) {
                urls.push(url.clone());
            }
        }
        urls
    }
}

/// A platform user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    /// Login name.
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Granted roles.
    pub roles: Vec<String>,
    /// Addon templates attached to the user.
    pub addons: Vec<String>,
}

impl Filterable for User {
    fn filter_keys() -> &'static [&'static str] {
        &["name", "displayname", "role", "addon"]
    }

    fn filter_values(&self, key: &str) -> Vec<String> {
        match key {
            "name" => vec![self.name.clone()],
            "displayname" => vec![self.display_name.clone()],
            "role" => self.roles.clone(),
            "addon" => self.addons.clone(),
            _ => Vec::new(),
        }
    }
}
