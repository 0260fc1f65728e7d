//! Client credentials and server settings.

use crate::error::{Result, ZoteroError};

/// Default Zotero Web API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.zotero.org";

/// Which Zotero library the client addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Library {
    User(String),
    Group(String),
}

impl Library {
    /// Leading path segments of library-scoped endpoints (`users/123`, `groups/456`).
    pub fn segments(&self) -> [&str; 2] {
        match self {
            Library::User(id) => ["users", id.as_str()],
            Library::Group(id) => ["groups", id.as_str()],
        }
    }
}

/// Credentials and endpoint for a [`ZoteroClient`](crate::ZoteroClient).
#[derive(Debug, Clone)]
pub struct ZoteroConfig {
    pub api_key: String,
    pub library: Library,
    pub base_url: String,
}

impl ZoteroConfig {
    /// Build a config, preferring the user library when both ids are given.
    pub fn new(
        api_key: Option<String>,
        user_id: Option<String>,
        group_id: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let api_key = non_empty(api_key).ok_or(ZoteroError::AuthRequired)?;

        let library = match (non_empty(user_id), non_empty(group_id)) {
            (Some(user), _) => Library::User(user),
            (None, Some(group)) => Library::Group(group),
            (None, None) => {
                return Err(ZoteroError::Config(
                    "either ZOTERO_USER_ID or ZOTERO_GROUP_ID must be set".to_string(),
                ))
            }
        };

        let base_url = non_empty(base_url).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let parsed = url::Url::parse(&base_url)
            .map_err(|e| ZoteroError::Config(format!("invalid API URL '{}': {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(ZoteroError::Config(format!(
                "invalid API URL '{}': not a base URL",
                base_url
            )));
        }

        Ok(Self {
            api_key,
            library,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Read `ZOTERO_API_KEY`, `ZOTERO_USER_ID` / `ZOTERO_GROUP_ID` and the
    /// optional `ZOTERO_API_URL` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(
            std::env::var("ZOTERO_API_KEY").ok(),
            std::env::var("ZOTERO_USER_ID").ok(),
            std::env::var("ZOTERO_GROUP_ID").ok(),
            std::env::var("ZOTERO_API_URL").ok(),
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Settings for the resource and tool layer.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Scheme of every resource URI (`zotero://collections`).
    pub uri_scheme: String,
    /// Page size for the top-items resource.
    pub top_items_limit: u32,
    /// Page size for the recent-items resource.
    pub recent_items_limit: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            uri_scheme: "zotero".to_string(),
            top_items_limit: 50,
            recent_items_limit: 20,
        }
    }
}
