//! Error types for the Zotero client and the MCP dispatcher.

use std::time::Duration;

/// Errors that can occur when interacting with the Zotero Web API.
#[derive(Debug, thiserror::Error)]
pub enum ZoteroError {
    /// HTTP request failed (network, timeout, etc.)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Zotero API returned an error status code.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// No API key provided, or the key was rejected.
    #[error("Authentication required: set ZOTERO_API_KEY and ZOTERO_USER_ID (or ZOTERO_GROUP_ID)")]
    AuthRequired,

    /// The API key lacks access to the requested library or operation (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Rate limited by the Zotero API (HTTP 429).
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// The object changed on the server since its version was read (HTTP 412).
    #[error("Version conflict: {0}")]
    VersionConflict(String),

    /// Failed to parse API response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for Results using [`ZoteroError`].
pub type Result<T> = std::result::Result<T, ZoteroError>;

/// JSON-RPC code for input that is not valid JSON.
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC code for JSON that is not a request object.
pub const INVALID_REQUEST: i64 = -32600;
/// JSON-RPC code for an unknown method or tool.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC code for invalid parameters or an unresolvable resource URI.
pub const INVALID_PARAMS: i64 = -32602;
/// Server-defined code for backend failures.
pub const BACKEND_ERROR: i64 = -32000;

/// Every way a single request can fail at the dispatcher boundary.
///
/// Each variant maps onto one JSON-RPC error code; none of them stop the
/// request loop.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("Parse error: {0}")]
    MalformedRequest(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Unknown resource: {0}")]
    ResourceNotFound(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Backend error: {0}")]
    BackendFailure(String),
}

impl McpError {
    /// The JSON-RPC error code reported for this error.
    pub fn code(&self) -> i64 {
        match self {
            McpError::MalformedRequest(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) | McpError::ToolNotFound(_) => METHOD_NOT_FOUND,
            McpError::ResourceNotFound(_) | McpError::InvalidArguments(_) => INVALID_PARAMS,
            McpError::BackendUnavailable(_) | McpError::BackendFailure(_) => BACKEND_ERROR,
        }
    }

    /// Build an `InvalidArguments` error naming the missing keys.
    pub fn missing_arguments(tool: &str, missing: &[&str]) -> Self {
        let keys = missing
            .iter()
            .map(|k| format!("'{}'", k))
            .collect::<Vec<_>>()
            .join(", ");
        McpError::InvalidArguments(format!("{} requires {}", tool, keys))
    }
}

impl From<ZoteroError> for McpError {
    fn from(err: ZoteroError) -> Self {
        McpError::BackendFailure(err.to_string())
    }
}

/// Rejected registry declarations, caught once at startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("malformed URI template '{template}': {reason}")]
    MalformedTemplate { template: String, reason: String },

    #[error("URI templates '{first}' and '{second}' can match the same URI")]
    AmbiguousTemplates { first: String, second: String },

    #[error("static resource '{0}' registered twice")]
    DuplicateUri(String),
}
