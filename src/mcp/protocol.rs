//! JSON-RPC 2.0 message shapes and MCP descriptor types.

use crate::error::{McpError, ZoteroError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported by `initialize`.
pub const SERVER_NAME: &str = "zotero-mcp";

/// One decoded request line.
///
/// `id` is echoed back verbatim; uniqueness is the caller's concern.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Value>,
}

impl Request {
    /// Id to echo in the response (`null` when absent).
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }

    /// A notification expects no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.starts_with("notifications/")
    }
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

/// Exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(ErrorObject),
}

/// One response line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub id: Value,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            outcome: Outcome::Result(result),
            id,
        }
    }

    pub fn error(id: Value, err: &McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            outcome: Outcome::Error(ErrorObject {
                code: err.code(),
                message: err.to_string(),
            }),
            id,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&ErrorObject> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(err) => Some(err),
        }
    }
}

/// The `{type: "text", text}` unit of resource and tool payloads.
///
/// Resource reads additionally carry the `uri` and `mimeType` they were read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub text: String,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            uri: None,
            mime_type: None,
            text: text.into(),
        }
    }

    pub fn resource(uri: &str, mime_type: &str, text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            uri: Some(uri.to_string()),
            mime_type: Some(mime_type.to_string()),
            text: text.into(),
        }
    }
}

/// Entry of `list_resources` (fixed `uri`) or `list_resource_templates` (`uriTemplate`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_template: Option<String>,
    pub name: String,
    pub mime_type: String,
    pub description: String,
}

/// Entry of `list_tools`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub annotations: Value,
}

/// Render backend JSON as the text of a content item.
pub(crate) fn to_text(value: &Value) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| ZoteroError::Json(e).into())
}
