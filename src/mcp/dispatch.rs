//! Request dispatch: one decoded line in, at most one response out.
//!
//! Each line goes through decode, dispatch and respond. Every failure on
//! the way becomes an error response carrying the request id (or `null`
//! when the id cannot be recovered), so the loop never stops on a bad request.

use crate::backend::BackendHandle;
use crate::config::ServerSettings;
use crate::error::{McpError, RegistryError};
use crate::mcp::protocol::{Request, Response, PROTOCOL_VERSION, SERVER_NAME};
use crate::mcp::resources::ResourceRegistry;
use crate::mcp::tools::ToolRegistry;
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    Ping,
    ListResources,
    ListResourceTemplates,
    ReadResource,
    ListTools,
    CallTool,
}

impl Method {
    /// Accepted method names, including the MCP slash-style aliases.
    const TABLE: [(&'static str, Method); 12] = [
        ("initialize", Method::Initialize),
        ("ping", Method::Ping),
        ("list_resources", Method::ListResources),
        ("list_resource_templates", Method::ListResourceTemplates),
        ("read_resource", Method::ReadResource),
        ("list_tools", Method::ListTools),
        ("call_tool", Method::CallTool),
        ("resources/list", Method::ListResources),
        ("resources/templates/list", Method::ListResourceTemplates),
        ("resources/read", Method::ReadResource),
        ("tools/list", Method::ListTools),
        ("tools/call", Method::CallTool),
    ];
}

/// Outcome of decoding one input line.
#[derive(Debug)]
pub enum Decoded {
    Request(Request),
    Notification(String),
}

/// Decode a raw line, or produce the error response for it.
pub fn decode(line: &str) -> Result<Decoded, Response> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        Response::error(Value::Null, &McpError::MalformedRequest(e.to_string()))
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    if !value.is_object() {
        return Err(Response::error(
            id,
            &McpError::InvalidRequest("expected a JSON object".to_string()),
        ));
    }

    let request: Request = serde_json::from_value(value)
        .map_err(|e| Response::error(id, &McpError::InvalidRequest(e.to_string())))?;

    if request.is_notification() {
        Ok(Decoded::Notification(request.method))
    } else {
        Ok(Decoded::Request(request))
    }
}

/// Routes requests to the resource and tool registries.
///
/// Owns the single backend handle; requests are handled one at a time.
#[derive(Debug)]
pub struct Dispatcher {
    backend: BackendHandle,
    resources: ResourceRegistry,
    tools: ToolRegistry,
    methods: HashMap<&'static str, Method>,
}

impl Dispatcher {
    pub fn new(backend: BackendHandle, settings: &ServerSettings) -> Result<Self, RegistryError> {
        Ok(Self::with_registries(
            backend,
            ResourceRegistry::new(settings)?,
            ToolRegistry::new(),
        ))
    }

    pub fn with_registries(
        backend: BackendHandle,
        resources: ResourceRegistry,
        tools: ToolRegistry,
    ) -> Self {
        Self {
            backend,
            resources,
            tools,
            methods: Method::TABLE.into_iter().collect(),
        }
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    /// Handle one raw line. Returns `None` only for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<Response> {
        match decode(line) {
            Ok(Decoded::Request(request)) => Some(self.handle_request(request).await),
            Ok(Decoded::Notification(method)) => {
                tracing::debug!(%method, "notification");
                None
            }
            Err(response) => {
                if let Some(err) = response.error_object() {
                    tracing::warn!(code = err.code, message = %err.message, "rejected input line");
                }
                Some(response)
            }
        }
    }

    /// Dispatch a decoded request and build its response.
    pub async fn handle_request(&self, request: Request) -> Response {
        let id = request.response_id();
        tracing::debug!(method = %request.method, id = %id, "dispatching");

        let outcome = match self.methods.get(request.method.as_str()) {
            Some(method) => self.dispatch(*method, &request.params).await,
            None => Err(McpError::MethodNotFound(request.method.clone())),
        };

        match outcome {
            Ok(result) => Response::success(id, result),
            Err(err) => {
                tracing::warn!(method = %request.method, id = %id, code = err.code(), error = %err, "request failed");
                Response::error(id, &err)
            }
        }
    }

    async fn dispatch(&self, method: Method, params: &Value) -> Result<Value, McpError> {
        match method {
            Method::Initialize => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "resources": {},
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            })),
            Method::Ping => Ok(json!({})),
            Method::ListResources => Ok(json!({ "resources": self.resources.resources() })),
            Method::ListResourceTemplates => {
                Ok(json!({ "resourceTemplates": self.resources.templates() }))
            }
            Method::ListTools => Ok(json!({ "tools": self.tools.descriptors() })),
            Method::ReadResource => {
                let uri = params["uri"].as_str().ok_or_else(|| {
                    McpError::InvalidArguments("read_resource requires 'uri'".to_string())
                })?;
                self.resources.read(uri, &self.backend).await
            }
            Method::CallTool => {
                let name = params["name"].as_str().ok_or_else(|| {
                    McpError::InvalidArguments("call_tool requires 'name'".to_string())
                })?;
                self.tools
                    .call(name, &params["arguments"], &self.backend)
                    .await
            }
        }
    }
}
