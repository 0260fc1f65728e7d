//! # zotero-mcp
//!
//! Exposes a Zotero library to AI agents through the Model Context Protocol.
//!
//! Provides:
//! - **Library**: Async Zotero Web API client (collections, items, citations)
//! - **MCP core**: resource and tool registries plus a JSON-RPC dispatcher,
//!   independent of the backend behind the [`Backend`] trait
//! - **CLI**: `zotero-mcp` binary serving MCP over stdio (`cli` feature)
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use zotero_mcp::{BackendHandle, Dispatcher, ServerSettings, ZoteroClient};
//!
//! // Create client from ZOTERO_API_KEY and ZOTERO_USER_ID (or ZOTERO_GROUP_ID)
//! let client = ZoteroClient::from_env()?;
//! let dispatcher = Dispatcher::new(BackendHandle::ready(client), &ServerSettings::default())?;
//!
//! let response = dispatcher
//!     .handle_line(r#"{"jsonrpc":"2.0","method":"read_resource","params":{"uri":"zotero://collections"},"id":1}"#)
//!     .await;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod citations;
pub mod client;
pub mod collections;
pub mod config;
pub mod error;
pub mod items;
pub mod rate_limit;
pub mod types;

pub mod mcp;

#[cfg(test)]
pub(crate) mod stub;

// Re-export key types at the crate root.
pub use backend::{Backend, BackendHandle};
pub use client::ZoteroClient;
pub use config::{Library, ServerSettings, ZoteroConfig};
pub use error::{McpError, RegistryError, ZoteroError};
pub use mcp::Dispatcher;
pub use types::*;
