//! The backend seam between the MCP layer and a reference library.
//!
//! The dispatcher only talks to [`Backend`]; [`ZoteroClient`] is the
//! production implementation and tests substitute a recording mock.

use crate::client::ZoteroClient;
use crate::error::{McpError, Result};
use crate::types::WriteResponse;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Operations the resource and tool layer needs from a reference library.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_collections(&self) -> Result<Value>;
    async fn list_top_items(&self, limit: u32) -> Result<Value>;
    async fn list_recent_items(&self, limit: u32) -> Result<Value>;
    async fn list_collection_items(&self, collection_key: &str) -> Result<Value>;
    async fn get_item(&self, item_key: &str) -> Result<Value>;
    async fn search_items(
        &self,
        query: &str,
        collection_key: Option<&str>,
        limit: u32,
    ) -> Result<Value>;
    async fn get_citation(&self, item_key: &str, style: &str) -> Result<String>;
    async fn get_bibliography(&self, item_keys: &[&str], style: &str) -> Result<String>;
    async fn create_item(&self, item_type: &str, fields: &Map<String, Value>)
        -> Result<WriteResponse>;
    async fn update_item(&self, item_key: &str, patch: &Map<String, Value>) -> Result<Value>;
    async fn delete_item(&self, item_key: &str) -> Result<Value>;
    async fn add_item_to_collection(&self, collection_key: &str, item_key: &str)
        -> Result<Value>;
    async fn list_item_types(&self) -> Result<Value>;
    async fn list_item_type_fields(&self, item_type: &str) -> Result<Value>;
    async fn create_collection(&self, name: &str, parent_key: Option<&str>)
        -> Result<WriteResponse>;
}

#[async_trait]
impl Backend for ZoteroClient {
    async fn list_collections(&self) -> Result<Value> {
        ZoteroClient::list_collections(self).await
    }

    async fn list_top_items(&self, limit: u32) -> Result<Value> {
        ZoteroClient::list_top_items(self, limit).await
    }

    async fn list_recent_items(&self, limit: u32) -> Result<Value> {
        ZoteroClient::list_recent_items(self, limit).await
    }

    async fn list_collection_items(&self, collection_key: &str) -> Result<Value> {
        ZoteroClient::list_collection_items(self, collection_key).await
    }

    async fn get_item(&self, item_key: &str) -> Result<Value> {
        ZoteroClient::get_item(self, item_key).await
    }

    async fn search_items(
        &self,
        query: &str,
        collection_key: Option<&str>,
        limit: u32,
    ) -> Result<Value> {
        ZoteroClient::search_items(self, query, collection_key, limit).await
    }

    async fn get_citation(&self, item_key: &str, style: &str) -> Result<String> {
        ZoteroClient::get_citation(self, item_key, style).await
    }

    async fn get_bibliography(&self, item_keys: &[&str], style: &str) -> Result<String> {
        ZoteroClient::get_bibliography(self, item_keys, style).await
    }

    async fn create_item(
        &self,
        item_type: &str,
        fields: &Map<String, Value>,
    ) -> Result<WriteResponse> {
        ZoteroClient::create_item(self, item_type, fields).await
    }

    async fn update_item(&self, item_key: &str, patch: &Map<String, Value>) -> Result<Value> {
        ZoteroClient::update_item(self, item_key, patch).await
    }

    async fn delete_item(&self, item_key: &str) -> Result<Value> {
        ZoteroClient::delete_item(self, item_key).await
    }

    async fn add_item_to_collection(
        &self,
        collection_key: &str,
        item_key: &str,
    ) -> Result<Value> {
        ZoteroClient::add_item_to_collection(self, collection_key, item_key).await
    }

    async fn list_item_types(&self) -> Result<Value> {
        ZoteroClient::list_item_types(self).await
    }

    async fn list_item_type_fields(&self, item_type: &str) -> Result<Value> {
        ZoteroClient::list_item_type_fields(self, item_type).await
    }

    async fn create_collection(
        &self,
        name: &str,
        parent_key: Option<&str>,
    ) -> Result<WriteResponse> {
        ZoteroClient::create_collection(self, name, parent_key).await
    }
}

/// The single backend instance owned by the dispatcher.
///
/// Built once at startup. When the client could not be configured the
/// handle stays `Unavailable` and every backend-bound request fails fast.
pub enum BackendHandle {
    Ready(Box<dyn Backend>),
    Unavailable { reason: String },
}

impl BackendHandle {
    pub fn ready(backend: impl Backend + 'static) -> Self {
        BackendHandle::Ready(Box::new(backend))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        BackendHandle::Unavailable {
            reason: reason.into(),
        }
    }

    /// Borrow the backend, or fail with [`McpError::BackendUnavailable`].
    pub fn get(&self) -> std::result::Result<&dyn Backend, McpError> {
        match self {
            BackendHandle::Ready(backend) => Ok(backend.as_ref()),
            BackendHandle::Unavailable { reason } => {
                Err(McpError::BackendUnavailable(reason.clone()))
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BackendHandle::Ready(_))
    }
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendHandle::Ready(_) => f.write_str("BackendHandle::Ready"),
            BackendHandle::Unavailable { reason } => f
                .debug_struct("BackendHandle::Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}
