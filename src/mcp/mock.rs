//! Recording backend for dispatcher tests.

use crate::backend::Backend;
use crate::error::{Result, ZoteroError};
use crate::types::WriteResponse;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub(crate) struct MockBackend {
    calls: Arc<Mutex<Vec<String>>>,
    fail_all: bool,
    fail_association: bool,
    reject_create: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call returns an API error.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn with_association_failure(mut self) -> Self {
        self.fail_association = true;
        self
    }

    /// Creates answer with a `failed` entry instead of a key.
    pub fn with_rejected_create(mut self) -> Self {
        self.reject_create = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        if self.fail_all {
            return Err(ZoteroError::Api {
                status: 500,
                message: format!("{} failed", call),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn list_collections(&self) -> Result<Value> {
        self.record("list_collections()".into())?;
        Ok(json!([{ "key": "COLL1", "data": { "name": "Thesis" } }]))
    }

    async fn list_top_items(&self, limit: u32) -> Result<Value> {
        self.record(format!("list_top_items({})", limit))?;
        Ok(json!([{ "key": "TOP1" }]))
    }

    async fn list_recent_items(&self, limit: u32) -> Result<Value> {
        self.record(format!("list_recent_items({})", limit))?;
        Ok(json!([{ "key": "NEW1" }]))
    }

    async fn list_collection_items(&self, collection_key: &str) -> Result<Value> {
        self.record(format!("list_collection_items({})", collection_key))?;
        Ok(json!([{ "key": "ITEM1", "data": { "collections": [collection_key] } }]))
    }

    async fn get_item(&self, item_key: &str) -> Result<Value> {
        self.record(format!("get_item({})", item_key))?;
        Ok(json!({ "key": item_key, "version": 3, "data": { "title": "T" } }))
    }

    async fn search_items(
        &self,
        query: &str,
        collection_key: Option<&str>,
        limit: u32,
    ) -> Result<Value> {
        self.record(format!(
            "search_items({}, {}, {})",
            query,
            collection_key.unwrap_or("-"),
            limit
        ))?;
        Ok(json!([{ "key": "HIT1" }, { "key": "HIT2" }]))
    }

    async fn get_citation(&self, item_key: &str, style: &str) -> Result<String> {
        self.record(format!("get_citation({}, {})", item_key, style))?;
        Ok(format!("(Citation {} {})", item_key, style))
    }

    async fn get_bibliography(&self, item_keys: &[&str], style: &str) -> Result<String> {
        self.record(format!("get_bibliography({}, {})", item_keys.join("+"), style))?;
        Ok(format!("<div class=\"csl-bib-body\">{}</div>", item_keys.len()))
    }

    async fn create_item(
        &self,
        item_type: &str,
        fields: &Map<String, Value>,
    ) -> Result<WriteResponse> {
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        self.record(format!("create_item({}, [{}])", item_type, keys.join(",")))?;
        if self.reject_create {
            return Ok(WriteResponse(json!({
                "successful": {}, "success": {}, "unchanged": {},
                "failed": { "0": { "code": 400, "message": "Invalid item type" } }
            })));
        }
        Ok(WriteResponse(json!({
            "successful": { "0": { "key": "NEWKEY1", "version": 1 } },
            "success": { "0": "NEWKEY1" },
            "unchanged": {},
            "failed": {}
        })))
    }

    async fn update_item(&self, item_key: &str, patch: &Map<String, Value>) -> Result<Value> {
        let keys: Vec<&str> = patch.keys().map(String::as_str).collect();
        self.record(format!("update_item({}, [{}])", item_key, keys.join(",")))?;
        Ok(json!({ "success": true, "item_key": item_key }))
    }

    async fn delete_item(&self, item_key: &str) -> Result<Value> {
        self.record(format!("delete_item({})", item_key))?;
        Ok(json!({ "success": true, "message": format!("Item {} deleted", item_key) }))
    }

    async fn add_item_to_collection(&self, collection_key: &str, item_key: &str) -> Result<Value> {
        self.record(format!("add_item_to_collection({}, {})", collection_key, item_key))?;
        if self.fail_association {
            return Err(ZoteroError::VersionConflict("item changed".into()));
        }
        Ok(json!({ "success": true }))
    }

    async fn list_item_types(&self) -> Result<Value> {
        self.record("list_item_types()".into())?;
        Ok(json!([{ "itemType": "book", "localized": "Book" }]))
    }

    async fn list_item_type_fields(&self, item_type: &str) -> Result<Value> {
        self.record(format!("list_item_type_fields({})", item_type))?;
        Ok(json!([{ "field": "title", "localized": "Title" }]))
    }

    async fn create_collection(&self, name: &str, parent_key: Option<&str>) -> Result<WriteResponse> {
        self.record(format!("create_collection({}, {})", name, parent_key.unwrap_or("-")))?;
        Ok(WriteResponse(json!({ "success": { "0": "COLLNEW" }, "failed": {} })))
    }
}
