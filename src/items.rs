//! Item endpoints: listing, lookup, search and writes.
//!
//! Covers: top/recent/single items, quick search, create, update, delete,
//! and the item-type schema lookups used to build new items.

use crate::client::ZoteroClient;
use crate::error::{Result, ZoteroError};
use crate::types::{object_version, WriteResponse};
use serde_json::{json, Map, Value};

impl ZoteroClient {
    /// Top-level items (no child notes or attachments).
    pub async fn list_top_items(&self, limit: u32) -> Result<Value> {
        let limit = limit.to_string();
        let url = self.library_endpoint(&["items", "top"])?;
        self.get_json(url, &[("limit", limit.as_str())]).await
    }

    /// Most recently modified items, newest first.
    pub async fn list_recent_items(&self, limit: u32) -> Result<Value> {
        let limit = limit.to_string();
        let params = [
            ("limit", limit.as_str()),
            ("sort", "dateModified"),
            ("direction", "desc"),
        ];
        self.get_json(self.library_endpoint(&["items"])?, &params)
            .await
    }

    /// A single item by key.
    pub async fn get_item(&self, item_key: &str) -> Result<Value> {
        self.get_json(self.library_endpoint(&["items", item_key])?, &[])
            .await
    }

    /// Quick search over titles, creators and years.
    ///
    /// With a `collection_key`, only that collection's top-level items are searched.
    pub async fn search_items(
        &self,
        query: &str,
        collection_key: Option<&str>,
        limit: u32,
    ) -> Result<Value> {
        let limit = limit.to_string();
        let params = [("q", query), ("limit", limit.as_str())];
        let url = match collection_key {
            Some(key) => self.library_endpoint(&["collections", key, "items", "top"])?,
            None => self.library_endpoint(&["items"])?,
        };
        self.get_json(url, &params).await
    }

    /// Empty item of the given type, with every field it accepts.
    pub async fn item_template(&self, item_type: &str) -> Result<Value> {
        self.get_json(self.endpoint(&["items", "new"])?, &[("itemType", item_type)])
            .await
    }

    /// Create an item of `item_type` from `fields` (title, creators, date, ...).
    ///
    /// The server template for the type is fetched first so the submitted
    /// object always carries the full field set.
    pub async fn create_item(
        &self,
        item_type: &str,
        fields: &Map<String, Value>,
    ) -> Result<WriteResponse> {
        let mut template = self.item_template(item_type).await?;
        let object = template.as_object_mut().ok_or_else(|| {
            ZoteroError::Parse(format!("Template for '{}' is not an object", item_type))
        })?;
        for (key, value) in fields {
            object.insert(key.clone(), value.clone());
        }

        let body = self
            .post_json(self.library_endpoint(&["items"])?, &json!([template]))
            .await?;
        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| ZoteroError::Parse(format!("Invalid create item response: {}", e)))?;
        Ok(WriteResponse(parsed))
    }

    /// Apply a partial update to an item.
    pub async fn update_item(&self, item_key: &str, patch: &Map<String, Value>) -> Result<Value> {
        let item = self.get_item(item_key).await?;
        let version = object_version(&item)
            .ok_or_else(|| ZoteroError::Parse(format!("Item {} has no version", item_key)))?;

        let url = self.library_endpoint(&["items", item_key])?;
        self.patch_json(url, &Value::Object(patch.clone()), version)
            .await?;

        let fields: Vec<&String> = patch.keys().collect();
        Ok(json!({
            "success": true,
            "item_key": item_key,
            "updated_fields": fields,
        }))
    }

    /// Delete an item.
    pub async fn delete_item(&self, item_key: &str) -> Result<Value> {
        let item = self.get_item(item_key).await?;
        let version = object_version(&item)
            .ok_or_else(|| ZoteroError::Parse(format!("Item {} has no version", item_key)))?;

        let url = self.library_endpoint(&["items", item_key])?;
        self.delete(url, version).await?;

        Ok(json!({
            "success": true,
            "message": format!("Item {} deleted", item_key),
        }))
    }

    /// All item types (`journalArticle`, `book`, ...).
    pub async fn list_item_types(&self) -> Result<Value> {
        self.get_json(self.endpoint(&["itemTypes"])?, &[]).await
    }

    /// Fields valid for one item type.
    pub async fn list_item_type_fields(&self, item_type: &str) -> Result<Value> {
        let url = self.endpoint(&["itemTypeFields"])?;
        self.get_json(url, &[("itemType", item_type)]).await
    }
}
