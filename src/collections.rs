//! Collection endpoints.

use crate::client::ZoteroClient;
use crate::error::{Result, ZoteroError};
use crate::types::{object_version, WriteResponse};
use serde_json::{json, Value};

impl ZoteroClient {
    /// List all collections in the library.
    pub async fn list_collections(&self) -> Result<Value> {
        self.get_json(self.library_endpoint(&["collections"])?, &[])
            .await
    }

    /// List the items of one collection.
    pub async fn list_collection_items(&self, collection_key: &str) -> Result<Value> {
        let url = self.library_endpoint(&["collections", collection_key, "items"])?;
        self.get_json(url, &[]).await
    }

    /// Create a collection, optionally nested under `parent_key`.
    pub async fn create_collection(
        &self,
        name: &str,
        parent_key: Option<&str>,
    ) -> Result<WriteResponse> {
        let mut collection = json!({ "name": name });
        if let Some(parent) = parent_key {
            collection["parentCollection"] = json!(parent);
        }

        let body = self
            .post_json(self.library_endpoint(&["collections"])?, &json!([collection]))
            .await?;
        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| ZoteroError::Parse(format!("Invalid create collection response: {}", e)))?;
        Ok(WriteResponse(parsed))
    }

    /// File an existing item into a collection.
    ///
    /// Items carry their collection memberships, so this reads the item,
    /// appends the key if it is not already present and patches it back.
    pub async fn add_item_to_collection(&self, collection_key: &str, item_key: &str) -> Result<Value> {
        let item = self.get_item(item_key).await?;
        let version = object_version(&item)
            .ok_or_else(|| ZoteroError::Parse(format!("Item {} has no version", item_key)))?;

        let mut collections: Vec<Value> = item["data"]["collections"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        if collections.iter().any(|c| c.as_str() == Some(collection_key)) {
            return Ok(json!({
                "success": true,
                "item_key": item_key,
                "collection_key": collection_key,
                "message": "Item already in collection",
            }));
        }
        collections.push(json!(collection_key));

        let url = self.library_endpoint(&["items", item_key])?;
        self.patch_json(url, &json!({ "collections": collections }), version)
            .await?;

        Ok(json!({
            "success": true,
            "item_key": item_key,
            "collection_key": collection_key,
        }))
    }
}
