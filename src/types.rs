//! Public types for the Zotero client.
//!
//! Zotero objects (items, collections) are passed through as raw JSON;
//! only the write-response envelope gets a typed view.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a Zotero multi-object write (`POST /items`, `POST /collections`).
///
/// The server answers with four maps keyed by the index of each submitted
/// object: `successful` (full objects), `success` (keys), `unchanged`
/// and `failed` (`{code, message}`). The raw body is kept as-is so it can
/// be passed through to callers unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteResponse(pub Value);

impl WriteResponse {
    /// Key of the object created at `index`, if the write succeeded.
    pub fn created_key_at(&self, index: usize) -> Option<&str> {
        let idx = index.to_string();
        self.0["success"][idx.as_str()]
            .as_str()
            .or_else(|| self.0["successful"][idx.as_str()]["key"].as_str())
    }

    /// Key of the first (usually only) created object.
    pub fn created_key(&self) -> Option<&str> {
        self.created_key_at(0)
    }

    /// Failure info (`{key?, code, message}`) for the first object, if it failed.
    pub fn failure(&self) -> Option<&Value> {
        self.0["failed"].get("0")
    }
}

/// True for a well-formed Zotero object key such as `ABCD2345`.
///
/// Keys are upper-case ASCII letters and digits. Anything else is refused
/// before it reaches a request path.
pub fn is_object_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 32
        && key
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Read the `version` of an item or collection as returned by the API.
pub(crate) fn object_version(object: &Value) -> Option<u64> {
    object["version"]
        .as_u64()
        .or_else(|| object["data"]["version"].as_u64())
}
