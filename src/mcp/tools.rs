//! Tools: named, argument-validated actions against the library.
//!
//! Arguments are checked and defaults applied here, before the backend
//! is touched, so a rejected call has no side effects.

use crate::backend::{Backend, BackendHandle};
use crate::error::McpError;
use crate::mcp::protocol::{to_text, ContentItem, ToolDescriptor};
use crate::types::is_object_key;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Default CSL style for citations and bibliographies.
pub const DEFAULT_STYLE: &str = "apa";

/// Default page size for `search_items`.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    SearchItems,
    GetCitation,
    AddItem,
    GetBibliography,
    CreateCollection,
    UpdateItem,
    DeleteItem,
    GetItemTypes,
    GetItemFields,
}

impl Tool {
    pub const ALL: [Tool; 9] = [
        Tool::SearchItems,
        Tool::GetCitation,
        Tool::AddItem,
        Tool::GetBibliography,
        Tool::CreateCollection,
        Tool::UpdateItem,
        Tool::DeleteItem,
        Tool::GetItemTypes,
        Tool::GetItemFields,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::SearchItems => "search_items",
            Tool::GetCitation => "get_citation",
            Tool::AddItem => "add_item",
            Tool::GetBibliography => "get_bibliography",
            Tool::CreateCollection => "create_collection",
            Tool::UpdateItem => "update_item",
            Tool::DeleteItem => "delete_item",
            Tool::GetItemTypes => "get_item_types",
            Tool::GetItemFields => "get_item_fields",
        }
    }

    /// Keys that must be present and non-null.
    pub fn required(self) -> &'static [&'static str] {
        match self {
            Tool::SearchItems => &["query"],
            Tool::GetCitation => &["item_key"],
            Tool::AddItem => &["item_type", "title"],
            Tool::GetBibliography => &["item_keys"],
            Tool::CreateCollection => &["name"],
            Tool::UpdateItem => &["item_key", "updates"],
            Tool::DeleteItem => &["item_key"],
            Tool::GetItemTypes => &[],
            Tool::GetItemFields => &["item_type"],
        }
    }

    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Tool::AddItem | Tool::CreateCollection | Tool::UpdateItem | Tool::DeleteItem
        )
    }

    fn description(self) -> &'static str {
        match self {
            Tool::SearchItems => "Search for items in the Zotero library, optionally within one collection.",
            Tool::GetCitation => "Get a formatted citation for one item (CSL style, default apa).",
            Tool::AddItem => "Add a new item to the Zotero library, optionally filing it into a collection.",
            Tool::GetBibliography => "Get a formatted bibliography for several items (CSL style, default apa).",
            Tool::CreateCollection => "Create a new collection, optionally nested under a parent collection.",
            Tool::UpdateItem => "Update fields of an existing item.",
            Tool::DeleteItem => "Delete an item from the Zotero library.",
            Tool::GetItemTypes => "List all available Zotero item types.",
            Tool::GetItemFields => "List the fields available for an item type.",
        }
    }

    fn properties(self) -> Value {
        match self {
            Tool::SearchItems => json!({
                "query": { "type": "string", "description": "Search query string" },
                "collection_key": { "type": "string", "description": "Collection key to search within" },
                "limit": { "type": "integer", "description": "Maximum number of results (default 20)", "default": DEFAULT_SEARCH_LIMIT }
            }),
            Tool::GetCitation => json!({
                "item_key": { "type": "string", "description": "Zotero item key" },
                "style": { "type": "string", "description": "Citation style (apa, mla, chicago, ...)", "default": DEFAULT_STYLE }
            }),
            Tool::AddItem => json!({
                "item_type": { "type": "string", "description": "Item type (journalArticle, book, webpage, ...)" },
                "title": { "type": "string", "description": "Item title" },
                "creators": {
                    "type": "array",
                    "description": "Creators, e.g. [{\"creatorType\": \"author\", \"firstName\": \"...\", \"lastName\": \"...\"}]",
                    "items": { "type": "object" }
                },
                "collection_key": { "type": "string", "description": "Collection to add the new item to" },
                "additional_fields": { "type": "object", "description": "Additional fields (date, url, publisher, ...)" }
            }),
            Tool::GetBibliography => json!({
                "item_keys": { "type": "array", "items": { "type": "string" }, "description": "Zotero item keys" },
                "style": { "type": "string", "description": "Citation style (apa, mla, chicago, ...)", "default": DEFAULT_STYLE }
            }),
            Tool::CreateCollection => json!({
                "name": { "type": "string", "description": "Name of the new collection" },
                "parent_key": { "type": "string", "description": "Parent collection key for nested collections" }
            }),
            Tool::UpdateItem => json!({
                "item_key": { "type": "string", "description": "Zotero item key to update" },
                "updates": { "type": "object", "description": "Fields to update" }
            }),
            Tool::DeleteItem => json!({
                "item_key": { "type": "string", "description": "Zotero item key to delete" }
            }),
            Tool::GetItemTypes => json!({}),
            Tool::GetItemFields => json!({
                "item_type": { "type": "string", "description": "Item type (journalArticle, book, ...)" }
            }),
        }
    }

    pub fn descriptor(self) -> ToolDescriptor {
        let read_only = !self.is_mutating();
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: json!({
                "type": "object",
                "properties": self.properties(),
                "required": self.required(),
            }),
            annotations: json!({
                "readOnlyHint": read_only,
                "destructiveHint": matches!(self, Tool::DeleteItem | Tool::UpdateItem),
                "idempotentHint": read_only || matches!(self, Tool::DeleteItem),
                "openWorldHint": true
            }),
        }
    }
}

/// A tool call whose arguments have been validated and defaulted.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    SearchItems {
        query: String,
        collection_key: Option<String>,
        limit: u32,
    },
    GetCitation {
        item_key: String,
        style: String,
    },
    AddItem {
        item_type: String,
        fields: Map<String, Value>,
        collection_key: Option<String>,
    },
    GetBibliography {
        item_keys: Vec<String>,
        style: String,
    },
    CreateCollection {
        name: String,
        parent_key: Option<String>,
    },
    UpdateItem {
        item_key: String,
        updates: Map<String, Value>,
    },
    DeleteItem {
        item_key: String,
    },
    GetItemTypes,
    GetItemFields {
        item_type: String,
    },
}

const OBJECT_KEY: &str = "a Zotero object key (A-Z, 0-9)";

/// Typed access to one call's argument object.
struct Args<'a> {
    tool: Tool,
    map: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    fn present(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn ill_typed(&self, key: &str, expected: &str) -> McpError {
        McpError::InvalidArguments(format!(
            "{}: '{}' must be {}",
            self.tool.name(),
            key,
            expected
        ))
    }

    fn opt_str(&self, key: &str) -> Result<Option<String>, McpError> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.clone())),
            Some(_) => Err(self.ill_typed(key, "a non-empty string")),
        }
    }

    /// Presence was already checked against [`Tool::required`].
    fn str(&self, key: &str) -> Result<String, McpError> {
        self.opt_str(key)?
            .ok_or_else(|| McpError::missing_arguments(self.tool.name(), &[key]))
    }

    fn opt_key(&self, key: &str) -> Result<Option<String>, McpError> {
        match self.opt_str(key)? {
            Some(value) if !is_object_key(&value) => Err(self.ill_typed(key, OBJECT_KEY)),
            other => Ok(other),
        }
    }

    fn key(&self, key: &str) -> Result<String, McpError> {
        self.opt_key(key)?
            .ok_or_else(|| McpError::missing_arguments(self.tool.name(), &[key]))
    }

    fn u32_or(&self, key: &str, default: u32) -> Result<u32, McpError> {
        match self.present(key) {
            None => Ok(default),
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| self.ill_typed(key, "a non-negative integer")),
        }
    }

    fn object(&self, key: &str) -> Result<Option<Map<String, Value>>, McpError> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map.clone())),
            Some(_) => Err(self.ill_typed(key, "an object")),
        }
    }

    fn key_list(&self, key: &str) -> Result<Vec<String>, McpError> {
        let items = self
            .present(key)
            .and_then(Value::as_array)
            .ok_or_else(|| self.ill_typed(key, "an array of object keys"))?;
        let strings: Option<Vec<String>> = items
            .iter()
            .map(|v| v.as_str().filter(|s| is_object_key(s)).map(String::from))
            .collect();
        match strings {
            Some(list) if !list.is_empty() => Ok(list),
            _ => Err(self.ill_typed(key, "a non-empty array of object keys")),
        }
    }
}

impl Invocation {
    /// Validate `arguments` for `tool`, applying defaults for omitted options.
    pub fn parse(tool: Tool, arguments: &Value) -> Result<Self, McpError> {
        let empty = Map::new();
        let map = match arguments {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => {
                return Err(McpError::InvalidArguments(format!(
                    "{}: arguments must be an object",
                    tool.name()
                )))
            }
        };
        let args = Args { tool, map };

        let missing: Vec<&str> = tool
            .required()
            .iter()
            .copied()
            .filter(|key| args.present(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(McpError::missing_arguments(tool.name(), &missing));
        }

        let style = || -> Result<String, McpError> {
            Ok(args.opt_str("style")?.unwrap_or_else(|| DEFAULT_STYLE.to_string()))
        };

        let invocation = match tool {
            Tool::SearchItems => Invocation::SearchItems {
                query: args.str("query")?,
                collection_key: args.opt_key("collection_key")?,
                limit: args.u32_or("limit", DEFAULT_SEARCH_LIMIT)?,
            },
            Tool::GetCitation => Invocation::GetCitation {
                item_key: args.key("item_key")?,
                style: style()?,
            },
            Tool::AddItem => {
                // Named arguments win over additional_fields; the type comes from item_type.
                let mut fields = args.object("additional_fields")?.unwrap_or_default();
                fields.remove("itemType");
                fields.insert("title".to_string(), Value::String(args.str("title")?));
                if let Some(creators) = args.present("creators") {
                    if !creators.is_array() {
                        return Err(args.ill_typed("creators", "an array of creator objects"));
                    }
                    fields.insert("creators".to_string(), creators.clone());
                }
                Invocation::AddItem {
                    item_type: args.str("item_type")?,
                    fields,
                    collection_key: args.opt_key("collection_key")?,
                }
            }
            Tool::GetBibliography => Invocation::GetBibliography {
                item_keys: args.key_list("item_keys")?,
                style: style()?,
            },
            Tool::CreateCollection => Invocation::CreateCollection {
                name: args.str("name")?,
                parent_key: args.opt_key("parent_key")?,
            },
            Tool::UpdateItem => Invocation::UpdateItem {
                item_key: args.key("item_key")?,
                updates: args.object("updates")?.unwrap_or_default(),
            },
            Tool::DeleteItem => Invocation::DeleteItem {
                item_key: args.key("item_key")?,
            },
            Tool::GetItemTypes => Invocation::GetItemTypes,
            Tool::GetItemFields => Invocation::GetItemFields {
                item_type: args.str("item_type")?,
            },
        };
        Ok(invocation)
    }

    /// Run the call and return its content items (never empty).
    pub async fn execute(&self, backend: &dyn Backend) -> Result<Vec<ContentItem>, McpError> {
        let text = match self {
            Invocation::SearchItems {
                query,
                collection_key,
                limit,
            } => {
                let results = backend
                    .search_items(query, collection_key.as_deref(), *limit)
                    .await?;
                let count = results.as_array().map_or(0, Vec::len);
                to_text(&json!({ "query": query, "count": count, "results": results }))?
            }
            Invocation::GetCitation { item_key, style } => {
                backend.get_citation(item_key, style).await?
            }
            Invocation::AddItem {
                item_type,
                fields,
                collection_key,
            } => return add_item(backend, item_type, fields, collection_key.as_deref()).await,
            Invocation::GetBibliography { item_keys, style } => {
                let keys: Vec<&str> = item_keys.iter().map(String::as_str).collect();
                backend.get_bibliography(&keys, style).await?
            }
            Invocation::CreateCollection { name, parent_key } => {
                let response = backend
                    .create_collection(name, parent_key.as_deref())
                    .await?;
                to_text(&response.0)?
            }
            Invocation::UpdateItem { item_key, updates } => {
                to_text(&backend.update_item(item_key, updates).await?)?
            }
            Invocation::DeleteItem { item_key } => to_text(&backend.delete_item(item_key).await?)?,
            Invocation::GetItemTypes => to_text(&backend.list_item_types().await?)?,
            Invocation::GetItemFields { item_type } => {
                to_text(&backend.list_item_type_fields(item_type).await?)?
            }
        };
        Ok(vec![ContentItem::text(text)])
    }
}

/// Create the item, then file it into `collection_key` if one was named.
///
/// The raw create response is always the first content item. A second item
/// reports the collection step, so a failed association never hides the
/// key of the item that was created.
async fn add_item(
    backend: &dyn Backend,
    item_type: &str,
    fields: &Map<String, Value>,
    collection_key: Option<&str>,
) -> Result<Vec<ContentItem>, McpError> {
    let created = backend.create_item(item_type, fields).await?;
    let mut content = vec![ContentItem::text(to_text(&created.0)?)];

    let Some(collection_key) = collection_key else {
        return Ok(content);
    };

    let outcome = match created.created_key() {
        Some(item_key) => match backend.add_item_to_collection(collection_key, item_key).await {
            Ok(_) => json!({
                "collection_key": collection_key,
                "item_key": item_key,
                "added": true,
            }),
            Err(e) => {
                tracing::warn!(collection_key, item_key, error = %e, "created item but could not add it to collection");
                json!({
                    "collection_key": collection_key,
                    "item_key": item_key,
                    "added": false,
                    "error": e.to_string(),
                })
            }
        },
        None => {
            let reason = created
                .failure()
                .and_then(|failure| failure["message"].as_str())
                .unwrap_or("no key returned");
            json!({
                "collection_key": collection_key,
                "added": false,
                "error": format!("item was not created ({}); collection left unchanged", reason),
            })
        }
    };
    content.push(ContentItem::text(to_text(&outcome)?));
    Ok(content)
}

/// Name → tool lookup, fixed at startup.
#[derive(Debug)]
pub struct ToolRegistry {
    by_name: HashMap<&'static str, Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let by_name = Tool::ALL.iter().map(|tool| (tool.name(), *tool)).collect();
        Self { by_name }
    }

    pub fn lookup(&self, name: &str) -> Result<Tool, McpError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| McpError::ToolNotFound(name.to_string()))
    }

    /// Descriptors for `list_tools`, in declaration order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        Tool::ALL.iter().map(|tool| tool.descriptor()).collect()
    }

    /// Resolve, validate and run a tool, producing the `{content: [...]}` result.
    pub async fn call(
        &self,
        name: &str,
        arguments: &Value,
        backend: &BackendHandle,
    ) -> Result<Value, McpError> {
        let tool = self.lookup(name)?;
        let invocation = Invocation::parse(tool, arguments)?;
        let backend = backend.get()?;
        tracing::debug!(tool = name, mutating = tool.is_mutating(), "calling tool");
        let content = invocation.execute(backend).await?;
        Ok(json!({ "content": content }))
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::mock::MockBackend;

    async fn call(mock: &MockBackend, name: &str, args: Value) -> Result<Value, McpError> {
        let handle = BackendHandle::ready(mock.clone());
        ToolRegistry::new().call(name, &args, &handle).await
    }

    fn text(result: &Value, index: usize) -> Value {
        serde_json::from_str(result["content"][index]["text"].as_str().unwrap()).unwrap()
    }

    #[test]
    fn test_descriptors_cover_all_tools() {
        let names: Vec<String> = ToolRegistry::new()
            .descriptors()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "search_items",
                "get_citation",
                "add_item",
                "get_bibliography",
                "create_collection",
                "update_item",
                "delete_item",
                "get_item_types",
                "get_item_fields"
            ]
        );
    }

    #[test]
    fn test_schema_required_keys() {
        let d = Tool::AddItem.descriptor();
        assert_eq!(d.input_schema["required"], json!(["item_type", "title"]));
        assert_eq!(d.annotations["readOnlyHint"], false);
        let d = Tool::GetItemTypes.descriptor();
        assert_eq!(d.input_schema["required"], json!([]));
        assert_eq!(d.annotations["readOnlyHint"], true);
    }

    #[test]
    fn test_defaults_applied() {
        let inv = Invocation::parse(Tool::GetCitation, &json!({ "item_key": "K" })).unwrap();
        assert_eq!(
            inv,
            Invocation::GetCitation {
                item_key: "K".into(),
                style: "apa".into()
            }
        );
        let inv = Invocation::parse(Tool::SearchItems, &json!({ "query": "q" })).unwrap();
        assert_eq!(
            inv,
            Invocation::SearchItems {
                query: "q".into(),
                collection_key: None,
                limit: 20
            }
        );
    }

    #[test]
    fn test_missing_keys_all_named() {
        let err = Invocation::parse(Tool::AddItem, &json!({})).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'item_type'") && msg.contains("'title'"), "{}", msg);
        assert_eq!(err.code(), -32602);

        let err = Invocation::parse(Tool::UpdateItem, &json!({ "item_key": "K", "updates": null }))
            .unwrap_err();
        assert!(err.to_string().contains("'updates'"));
    }

    #[test]
    fn test_ill_typed_arguments() {
        let cases = [
            (Tool::SearchItems, json!({ "query": "q", "limit": "ten" })),
            (Tool::SearchItems, json!({ "query": "q", "limit": -1 })),
            (Tool::SearchItems, json!({ "query": 5 })),
            (Tool::GetBibliography, json!({ "item_keys": "A,B" })),
            (Tool::GetBibliography, json!({ "item_keys": [] })),
            (Tool::GetBibliography, json!({ "item_keys": ["A", 2] })),
            (Tool::UpdateItem, json!({ "item_key": "K", "updates": [1] })),
            (Tool::AddItem, json!({ "item_type": "book", "title": "T", "creators": {} })),
            (Tool::DeleteItem, json!({ "item_key": "" })),
            (Tool::GetItemTypes, json!([])),
        ];
        for (tool, args) in cases {
            assert!(
                matches!(Invocation::parse(tool, &args), Err(McpError::InvalidArguments(_))),
                "{:?} {}",
                tool,
                args
            );
        }
    }

    #[test]
    fn test_add_item_fields_merge() {
        let inv = Invocation::parse(
            Tool::AddItem,
            &json!({
                "item_type": "book",
                "title": "T",
                "creators": [{ "creatorType": "author", "lastName": "Curie" }],
                "additional_fields": { "date": "1903", "publisher": "P" }
            }),
        )
        .unwrap();
        match inv {
            Invocation::AddItem { fields, collection_key, .. } => {
                assert_eq!(fields["title"], "T");
                assert_eq!(fields["date"], "1903");
                assert!(fields["creators"].is_array());
                assert!(collection_key.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_additional_fields_cannot_override_named_arguments() {
        let inv = Invocation::parse(
            Tool::AddItem,
            &json!({
                "item_type": "journalArticle",
                "title": "T",
                "additional_fields": { "title": "Other", "itemType": "book", "date": "1903" }
            }),
        )
        .unwrap();
        match inv {
            Invocation::AddItem { item_type, fields, .. } => {
                assert_eq!(item_type, "journalArticle");
                assert_eq!(fields["title"], "T");
                assert_eq!(fields["date"], "1903");
                assert!(!fields.contains_key("itemType"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_keys_must_be_object_keys() {
        let cases = [
            (Tool::GetCitation, json!({ "item_key": "../../../groups/999/items/X" })),
            (Tool::GetCitation, json!({ "item_key": "K?itemKey=A,B" })),
            (Tool::DeleteItem, json!({ "item_key": "../K" })),
            (Tool::UpdateItem, json!({ "item_key": "k1", "updates": {} })),
            (Tool::SearchItems, json!({ "query": "q", "collection_key": "C/1" })),
            (Tool::AddItem, json!({ "item_type": "book", "title": "T", "collection_key": ".." })),
            (Tool::CreateCollection, json!({ "name": "N", "parent_key": "P#1" })),
            (Tool::GetBibliography, json!({ "item_keys": ["A", "../B"] })),
        ];
        for (tool, args) in cases {
            assert!(
                matches!(Invocation::parse(tool, &args), Err(McpError::InvalidArguments(_))),
                "{:?} {}",
                tool,
                args
            );
        }
    }

    #[tokio::test]
    async fn test_traversal_key_never_reaches_backend() {
        let mock = MockBackend::new();
        let err = call(
            &mock,
            "get_citation",
            json!({ "item_key": "../../../groups/999/items/X" }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), -32602);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_without_query_never_calls_backend() {
        let mock = MockBackend::new();
        let err = call(&mock, "search_items", json!({})).await.unwrap_err();
        assert_eq!(err.code(), -32602);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let mock = MockBackend::new();
        let err = call(&mock, "frobnicate_items", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::ToolNotFound(ref n) if n == "frobnicate_items"));
        assert_eq!(err.code(), -32601);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_wraps_results() {
        let mock = MockBackend::new();
        let result = call(
            &mock,
            "search_items",
            json!({ "query": "curie", "collection_key": "C1", "limit": 5 }),
        )
        .await
        .unwrap();
        assert_eq!(mock.calls(), vec!["search_items(curie, C1, 5)"]);
        let body = text(&result, 0);
        assert_eq!(body["query"], "curie");
        assert_eq!(body["count"], 2);
    }

    #[tokio::test]
    async fn test_add_item_with_collection() {
        let mock = MockBackend::new();
        let result = call(
            &mock,
            "add_item",
            json!({ "item_type": "journalArticle", "title": "T", "collection_key": "COLL1" }),
        )
        .await
        .unwrap();
        assert_eq!(
            mock.calls(),
            vec![
                "create_item(journalArticle, [title])",
                "add_item_to_collection(COLL1, NEWKEY1)"
            ]
        );
        assert_eq!(text(&result, 0)["success"]["0"], "NEWKEY1");
        assert_eq!(text(&result, 1)["added"], true);
    }

    #[tokio::test]
    async fn test_add_item_association_failure_keeps_created_key() {
        let mock = MockBackend::new().with_association_failure();
        let result = call(
            &mock,
            "add_item",
            json!({ "item_type": "journalArticle", "title": "T", "collection_key": "COLL1" }),
        )
        .await
        .unwrap();
        assert_eq!(mock.calls().len(), 2);
        assert_eq!(text(&result, 0)["success"]["0"], "NEWKEY1");
        let assoc = text(&result, 1);
        assert_eq!(assoc["added"], false);
        assert_eq!(assoc["item_key"], "NEWKEY1");
        assert!(assoc["error"].as_str().unwrap().contains("item changed"));
    }

    #[tokio::test]
    async fn test_add_item_rejected_create_skips_association() {
        let mock = MockBackend::new().with_rejected_create();
        let result = call(
            &mock,
            "add_item",
            json!({ "item_type": "nonsense", "title": "T", "collection_key": "COLL1" }),
        )
        .await
        .unwrap();
        assert_eq!(mock.calls(), vec!["create_item(nonsense, [title])"]);
        assert_eq!(text(&result, 0)["failed"]["0"]["code"], 400);
        assert_eq!(text(&result, 1)["added"], false);
        assert!(text(&result, 1)["error"]
            .as_str()
            .unwrap()
            .contains("Invalid item type"));
    }

    #[tokio::test]
    async fn test_add_item_without_collection_single_content() {
        let mock = MockBackend::new();
        let result = call(&mock, "add_item", json!({ "item_type": "book", "title": "T" }))
            .await
            .unwrap();
        assert_eq!(result["content"].as_array().unwrap().len(), 1);
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_bibliography_and_citation_text() {
        let mock = MockBackend::new();
        let result = call(
            &mock,
            "get_bibliography",
            json!({ "item_keys": ["A", "B"], "style": "mla" }),
        )
        .await
        .unwrap();
        assert_eq!(result["content"][0]["type"], "text");
        assert!(result["content"][0]["text"].as_str().unwrap().contains("csl-bib-body"));

        call(&mock, "get_citation", json!({ "item_key": "A" }))
            .await
            .unwrap();
        assert_eq!(
            mock.calls(),
            vec!["get_bibliography(A+B, mla)", "get_citation(A, apa)"]
        );
    }

    #[tokio::test]
    async fn test_mutating_tools_pass_through() {
        let mock = MockBackend::new();
        let result = call(&mock, "delete_item", json!({ "item_key": "K1" })).await.unwrap();
        assert_eq!(text(&result, 0)["message"], "Item K1 deleted");

        call(&mock, "update_item", json!({ "item_key": "K1", "updates": { "title": "New" } }))
            .await
            .unwrap();
        let result = call(&mock, "create_collection", json!({ "name": "Reading", "parent_key": "P" }))
            .await
            .unwrap();
        assert_eq!(text(&result, 0)["success"]["0"], "COLLNEW");
        call(&mock, "get_item_types", Value::Null).await.unwrap();
        call(&mock, "get_item_fields", json!({ "item_type": "book" }))
            .await
            .unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                "delete_item(K1)",
                "update_item(K1, [title])",
                "create_collection(Reading, P)",
                "list_item_types()",
                "list_item_type_fields(book)"
            ]
        );
    }

    #[tokio::test]
    async fn test_validation_precedes_unavailable_backend() {
        let handle = BackendHandle::unavailable("no key");
        let registry = ToolRegistry::new();
        let err = registry
            .call("get_citation", &json!({}), &handle)
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidArguments(_)));
        let err = registry
            .call("get_citation", &json!({ "item_key": "K" }), &handle)
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_backend_error_surfaces_as_failure() {
        let mock = MockBackend::failing();
        let err = call(&mock, "get_item_types", json!({})).await.unwrap_err();
        assert!(matches!(err, McpError::BackendFailure(_)));
        assert_eq!(err.code(), -32000);
    }
}
