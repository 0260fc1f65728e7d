//! Read-only resources: static URIs and URI templates.

use crate::backend::{Backend, BackendHandle};
use crate::config::ServerSettings;
use crate::error::{McpError, RegistryError};
use crate::mcp::protocol::{to_text, ContentItem, ResourceDescriptor};
use crate::mcp::template::{split_uri, Captures, UriTemplate};
use crate::types::is_object_key;
use serde_json::{json, Value};
use std::collections::HashMap;

const JSON_MIME: &str = "application/json";

/// Resources with a fixed URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticResource {
    Collections,
    TopItems,
    RecentItems,
}

impl StaticResource {
    pub const ALL: [StaticResource; 3] = [
        StaticResource::Collections,
        StaticResource::TopItems,
        StaticResource::RecentItems,
    ];

    fn path(self) -> &'static str {
        match self {
            StaticResource::Collections => "collections",
            StaticResource::TopItems => "items/top",
            StaticResource::RecentItems => "items/recent",
        }
    }

    fn name(self) -> &'static str {
        match self {
            StaticResource::Collections => "Collections",
            StaticResource::TopItems => "Top Items",
            StaticResource::RecentItems => "Recent Items",
        }
    }

    fn description(self) -> &'static str {
        match self {
            StaticResource::Collections => "List of collections in the Zotero library",
            StaticResource::TopItems => "Top-level items in the Zotero library",
            StaticResource::RecentItems => "Recently added or modified items in the Zotero library",
        }
    }
}

/// Resources addressed through a URI template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateResource {
    CollectionItems,
    Item,
    ItemCitation,
}

impl TemplateResource {
    pub const ALL: [TemplateResource; 3] = [
        TemplateResource::CollectionItems,
        TemplateResource::Item,
        TemplateResource::ItemCitation,
    ];

    fn path(self) -> &'static str {
        match self {
            TemplateResource::CollectionItems => "collections/{collection_key}/items",
            TemplateResource::Item => "items/{item_key}",
            TemplateResource::ItemCitation => "items/{item_key}/citation/{style}",
        }
    }

    fn name(self) -> &'static str {
        match self {
            TemplateResource::CollectionItems => "Collection Items",
            TemplateResource::Item => "Item",
            TemplateResource::ItemCitation => "Item Citation",
        }
    }

    fn description(self) -> &'static str {
        match self {
            TemplateResource::CollectionItems => "Items in a specific Zotero collection",
            TemplateResource::Item => "Details of a specific Zotero item",
            TemplateResource::ItemCitation => {
                "Citation for a specific Zotero item in a specific CSL style"
            }
        }
    }

    fn mime_type(self) -> &'static str {
        match self {
            TemplateResource::ItemCitation => "text/html",
            _ => JSON_MIME,
        }
    }
}

/// What a URI resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Static(StaticResource),
    Template(TemplateResource, Captures),
}

/// Registry of every readable resource, fixed after construction.
#[derive(Debug)]
pub struct ResourceRegistry {
    scheme: String,
    statics: Vec<(String, StaticResource)>,
    static_index: HashMap<String, StaticResource>,
    templates: Vec<(UriTemplate, TemplateResource)>,
    top_items_limit: u32,
    recent_items_limit: u32,
}

impl ResourceRegistry {
    /// Build the registry with the standard Zotero resources.
    pub fn new(settings: &ServerSettings) -> Result<Self, RegistryError> {
        let mut registry = Self::empty(settings);
        for resource in StaticResource::ALL {
            let uri = format!("{}://{}", registry.scheme, resource.path());
            registry.register_static(&uri, resource)?;
        }
        for resource in TemplateResource::ALL {
            let template = format!("{}://{}", registry.scheme, resource.path());
            registry.register_template(&template, resource)?;
        }
        Ok(registry)
    }

    pub(crate) fn empty(settings: &ServerSettings) -> Self {
        Self {
            scheme: settings.uri_scheme.clone(),
            statics: Vec::new(),
            static_index: HashMap::new(),
            templates: Vec::new(),
            top_items_limit: settings.top_items_limit,
            recent_items_limit: settings.recent_items_limit,
        }
    }

    pub(crate) fn register_static(
        &mut self,
        uri: &str,
        resource: StaticResource,
    ) -> Result<(), RegistryError> {
        if self.static_index.contains_key(uri) {
            return Err(RegistryError::DuplicateUri(uri.to_string()));
        }
        self.static_index.insert(uri.to_string(), resource);
        self.statics.push((uri.to_string(), resource));
        Ok(())
    }

    /// Add a template, rejecting it if any URI could match an existing one.
    pub(crate) fn register_template(
        &mut self,
        template: &str,
        resource: TemplateResource,
    ) -> Result<(), RegistryError> {
        let compiled = UriTemplate::compile(template)?;
        if let Some((existing, _)) = self.templates.iter().find(|(t, _)| t.overlaps(&compiled)) {
            return Err(RegistryError::AmbiguousTemplates {
                first: existing.to_string(),
                second: compiled.to_string(),
            });
        }
        self.templates.push((compiled, resource));
        Ok(())
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Descriptors for `list_resources`.
    pub fn resources(&self) -> Vec<ResourceDescriptor> {
        self.statics
            .iter()
            .map(|(uri, resource)| ResourceDescriptor {
                uri: Some(uri.clone()),
                uri_template: None,
                name: resource.name().to_string(),
                mime_type: JSON_MIME.to_string(),
                description: resource.description().to_string(),
            })
            .collect()
    }

    /// Descriptors for `list_resource_templates`.
    pub fn templates(&self) -> Vec<ResourceDescriptor> {
        self.templates
            .iter()
            .map(|(template, resource)| ResourceDescriptor {
                uri: None,
                uri_template: Some(template.to_string()),
                name: resource.name().to_string(),
                mime_type: resource.mime_type().to_string(),
                description: resource.description().to_string(),
            })
            .collect()
    }

    /// Resolve a URI: exact static match first, then templates.
    ///
    /// Templates never overlap one another, so at most one can match.
    /// A `*_key` placeholder only matches a Zotero object key.
    pub fn resolve(&self, uri: &str) -> Result<Resolved, McpError> {
        if let Some(resource) = self.static_index.get(uri) {
            return Ok(Resolved::Static(*resource));
        }

        let not_found = || McpError::ResourceNotFound(uri.to_string());
        if split_uri(uri).is_none() {
            return Err(not_found());
        }

        self.templates
            .iter()
            .find_map(|(template, resource)| {
                template
                    .matches(uri)
                    .filter(|captures| {
                        captures
                            .iter()
                            .filter(|(name, _)| name.ends_with("_key"))
                            .all(|(_, value)| is_object_key(value))
                    })
                    .map(|captures| Resolved::Template(*resource, captures))
            })
            .ok_or_else(not_found)
    }

    /// Read a resource, producing the `{contents: [...]}` result object.
    pub async fn read(&self, uri: &str, backend: &BackendHandle) -> Result<Value, McpError> {
        let resolved = self.resolve(uri)?;
        let backend = backend.get()?;
        tracing::debug!(uri, resolved = ?resolved, "reading resource");

        let (mime_type, text) = match resolved {
            Resolved::Static(resource) => (JSON_MIME, self.read_static(resource, backend).await?),
            Resolved::Template(resource, captures) => (
                resource.mime_type(),
                read_template(resource, &captures, backend).await?,
            ),
        };

        Ok(json!({ "contents": [ContentItem::resource(uri, mime_type, text)] }))
    }

    async fn read_static(
        &self,
        resource: StaticResource,
        backend: &dyn Backend,
    ) -> Result<String, McpError> {
        let value = match resource {
            StaticResource::Collections => backend.list_collections().await?,
            StaticResource::TopItems => backend.list_top_items(self.top_items_limit).await?,
            StaticResource::RecentItems => {
                backend.list_recent_items(self.recent_items_limit).await?
            }
        };
        to_text(&value)
    }
}

async fn read_template(
    resource: TemplateResource,
    captures: &Captures,
    backend: &dyn Backend,
) -> Result<String, McpError> {
    let capture = |name: &str| {
        captures
            .get(name)
            .ok_or_else(|| McpError::InvalidArguments(format!("missing placeholder '{}'", name)))
    };

    match resource {
        TemplateResource::CollectionItems => {
            let value = backend
                .list_collection_items(capture("collection_key")?)
                .await?;
            to_text(&value)
        }
        TemplateResource::Item => {
            let value = backend.get_item(capture("item_key")?).await?;
            to_text(&value)
        }
        TemplateResource::ItemCitation => Ok(backend
            .get_citation(capture("item_key")?, capture("style")?)
            .await?),
    }
}
