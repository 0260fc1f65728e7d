//! Formatted citation and bibliography endpoints.
//!
//! Zotero renders these server-side with CSL; `style` is any CSL style id
//! (`apa`, `modern-language-association`, `chicago-note-bibliography`, ...).

use crate::client::ZoteroClient;
use crate::error::{Result, ZoteroError};

impl ZoteroClient {
    /// In-text citation for one item, rendered in `style`.
    pub async fn get_citation(&self, item_key: &str, style: &str) -> Result<String> {
        let url = self.library_endpoint(&["items", item_key])?;
        let params = [("format", "json"), ("include", "citation"), ("style", style)];
        let parsed = self.get_json(url, &params).await?;
        parse_citation(&parsed, item_key)
    }

    /// Bibliography for several items, rendered in `style`.
    pub async fn get_bibliography(&self, item_keys: &[&str], style: &str) -> Result<String> {
        let keys = item_keys.join(",");
        let params = [("itemKey", keys.as_str()), ("format", "bib"), ("style", style)];
        self.get(self.library_endpoint(&["items"])?, &params).await
    }
}

fn parse_citation(item: &serde_json::Value, item_key: &str) -> Result<String> {
    item["citation"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| ZoteroError::Parse(format!("No citation returned for {}", item_key)))
}
