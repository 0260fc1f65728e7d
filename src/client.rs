//! The Zotero Web API client.

use crate::config::{Library, ZoteroConfig};
use crate::error::{Result, ZoteroError};
use crate::rate_limit::{header_seconds, RateLimiter};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use url::Url;

const API_VERSION: &str = "3";
const USER_AGENT: &str = concat!("zotero-mcp/", env!("CARGO_PKG_VERSION"));

/// Async client for one Zotero library (user or group).
///
/// # Example
///
/// ```no_run
/// # async fn example() -> zotero_mcp::error::Result<()> {
/// let client = zotero_mcp::ZoteroClient::from_env()?;
/// let items = client.search_items("photosynthesis", None, 10).await?;
/// println!("{}", serde_json::to_string_pretty(&items)?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ZoteroClient {
    pub(crate) http: Client,
    pub(crate) api_key: String,
    pub(crate) library: Library,
    pub(crate) base_url: String,
    pub(crate) rate_limiter: RateLimiter,
}

impl ZoteroClient {
    /// Create a client for the configured library.
    pub fn new(config: ZoteroConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key,
            library: config.library,
            base_url: config.base_url,
            rate_limiter: RateLimiter::new(5.0),
        })
    }

    /// Create a client from `ZOTERO_API_KEY` and `ZOTERO_USER_ID` (or `ZOTERO_GROUP_ID`).
    pub fn from_env() -> Result<Self> {
        Self::new(ZoteroConfig::from_env()?)
    }

    /// Override the rate limit (requests per second; zero or less disables pacing).
    pub fn with_rate_limit(mut self, per_second: f64) -> Self {
        self.rate_limiter = RateLimiter::new(per_second);
        self
    }

    /// The library this client addresses.
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// URL of an endpoint outside any library, e.g. `/itemTypes`.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let invalid = |reason: String| {
            ZoteroError::Config(format!("invalid API URL '{}': {}", self.base_url, reason))
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("not a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of a library-scoped endpoint, e.g. `/users/1/items/ABCD2345`.
    ///
    /// Every segment is percent-encoded on its own, so a `/`, `?` or `#`
    /// inside a key stays part of that segment.
    pub(crate) fn library_endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut full = self.library.segments().to_vec();
        full.extend_from_slice(segments);
        self.endpoint(&full)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Zotero-API-Key", &self.api_key)
            .header("Zotero-API-Version", API_VERSION)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<String> {
        self.rate_limiter.acquire().await;
        let response = self.authed(builder).send().await?;
        self.rate_limiter
            .update_from_headers(response.headers())
            .await;
        handle_response(response).await
    }

    /// Make an authenticated GET request.
    pub(crate) async fn get(&self, url: Url, params: &[(&str, &str)]) -> Result<String> {
        tracing::debug!(%url, "GET");
        self.send(self.http.get(url).query(params)).await
    }

    /// GET and parse the body as JSON.
    pub(crate) async fn get_json(
        &self,
        url: Url,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value> {
        let path = url.path().to_string();
        let body = self.get(url, params).await?;
        serde_json::from_str(&body)
            .map_err(|e| ZoteroError::Parse(format!("Invalid JSON from {}: {}", path, e)))
    }

    /// Make an authenticated POST request with a JSON body.
    pub(crate) async fn post_json(&self, url: Url, body: &serde_json::Value) -> Result<String> {
        tracing::debug!(%url, "POST");
        self.send(self.http.post(url).json(body)).await
    }

    /// Make an authenticated PATCH request guarded by the object version.
    pub(crate) async fn patch_json(
        &self,
        url: Url,
        body: &serde_json::Value,
        version: u64,
    ) -> Result<String> {
        tracing::debug!(%url, version, "PATCH");
        let builder = self
            .http
            .patch(url)
            .header("If-Unmodified-Since-Version", version.to_string())
            .json(body);
        self.send(builder).await
    }

    /// Make an authenticated DELETE request guarded by the object version.
    pub(crate) async fn delete(&self, url: Url, version: u64) -> Result<String> {
        tracing::debug!(%url, version, "DELETE");
        let builder = self
            .http
            .delete(url)
            .header("If-Unmodified-Since-Version", version.to_string());
        self.send(builder).await
    }
}

/// Handle the HTTP response, mapping status codes to errors.
async fn handle_response(response: reqwest::Response) -> Result<String> {
    let status = response.status().as_u16();

    match status {
        200..=299 => Ok(response.text().await?),
        401 => Err(ZoteroError::AuthRequired),
        403 => {
            let body = response.text().await.unwrap_or_default();
            Err(ZoteroError::Forbidden(body))
        }
        404 => Err(ZoteroError::NotFound(response.url().path().to_string())),
        412 => {
            let body = response.text().await.unwrap_or_default();
            Err(ZoteroError::VersionConflict(body))
        }
        429 => {
            let retry_after = header_seconds(response.headers(), "retry-after");
            Err(ZoteroError::RateLimited { retry_after })
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(ZoteroError::Api {
                status,
                message: body,
            })
        }
    }
}
