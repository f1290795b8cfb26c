//! WebDAV HTTP client
//!
//! Provides a thin typed client over `reqwest` for the three verbs the
//! remote store needs: `PUT`, `DELETE` and depth-1 `PROPFIND`.
//!
//! ## Path resolution
//!
//! Every relative path is resolved against `server_uri + base_path` with
//! exactly one `/` between components. Folder paths always end in `/`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trackdav_core::domain::ServerConfig;
//! use trackdav_webdav::client::WebDavClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let server = ServerConfig::new("https://dav.example.com", "/tracks", "alice", "secret")?;
//! let client = WebDavClient::new(&server)?;
//! client.put("2026-01-01T00-00-00.000Z.json", b"{}".to_vec()).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, RequestBuilder, Response, StatusCode,
};
use tracing::debug;
use trackdav_core::domain::{RemoteFolder, ServerConfig};
use url::Url;

use crate::{multistatus, WebDavError};

/// Default per-request deadline
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Body sent with every listing request
const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:"><d:allprop/></d:propfind>"#;

// ============================================================================
// WebDavClient
// ============================================================================

/// HTTP client for a single WebDAV store
///
/// Holds the base URL and a precomputed `Authorization: Basic` header that is
/// attached to every request.
pub struct WebDavClient {
    /// The underlying HTTP client, built with the request deadline
    client: Client,
    /// `server_uri + base_path`, always ending in `/`
    base_url: Url,
    /// Precomputed `Basic base64(user:password)` header value
    auth_header: String,
}

impl WebDavClient {
    /// Creates a client with the default request deadline
    ///
    /// # Arguments
    /// * `server` - A fully defined server configuration
    pub fn new(server: &ServerConfig) -> Result<Self, WebDavError> {
        Self::with_timeout(server, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client whose requests fail after `timeout`
    ///
    /// # Arguments
    /// * `server` - A fully defined server configuration
    /// * `timeout` - Deadline applied to each request, connect through body
    pub fn with_timeout(server: &ServerConfig, timeout: Duration) -> Result<Self, WebDavError> {
        let base_url = build_base_url(server.server_uri(), server.base_path())?;
        let credentials = format!("{}:{}", server.user(), server.password());
        let auth_header = format!("Basic {}", STANDARD.encode(credentials));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(WebDavError::NetworkError)?;

        debug!(base_url = %base_url, timeout_secs = timeout.as_secs(), "Created WebDAV client");

        Ok(Self {
            client,
            base_url,
            auth_header,
        })
    }

    /// Returns the resolved base URL (always ends in `/`)
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a relative file path against the base URL
    ///
    /// Leading, trailing and repeated separators in `path` are collapsed.
    pub fn resolve(&self, path: &str) -> Result<Url, WebDavError> {
        self.join_segments(path, false)
    }

    /// Resolves a relative folder path; the result always ends in `/`
    pub fn resolve_folder(&self, path: &str) -> Result<Url, WebDavError> {
        self.join_segments(path, true)
    }

    fn join_segments(&self, path: &str, folder: bool) -> Result<Url, WebDavError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| WebDavError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if folder {
                segments.push("");
            }
        }
        Ok(url)
    }

    /// Creates an authenticated request builder for the given method and URL
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, &self.auth_header)
    }

    /// Writes or replaces the resource at `path`
    pub async fn put(&self, path: &str, content: Vec<u8>) -> Result<(), WebDavError> {
        let url = self.resolve(path)?;
        debug!(url = %url, bytes = content.len(), "PUT");

        let response = self
            .request(Method::PUT, url)
            .header(CONTENT_TYPE, "application/json")
            .body(content)
            .send()
            .await?;

        map_status(response).map(|_| ())
    }

    /// Removes the resource at `path`
    pub async fn delete(&self, path: &str) -> Result<(), WebDavError> {
        let url = self.resolve(path)?;
        debug!(url = %url, "DELETE");

        let response = self.request(Method::DELETE, url).send().await?;

        map_status(response).map(|_| ())
    }

    /// Issues a depth-1 `PROPFIND` on the folder `path` and returns the raw body
    pub async fn propfind(&self, path: &str) -> Result<String, WebDavError> {
        let url = self.resolve_folder(path)?;
        let method = Method::from_bytes(b"PROPFIND")
            .map_err(|e| WebDavError::InvalidUrl(e.to_string()))?;
        debug!(url = %url, "PROPFIND");

        let response = self
            .request(method, url)
            .header(ACCEPT, "text/xml")
            .header("Depth", "1")
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(PROPFIND_BODY)
            .send()
            .await?;

        let response = map_status(response)?;
        Ok(response.text().await?)
    }

    /// Lists the direct children of the folder `path`
    ///
    /// The returned folder is keyed to `path` with a trailing `/`.
    pub async fn list_folder(&self, path: &str) -> Result<RemoteFolder, WebDavError> {
        let folder_url = self.resolve_folder(path)?;
        let body = self.propfind(path).await?;
        let folder_path = trackdav_core::domain::normalize_folder_path(path);
        multistatus::parse_folder(&folder_path, folder_url.path(), &body)
    }
}

/// Builds `server_uri + base_path` with exactly one `/` between them and a trailing `/`
fn build_base_url(server_uri: &str, base_path: &str) -> Result<Url, WebDavError> {
    let trimmed = server_uri.trim().trim_end_matches('/');
    let mut url =
        Url::parse(trimmed).map_err(|e| WebDavError::InvalidUrl(format!("{server_uri}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(WebDavError::InvalidUrl(server_uri.to_string()));
    }
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| WebDavError::InvalidUrl(server_uri.to_string()))?;
        segments.pop_if_empty();
        segments.extend(base_path.split('/').filter(|s| !s.is_empty()));
        segments.push("");
    }
    Ok(url)
}

/// Maps a response to `Ok` for 2xx statuses and to a typed error otherwise
pub fn map_status(response: Response) -> Result<Response, WebDavError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    Err(match status {
        StatusCode::UNAUTHORIZED => WebDavError::Unauthorized(url),
        StatusCode::FORBIDDEN => WebDavError::Forbidden(url),
        StatusCode::NOT_FOUND => WebDavError::NotFound(url),
        StatusCode::CONFLICT => WebDavError::Conflict(url),
        s if s.is_server_error() => WebDavError::ServerError(format!("{s} for {url}")),
        s => WebDavError::UnexpectedStatus {
            status: s.as_u16(),
            url,
        },
    })
}
