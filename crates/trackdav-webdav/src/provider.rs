//! WebDavRemoteStore - IRemoteStore implementation over [`WebDavClient`]
//!
//! ## Design Notes
//!
//! - The port reports outcomes, not errors: uploads and removals return
//!   `false` on any failure and listings fall back to an empty folder.
//!   Every failure is logged here with the underlying [`WebDavError`].
//! - Retry policy belongs to the caller (the upload controller).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use trackdav_core::domain::{RemoteFolder, ServerConfig};
use trackdav_core::ports::IRemoteStore;

use crate::client::WebDavClient;

/// Remote store backed by a WebDAV server
pub struct WebDavRemoteStore {
    client: WebDavClient,
}

impl WebDavRemoteStore {
    /// Wraps an existing client
    pub fn new(client: WebDavClient) -> Self {
        Self { client }
    }

    /// Builds a store for `server` with a per-request deadline
    pub fn connect(server: &ServerConfig, timeout: Duration) -> Result<Self> {
        let client = WebDavClient::with_timeout(server, timeout)
            .with_context(|| format!("Failed to create WebDAV client for {}", server.server_uri()))?;
        Ok(Self::new(client))
    }

    /// Returns the underlying client
    pub fn client(&self) -> &WebDavClient {
        &self.client
    }
}

#[async_trait]
impl IRemoteStore for WebDavRemoteStore {
    async fn upload(&self, path: &str, content: &[u8]) -> bool {
        match self.client.put(path, content.to_vec()).await {
            Ok(()) => {
                debug!(path, bytes = content.len(), "Uploaded");
                true
            }
            Err(e) => {
                warn!(path, error = %e, "Upload failed");
                false
            }
        }
    }

    async fn delete(&self, path: &str) -> bool {
        match self.client.delete(path).await {
            Ok(()) => {
                debug!(path, "Deleted");
                true
            }
            Err(e) => {
                warn!(path, error = %e, "Delete failed");
                false
            }
        }
    }

    async fn load_folder(&self, path: &str) -> RemoteFolder {
        match self.client.list_folder(path).await {
            Ok(folder) => {
                debug!(path, entries = folder.len(), "Listed folder");
                folder
            }
            Err(e) => {
                warn!(path, error = %e, "Folder listing failed, treating as empty");
                RemoteFolder::empty()
            }
        }
    }
}
