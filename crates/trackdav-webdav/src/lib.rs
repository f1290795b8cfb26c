//! trackdav WebDAV - Remote store protocol client
//!
//! Provides an async client for:
//! - Idempotent uploads (`PUT`) and removals (`DELETE`)
//! - Depth-1 folder listings (`PROPFIND`) with multistatus parsing
//! - Basic authentication and per-request deadlines
//!
//! ## Modules
//!
//! - [`client`] - WebDAV HTTP client and path resolution
//! - [`multistatus`] - Two-pass parser for `207 Multi-Status` bodies
//! - [`provider`] - [`IRemoteStore`](trackdav_core::ports::IRemoteStore) adapter

pub mod client;
pub mod multistatus;
pub mod provider;

use thiserror::Error;

/// Errors that can occur when communicating with a WebDAV server
#[derive(Debug, Error)]
pub enum WebDavError {
    /// Credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The parent collection of the target does not exist
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Any other non-success status
    #[error("Unexpected status {status} for {url}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Target URL
        url: String,
    },

    /// A network-level error occurred, including request timeouts
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The server URI or a relative path could not be turned into a URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The response body could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
