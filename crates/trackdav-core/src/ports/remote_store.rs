//! Remote store port (driven/secondary port)
//!
//! This module defines the interface the upload controller uses to talk to
//! the remote file store. The reference implementation targets WebDAV.
//!
//! ## Design Notes
//!
//! - Operations report success as a plain `bool`. Transport and status
//!   failures are logged by the adapter and never propagated; the caller
//!   decides the retry policy.
//! - `load_folder` substitutes [`RemoteFolder::empty`] for any failure, so
//!   an empty result may mean either "nothing there" or "unreachable".
//! - Callers must confine each instance to a single owner; the trait does
//!   not promise anything about concurrent requests against the same path.

use crate::domain::remote::RemoteFolder;

/// Port trait for remote file store operations
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Writes or replaces the file at `path` (relative to the store base)
    ///
    /// # Returns
    /// `true` iff the server acknowledged the write with a 2xx status
    async fn upload(&self, path: &str, content: &[u8]) -> bool;

    /// Removes the resource at `path`
    ///
    /// # Returns
    /// `true` iff the server acknowledged the removal with a 2xx status
    async fn delete(&self, path: &str) -> bool;

    /// Lists the direct children of the folder at `path`
    async fn load_folder(&self, path: &str) -> RemoteFolder;
}
