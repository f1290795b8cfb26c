//! Domain entities and business logic
//!
//! This module contains the core domain types for trackdav:
//! - Position fixes and great-circle distance
//! - Remote folder listings
//! - Server connection settings (all-or-nothing)
//! - Tracking policy tunables
//! - Domain-specific error types

pub mod errors;
pub mod policy;
pub mod position;
pub mod remote;
pub mod server;

// Re-export commonly used types
pub use errors::DomainError;
pub use policy::TrackingPolicy;
pub use position::Position;
pub use remote::{normalize_folder_path, RemoteElement, RemoteFolder};
pub use server::ServerConfig;
