//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the tracking engine
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Remote file store operations (WebDAV)
//! - [`ILocationRetriever`] - Position fix sources (gpsd, static, decorators)
//! - [`ISettingsStore`] - Typed key-value settings with change notification

pub mod location;
pub mod remote_store;
pub mod settings_store;

pub use location::ILocationRetriever;
pub use remote_store::IRemoteStore;
pub use settings_store::{ISettingsStore, ListenerId, SettingsListener, MIN_DATE_MILLIS};
