//! trackdav Core - Domain types, ports and configuration
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Position`, `RemoteFolder`, `ServerConfig`, `TrackingPolicy`
//! - **Port definitions** - Traits for adapters: `IRemoteStore`, `ILocationRetriever`, `ISettingsStore`
//! - **Configuration** - YAML config file and the in-memory settings store
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! The tracking engine in `trackdav-sync` depends only on these ports.

pub mod config;
pub mod domain;
pub mod ports;
pub mod settings;
