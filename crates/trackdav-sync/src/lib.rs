//! trackdav Sync - Tracking and upload engine
//!
//! Provides:
//! - Adaptive sampling interval control
//! - A single-writer upload pipeline serialized through an actor
//! - A bounded offline queue for failed uploads
//! - Location retrievers (gpsd, static, speed-validating decorator)
//!
//! ## Modules
//!
//! - [`interval`] - Pure next-interval calculation
//! - [`offline_queue`] - Bounded FIFO of undelivered location records
//! - [`retriever`] - Location retriever adapters and decorators
//! - [`gpsd`] - gpsd JSON protocol retriever
//! - [`controller`] - Upload controller actor and its handle
//! - [`processor`] - One sampling cycle: fetch, submit, await delay
//! - [`scheduler`] - Tracking loop under a cancellation token

pub mod controller;
pub mod gpsd;
pub mod interval;
pub mod offline_queue;
pub mod processor;
pub mod retriever;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

/// Errors that can occur in the tracking engine
#[derive(Debug, Error)]
pub enum SyncError {
    /// The upload controller task has exited and no longer accepts messages
    #[error("Upload controller has stopped")]
    ControllerStopped,

    /// The upload controller dropped a message without replying
    #[error("Upload controller response lost")]
    ControllerResponseLost,

    /// An I/O error occurred while persisting the offline queue
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The offline queue file could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
