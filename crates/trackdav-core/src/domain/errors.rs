//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! such as coordinate validation and remote path checks.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Latitude outside of [-90, 90] or not finite
    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside of [-180, 180] or not finite
    #[error("Invalid longitude: {0}")]
    InvalidLongitude(f64),

    /// Invalid remote path format
    #[error("Invalid remote path: {0}")]
    InvalidRemotePath(String),

    /// A required server setting is missing or empty
    #[error("Missing server setting: {0}")]
    MissingServerSetting(&'static str),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
