//! Per-cycle tracking tunables

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Tunables consulted by the interval calculator, the validating
/// retriever and the upload controller on every cycle
///
/// Intervals and timeouts are in seconds, distances in meters and
/// speeds in meters per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingPolicy {
    /// Fast-poll baseline used after meaningful movement
    pub min_track_interval: u64,
    /// Upper bound for idle growth
    pub max_track_interval: u64,
    /// Added to the current interval when no movement is detected
    pub interval_increment_on_idle: u64,
    /// Interval used after a failed upload
    pub retry_on_error_time: u64,
    /// Upper bound for a single position fetch
    pub gps_timeout: u64,
    /// Minimum distance counted as movement
    pub location_update_threshold: f64,
    /// Factor over `walking_speed` above which a fix is rejected
    pub max_speed_increase: f64,
    /// Baseline speed for fix validation
    pub walking_speed: f64,
    /// Maximum number of pending uploads kept offline
    pub offline_queue_capacity: usize,
    /// Time budget for draining the offline queue in one cycle
    pub max_offline_sync_time: u64,
    /// Maximum number of queued entries drained in one cycle
    pub multi_upload_chunk_size: usize,
    /// Reset running statistics whenever a tracking session starts
    pub reset_stats_on_start: bool,
}

impl Default for TrackingPolicy {
    fn default() -> Self {
        Self {
            min_track_interval: 180,
            max_track_interval: 900,
            interval_increment_on_idle: 120,
            retry_on_error_time: 60,
            gps_timeout: 30,
            location_update_threshold: 10.0,
            max_speed_increase: 30.0,
            walking_speed: 1.11,
            offline_queue_capacity: 500,
            max_offline_sync_time: 60,
            multi_upload_chunk_size: 10,
            reset_stats_on_start: true,
        }
    }
}

impl TrackingPolicy {
    pub fn gps_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.gps_timeout)
    }

    pub fn max_offline_sync_duration(&self) -> Duration {
        Duration::from_secs(self.max_offline_sync_time)
    }

    /// Fastest implied speed a validated fix may have
    pub fn max_accepted_speed(&self) -> f64 {
        self.walking_speed * self.max_speed_increase
    }

    /// Checks the cross-field constraints
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.min_track_interval == 0 {
            return Err(DomainError::ValidationFailed(
                "min_track_interval must be greater than 0".into(),
            ));
        }
        if self.min_track_interval > self.max_track_interval {
            return Err(DomainError::ValidationFailed(format!(
                "min_track_interval ({}) must not exceed max_track_interval ({})",
                self.min_track_interval, self.max_track_interval
            )));
        }
        if self.offline_queue_capacity == 0 {
            return Err(DomainError::ValidationFailed(
                "offline_queue_capacity must be greater than 0".into(),
            ));
        }
        if self.multi_upload_chunk_size == 0 {
            return Err(DomainError::ValidationFailed(
                "multi_upload_chunk_size must be greater than 0".into(),
            ));
        }
        if self.walking_speed <= 0.0 || self.max_speed_increase <= 0.0 {
            return Err(DomainError::ValidationFailed(
                "walking_speed and max_speed_increase must be positive".into(),
            ));
        }
        if self.location_update_threshold < 0.0 {
            return Err(DomainError::ValidationFailed(
                "location_update_threshold must not be negative".into(),
            ));
        }
        Ok(())
    }
}
