//! Tracking loop
//!
//! The [`TrackingLoop`] repeatedly runs a [`LocationProcessor`] cycle and
//! sleeps for the delay the upload controller returns.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐ run_cycle ┌───────────────────┐ submit ┌──────────────────┐
//! │ TrackingLoop │ ────────► │ LocationProcessor │ ─────► │ UploadController │
//! └──────────────┘           └───────────────────┘        └──────────────────┘
//!        ▲                                                        │
//!        └────────────── sleep(next delay) ◄──────────────────────┘
//! ```
//!
//! Cancellation abandons a pending cycle immediately rather than waiting for
//! the controller's reply.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{processor::LocationProcessor, SyncError};

/// Runs sampling cycles until cancelled
pub struct TrackingLoop {
    processor: LocationProcessor,
    cancel: CancellationToken,
    reset_stats_on_start: bool,
}

impl TrackingLoop {
    pub fn new(processor: LocationProcessor, cancel: CancellationToken) -> Self {
        Self {
            processor,
            cancel,
            reset_stats_on_start: false,
        }
    }

    /// Resets the controller's session counters when the loop starts
    pub fn reset_stats_on_start(mut self, reset: bool) -> Self {
        self.reset_stats_on_start = reset;
        self
    }

    /// Runs until the token is cancelled
    ///
    /// # Returns
    /// The number of completed cycles, or an error if the controller stopped
    pub async fn run(self) -> Result<u64, SyncError> {
        info!("Tracking loop starting");

        if self.reset_stats_on_start {
            self.processor.controller().reset_stats().await?;
            debug!("Session stats reset");
        }

        let mut cycles = 0u64;
        loop {
            let delay = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.processor.run_cycle() => match result {
                    Ok(delay) => delay,
                    Err(e) => {
                        error!(error = %e, cycles, "Tracking cycle failed, stopping");
                        return Err(e);
                    }
                },
            };
            cycles += 1;
            debug!(cycles, delay, "Cycle complete, sleeping");

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
            }
        }

        info!(cycles, "Tracking loop stopped");
        Ok(cycles)
    }
}
