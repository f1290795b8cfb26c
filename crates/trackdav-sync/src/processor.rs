//! Location processor
//!
//! Drives one sampling cycle: fetch a fix (bounded by `gps_timeout`), hand
//! it to the upload controller and wait for the next sampling delay. No
//! retries happen at this layer.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::sync::watch;
use tracing::debug;
use trackdav_core::{
    domain::{Position, TrackingPolicy},
    ports::ILocationRetriever,
};

use crate::{controller::ControllerHandle, SyncError};

/// Runs sampling cycles against an upload controller
pub struct LocationProcessor {
    retriever: Arc<dyn ILocationRetriever>,
    controller: ControllerHandle,
    gps_timeout: Duration,
    policy_updates: Option<watch::Receiver<TrackingPolicy>>,
}

impl LocationProcessor {
    pub fn new(
        retriever: Arc<dyn ILocationRetriever>,
        controller: ControllerHandle,
        gps_timeout: Duration,
    ) -> Self {
        Self {
            retriever,
            controller,
            gps_timeout,
            policy_updates: None,
        }
    }

    /// Follows `gps_timeout` from a policy channel instead of the fixed value
    pub fn with_policy_updates(mut self, rx: watch::Receiver<TrackingPolicy>) -> Self {
        self.policy_updates = Some(rx);
        self
    }

    fn current_gps_timeout(&self) -> Duration {
        self.policy_updates
            .as_ref()
            .map(|rx| rx.borrow().gps_timeout_duration())
            .unwrap_or(self.gps_timeout)
    }

    /// Returns the controller handle this processor submits to
    pub fn controller(&self) -> &ControllerHandle {
        &self.controller
    }

    /// Runs one cycle and returns the delay in seconds before the next one
    ///
    /// A missing fix or a GPS timeout still produces a message, so interval
    /// scheduling continues.
    pub async fn run_cycle(&self) -> Result<u64, SyncError> {
        let timeout = self.current_gps_timeout();
        let fix = match tokio::time::timeout(timeout, self.retriever.fetch()).await {
            Ok(fix) => fix,
            Err(_) => {
                debug!(timeout_secs = timeout.as_secs(), "GPS fetch timed out");
                None
            }
        };

        let raw_fix_present = fix.is_some();
        let position = fix.unwrap_or_else(|| Position::unknown(Utc::now()));
        self.controller.submit(position, raw_fix_present).await
    }
}
