//! Location retrievers
//!
//! Adapters and decorators for the [`ILocationRetriever`] port:
//!
//! - [`StaticRetriever`] - Fixed position, stamped with the current time
//! - [`ValidatingRetriever`] - Rejects fixes implying an implausible speed
//!
//! The gpsd adapter lives in [`crate::gpsd`].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};
use trackdav_core::{
    domain::{DomainError, Position},
    ports::ILocationRetriever,
};

// ============================================================================
// StaticRetriever
// ============================================================================

/// Always reports the same coordinates
#[derive(Debug, Clone, Copy)]
pub struct StaticRetriever {
    latitude: f64,
    longitude: f64,
}

impl StaticRetriever {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        // Validate once up front so fetch never fails
        Position::new(latitude, longitude, Utc::now())?;
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

#[async_trait]
impl ILocationRetriever for StaticRetriever {
    async fn fetch(&self) -> Option<Position> {
        Position::new(self.latitude, self.longitude, Utc::now()).ok()
    }
}

// ============================================================================
// ValidatingRetriever
// ============================================================================

/// Decorator that drops fixes implying a speed above the accepted maximum
///
/// The implied speed is the great-circle distance to the last accepted fix
/// divided by the elapsed capture time. The first fix is always accepted.
/// Rejected fixes do not move the baseline.
pub struct ValidatingRetriever {
    inner: Arc<dyn ILocationRetriever>,
    max_speed: f64,
    last_accepted: Mutex<Option<Position>>,
}

impl ValidatingRetriever {
    /// # Arguments
    /// * `inner` - The retriever to validate
    /// * `max_speed` - Highest accepted speed in m/s
    ///   (`walking_speed * max_speed_increase`)
    pub fn new(inner: Arc<dyn ILocationRetriever>, max_speed: f64) -> Self {
        Self {
            inner,
            max_speed,
            last_accepted: Mutex::new(None),
        }
    }

    /// Checks `fix` against the baseline and adopts it when plausible
    fn accept(&self, fix: Position) -> Option<Position> {
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(baseline) = last.as_ref() {
            let elapsed = baseline.seconds_until(&fix);
            if elapsed <= 0.0 {
                debug!(elapsed, "Rejecting fix not newer than the last accepted one");
                return None;
            }
            let speed = baseline.distance_to(&fix) / elapsed;
            if speed > self.max_speed {
                warn!(
                    speed_mps = speed,
                    max_mps = self.max_speed,
                    "Rejecting fix with implausible speed"
                );
                return None;
            }
        }

        *last = Some(fix);
        Some(fix)
    }
}

#[async_trait]
impl ILocationRetriever for ValidatingRetriever {
    async fn fetch(&self) -> Option<Position> {
        let fix = self.inner.fetch().await?;
        self.accept(fix)
    }
}
