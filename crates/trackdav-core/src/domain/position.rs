//! Position fixes and great-circle distance
//!
//! A [`Position`] is an immutable fix captured at a point in time. The
//! "unknown" position carries zero coordinates; callers must rely on the
//! accompanying raw-fix flag, never on the coordinates, to detect it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Mean Earth radius in meters (IUGG)
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A geographic position captured at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    latitude: f64,
    longitude: f64,
    captured_at: DateTime<Utc>,
}

impl Position {
    /// Creates a validated position
    ///
    /// Latitude must be within [-90, 90] and longitude within [-180, 180].
    pub fn new(
        latitude: f64,
        longitude: f64,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
            captured_at,
        })
    }

    /// Placeholder used when no fix could be obtained
    #[must_use]
    pub fn unknown(captured_at: DateTime<Utc>) -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            captured_at,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Great-circle distance to `other` in meters (haversine formula)
    pub fn distance_to(&self, other: &Position) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let d_phi = (other.latitude - self.latitude).to_radians();
        let d_lambda = (other.longitude - self.longitude).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Seconds elapsed between this fix and a later one (negative if `later` is older)
    pub fn seconds_until(&self, later: &Position) -> f64 {
        (later.captured_at - self.captured_at).num_milliseconds() as f64 / 1000.0
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.6}, {:.6}) @ {}",
            self.latitude,
            self.longitude,
            self.captured_at.to_rfc3339()
        )
    }
}
