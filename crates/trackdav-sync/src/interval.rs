//! Next sampling interval
//!
//! A pure function over the latest cycle outcome. The calculator is a
//! three-state machine re-evaluated every cycle from the latest signal only:
//!
//! ```text
//!   upload failed            ──► ErrorBackoff  (retry_on_error_time)
//!   moved < threshold        ──► IdleGrowth    (current + increment, capped)
//!   moved >= threshold       ──► ActiveReset   (min_track_interval)
//! ```

use std::fmt;

use trackdav_core::domain::{Position, TrackingPolicy};

/// Which rule produced the interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalState {
    ErrorBackoff,
    IdleGrowth,
    ActiveReset,
}

impl fmt::Display for IntervalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ErrorBackoff => "error_backoff",
            Self::IdleGrowth => "idle_growth",
            Self::ActiveReset => "active_reset",
        };
        f.write_str(s)
    }
}

/// Classifies a cycle outcome
///
/// `distance_m` is `None` when there is no previous position to compare
/// against, which counts as movement.
pub fn classify(success: bool, distance_m: Option<f64>, policy: &TrackingPolicy) -> IntervalState {
    if !success {
        return IntervalState::ErrorBackoff;
    }
    match distance_m {
        Some(d) if d < policy.location_update_threshold => IntervalState::IdleGrowth,
        _ => IntervalState::ActiveReset,
    }
}

/// Computes the delay in seconds before the next sampling cycle
///
/// # Arguments
/// * `prev` - Position of the previous cycle, if any
/// * `curr` - Position of this cycle
/// * `success` - Whether this cycle's upload succeeded
/// * `current_interval` - The delay returned by the previous cycle
/// * `policy` - Tracking tunables
pub fn next_interval(
    prev: Option<&Position>,
    curr: &Position,
    success: bool,
    current_interval: u64,
    policy: &TrackingPolicy,
) -> (IntervalState, u64) {
    let distance = prev.map(|p| p.distance_to(curr));
    let state = classify(success, distance, policy);
    (state, interval_for(state, current_interval, policy))
}

/// Maps a state to its delay
pub fn interval_for(state: IntervalState, current_interval: u64, policy: &TrackingPolicy) -> u64 {
    match state {
        IntervalState::ErrorBackoff => policy.retry_on_error_time,
        IntervalState::IdleGrowth => current_interval
            .saturating_add(policy.interval_increment_on_idle)
            .min(policy.max_track_interval),
        IntervalState::ActiveReset => policy.min_track_interval,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn policy() -> TrackingPolicy {
        TrackingPolicy {
            min_track_interval: 180,
            max_track_interval: 900,
            interval_increment_on_idle: 120,
            retry_on_error_time: 60,
            location_update_threshold: 10.0,
            ..TrackingPolicy::default()
        }
    }

    fn at(lat: f64, lon: f64, secs: i64) -> Position {
        let t0 = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        Position::new(lat, lon, t0 + Duration::seconds(secs)).unwrap()
    }

    // ~1 m of latitude
    const DEG_PER_M: f64 = 1.0 / 111_195.0;

    #[test]
    fn test_idle_growth_adds_increment() {
        let p = policy();
        let a = at(45.0, 7.0, 0);
        let b = at(45.0 + 3.0 * DEG_PER_M, 7.0, 180);

        let (state, next) = next_interval(Some(&a), &b, true, 180, &p);
        assert_eq!(state, IntervalState::IdleGrowth);
        assert_eq!(next, 300);
    }

    #[test]
    fn test_idle_growth_is_capped() {
        let p = policy();
        let a = at(45.0, 7.0, 0);
        let b = at(45.0 + 3.0 * DEG_PER_M, 7.0, 840);

        let (_, next) = next_interval(Some(&a), &b, true, 840, &p);
        assert_eq!(next, 900);
        let (_, next) = next_interval(Some(&a), &b, true, 900, &p);
        assert_eq!(next, 900);
    }

    #[test]
    fn test_repeated_idle_cycles_grow_monotonically() {
        let p = policy();
        let a = at(45.0, 7.0, 0);
        let mut interval = p.min_track_interval;
        let mut seen = vec![interval];
        for _ in 0..8 {
            interval = next_interval(Some(&a), &a, true, interval, &p).1;
            seen.push(interval);
        }
        assert_eq!(seen, vec![180, 300, 420, 540, 660, 780, 900, 900, 900]);
    }

    #[test]
    fn test_movement_resets_to_min() {
        let p = policy();
        let a = at(45.0, 7.0, 0);
        let b = at(45.0 + 50.0 * DEG_PER_M, 7.0, 600);

        let (state, next) = next_interval(Some(&a), &b, true, 660, &p);
        assert_eq!(state, IntervalState::ActiveReset);
        assert_eq!(next, 180);
    }

    #[test]
    fn test_failure_backs_off_regardless_of_distance() {
        let p = policy();
        let a = at(45.0, 7.0, 0);
        let near = at(45.0, 7.0, 60);
        let far = at(46.0, 7.0, 60);

        assert_eq!(
            next_interval(Some(&a), &near, false, 420, &p),
            (IntervalState::ErrorBackoff, 60)
        );
        assert_eq!(
            next_interval(Some(&a), &far, false, 420, &p),
            (IntervalState::ErrorBackoff, 60)
        );
    }

    #[test]
    fn test_no_previous_position_counts_as_movement() {
        let p = policy();
        let (state, next) = next_interval(None, &at(45.0, 7.0, 0), true, 500, &p);
        assert_eq!(state, IntervalState::ActiveReset);
        assert_eq!(next, 180);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let p = policy();
        assert_eq!(classify(true, Some(9.99), &p), IntervalState::IdleGrowth);
        assert_eq!(classify(true, Some(10.0), &p), IntervalState::ActiveReset);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(IntervalState::IdleGrowth.to_string(), "idle_growth");
    }
}
