//! Settings store port
//!
//! A named, typed key-value store with change notification. Every value is
//! stored as a string; the provided methods parse it into the requested type.
//!
//! ## Design Notes
//!
//! - Each value kind has exactly one getter and it returns `Option`. A value
//!   that is missing, empty or unparseable is `None`; callers apply their own
//!   default with `unwrap_or`. There are no sentinel numbers.
//! - Dates are stored as epoch milliseconds. Anything below
//!   [`MIN_DATE_MILLIS`] reads back as `None`.
//! - Listeners receive the key that changed. They run synchronously on the
//!   thread performing the write and must not block.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

/// Smallest epoch-millis value accepted as a real date
pub const MIN_DATE_MILLIS: i64 = 1;

/// Handle returned by [`ISettingsStore::add_listener`]
pub type ListenerId = u64;

/// Callback invoked with the key of each changed setting
pub type SettingsListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Port trait for the typed settings store
pub trait ISettingsStore: Send + Sync {
    /// Returns the raw stored string for `key`
    fn get_raw(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, or removes the key when `value` is `None`
    ///
    /// Listeners are notified only when the stored value actually changes.
    fn set_raw(&self, key: &str, value: Option<String>);

    /// Registers a change listener
    fn add_listener(&self, listener: SettingsListener) -> ListenerId;

    /// Deregisters a change listener; returns `false` if `id` was unknown
    fn remove_listener(&self, id: ListenerId) -> bool;

    fn get_string(&self, key: &str) -> Option<String> {
        self.get_raw(key).filter(|v| !v.trim().is_empty())
    }

    fn set_string(&self, key: &str, value: &str) {
        self.set_raw(key, Some(value.to_string()));
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.get_raw(key)?.trim().parse().ok()
    }

    /// Reads an integer and multiplies it by `factor` (e.g. minutes to seconds)
    ///
    /// Overflow reads as `None`.
    fn get_int_scaled(&self, key: &str, factor: i64) -> Option<i64> {
        self.get_int(key)?.checked_mul(factor)
    }

    fn set_int(&self, key: &str, value: i64) {
        self.set_raw(key, Some(value.to_string()));
    }

    fn get_double(&self, key: &str) -> Option<f64> {
        self.get_raw(key)?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    fn set_double(&self, key: &str, value: f64) {
        self.set_raw(key, Some(value.to_string()));
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get_raw(key)?.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        }
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.set_raw(key, Some(value.to_string()));
    }

    fn get_date(&self, key: &str) -> Option<DateTime<Utc>> {
        let millis = self.get_int(key)?;
        if millis < MIN_DATE_MILLIS {
            return None;
        }
        Utc.timestamp_millis_opt(millis).single()
    }

    fn set_date(&self, key: &str, value: Option<DateTime<Utc>>) {
        self.set_raw(key, value.map(|d| d.timestamp_millis().to_string()));
    }

    fn remove(&self, key: &str) {
        self.set_raw(key, None);
    }
}
