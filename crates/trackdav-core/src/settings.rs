//! In-memory settings store and typed readers
//!
//! [`MemorySettingsStore`] is the reference [`ISettingsStore`] adapter. The
//! daemon seeds it from the YAML configuration and hands it to the parts of
//! the system that need settings; nothing reads a process-wide singleton.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use tracing::{debug, warn};

use crate::domain::{ServerConfig, TrackingPolicy};
use crate::ports::settings_store::{ISettingsStore, ListenerId, SettingsListener};

/// Setting keys understood by trackdav
pub mod keys {
    pub const SERVER_URI: &str = "server.uri";
    pub const SERVER_BASE_PATH: &str = "server.base_path";
    pub const SERVER_USER: &str = "server.user";
    pub const SERVER_PASSWORD: &str = "server.password";

    pub const MIN_TRACK_INTERVAL: &str = "tracking.min_track_interval";
    pub const MAX_TRACK_INTERVAL: &str = "tracking.max_track_interval";
    pub const INTERVAL_INCREMENT_ON_IDLE: &str = "tracking.interval_increment_on_idle";
    pub const RETRY_ON_ERROR_TIME: &str = "tracking.retry_on_error_time";
    pub const GPS_TIMEOUT: &str = "tracking.gps_timeout";
    pub const LOCATION_UPDATE_THRESHOLD: &str = "tracking.location_update_threshold";
    pub const MAX_SPEED_INCREASE: &str = "tracking.max_speed_increase";
    pub const WALKING_SPEED: &str = "tracking.walking_speed";
    pub const OFFLINE_QUEUE_CAPACITY: &str = "tracking.offline_queue_capacity";
    pub const MAX_OFFLINE_SYNC_TIME: &str = "tracking.max_offline_sync_time";
    pub const MULTI_UPLOAD_CHUNK_SIZE: &str = "tracking.multi_upload_chunk_size";
    pub const RESET_STATS_ON_START: &str = "tracking.reset_stats_on_start";

    /// Set whenever a tracking session starts
    pub const TRACKING_STARTED_AT: &str = "tracking.started_at";

    /// Prefix shared by all tracking policy keys
    pub const TRACKING_PREFIX: &str = "tracking.";
    /// Prefix shared by all server keys
    pub const SERVER_PREFIX: &str = "server.";
}

/// Thread-safe in-memory settings store
#[derive(Default)]
pub struct MemorySettingsStore {
    values: RwLock<BTreeMap<String, String>>,
    listeners: Mutex<Vec<(ListenerId, SettingsListener)>>,
    next_listener: AtomicU64,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every stored key and value
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        match self.values.read() {
            Ok(values) => values.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn notify(&self, key: &str) {
        // Clone the callbacks so a listener may (de)register without deadlocking.
        let listeners: Vec<SettingsListener> = match self.listeners.lock() {
            Ok(guard) => guard.iter().map(|(_, l)| l.clone()).collect(),
            Err(poisoned) => poisoned.into_inner().iter().map(|(_, l)| l.clone()).collect(),
        };
        for listener in listeners {
            listener(key);
        }
    }
}

impl ISettingsStore for MemorySettingsStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        match self.values.read() {
            Ok(values) => values.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    fn set_raw(&self, key: &str, value: Option<String>) {
        let changed = {
            let mut values = match self.values.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            match value {
                Some(v) => values.insert(key.to_string(), v.clone()).as_ref() != Some(&v),
                None => values.remove(key).is_some(),
            }
        };

        if changed {
            debug!(key, "Setting changed");
            self.notify(key);
        }
    }

    fn add_listener(&self, listener: SettingsListener) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        match self.listeners.lock() {
            Ok(mut guard) => guard.push((id, listener)),
            Err(poisoned) => poisoned.into_inner().push((id, listener)),
        }
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut guard = match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = guard.len();
        guard.retain(|(lid, _)| *lid != id);
        guard.len() != before
    }
}

impl ServerConfig {
    /// Reads the server configuration from a settings store
    ///
    /// Returns `None` unless every server key holds a non-empty value.
    pub fn from_settings(store: &dyn ISettingsStore) -> Option<Self> {
        let cfg = Self::from_parts(
            store.get_string(keys::SERVER_URI),
            store.get_string(keys::SERVER_BASE_PATH),
            store.get_string(keys::SERVER_USER),
            store.get_string(keys::SERVER_PASSWORD),
        );
        if cfg.is_none() {
            debug!("Server configuration is undefined");
        }
        cfg
    }

    /// Writes all four server keys to a settings store
    pub fn write_to_settings(&self, store: &dyn ISettingsStore) {
        store.set_string(keys::SERVER_URI, self.server_uri());
        store.set_string(keys::SERVER_BASE_PATH, self.base_path());
        store.set_string(keys::SERVER_USER, self.user());
        store.set_string(keys::SERVER_PASSWORD, self.password());
    }
}

impl TrackingPolicy {
    /// Reads a tracking policy, falling back to `defaults` per missing key
    ///
    /// Negative integers are treated as missing.
    pub fn from_settings(store: &dyn ISettingsStore, defaults: &TrackingPolicy) -> Self {
        let secs = |key: &str, default: u64| -> u64 {
            store
                .get_int(key)
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(default)
        };
        let count = |key: &str, default: usize| -> usize {
            store
                .get_int(key)
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(default)
        };

        let policy = Self {
            min_track_interval: secs(keys::MIN_TRACK_INTERVAL, defaults.min_track_interval),
            max_track_interval: secs(keys::MAX_TRACK_INTERVAL, defaults.max_track_interval),
            interval_increment_on_idle: secs(
                keys::INTERVAL_INCREMENT_ON_IDLE,
                defaults.interval_increment_on_idle,
            ),
            retry_on_error_time: secs(keys::RETRY_ON_ERROR_TIME, defaults.retry_on_error_time),
            gps_timeout: secs(keys::GPS_TIMEOUT, defaults.gps_timeout),
            location_update_threshold: store
                .get_double(keys::LOCATION_UPDATE_THRESHOLD)
                .unwrap_or(defaults.location_update_threshold),
            max_speed_increase: store
                .get_double(keys::MAX_SPEED_INCREASE)
                .unwrap_or(defaults.max_speed_increase),
            walking_speed: store
                .get_double(keys::WALKING_SPEED)
                .unwrap_or(defaults.walking_speed),
            offline_queue_capacity: count(
                keys::OFFLINE_QUEUE_CAPACITY,
                defaults.offline_queue_capacity,
            ),
            max_offline_sync_time: secs(
                keys::MAX_OFFLINE_SYNC_TIME,
                defaults.max_offline_sync_time,
            ),
            multi_upload_chunk_size: count(
                keys::MULTI_UPLOAD_CHUNK_SIZE,
                defaults.multi_upload_chunk_size,
            ),
            reset_stats_on_start: store
                .get_bool(keys::RESET_STATS_ON_START)
                .unwrap_or(defaults.reset_stats_on_start),
        };

        if let Err(e) = policy.validate() {
            warn!(error = %e, "Tracking settings are inconsistent, using defaults");
            return defaults.clone();
        }
        policy
    }

    /// Writes every policy field to a settings store
    pub fn write_to_settings(&self, store: &dyn ISettingsStore) {
        store.set_int(keys::MIN_TRACK_INTERVAL, self.min_track_interval as i64);
        store.set_int(keys::MAX_TRACK_INTERVAL, self.max_track_interval as i64);
        store.set_int(
            keys::INTERVAL_INCREMENT_ON_IDLE,
            self.interval_increment_on_idle as i64,
        );
        store.set_int(keys::RETRY_ON_ERROR_TIME, self.retry_on_error_time as i64);
        store.set_int(keys::GPS_TIMEOUT, self.gps_timeout as i64);
        store.set_double(
            keys::LOCATION_UPDATE_THRESHOLD,
            self.location_update_threshold,
        );
        store.set_double(keys::MAX_SPEED_INCREASE, self.max_speed_increase);
        store.set_double(keys::WALKING_SPEED, self.walking_speed);
        store.set_int(
            keys::OFFLINE_QUEUE_CAPACITY,
            self.offline_queue_capacity as i64,
        );
        store.set_int(keys::MAX_OFFLINE_SYNC_TIME, self.max_offline_sync_time as i64);
        store.set_int(
            keys::MULTI_UPLOAD_CHUNK_SIZE,
            self.multi_upload_chunk_size as i64,
        );
        store.set_bool(keys::RESET_STATS_ON_START, self.reset_stats_on_start);
    }
}
