//! Configuration module for trackdav.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::{ServerConfig, TrackingPolicy};
use crate::ports::settings_store::ISettingsStore;

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV: &str = "TRACKDAV_CONFIG";

fn path_from_env(value: Option<OsString>) -> PathBuf {
    match value {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trackdav")
            .join("config.yaml"),
    }
}

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for trackdav.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub tracking: TrackingPolicy,
    pub location: LocationConfig,
    pub queue: QueueConfig,
    pub logging: LoggingConfig,
}

/// Remote WebDAV store settings.
///
/// All four connection fields must be set for synchronization to start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Scheme and authority, e.g. `https://cloud.example.com`.
    pub uri: Option<String>,
    /// Path prefix of the tracking folder on the server.
    pub base_path: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Deadline applied to every PUT, DELETE and PROPFIND request.
    pub request_timeout_secs: u64,
}

/// Where position fixes come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// `gpsd` or `static`.
    pub source: String,
    pub gpsd_host: String,
    pub gpsd_port: u16,
    /// Fixed coordinates reported by the `static` source.
    pub static_latitude: f64,
    pub static_longitude: f64,
    /// Reject fixes implying an implausible speed.
    pub validate_speed: bool,
}

/// Offline queue persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Persist pending uploads across restarts.
    pub persist: bool,
    /// JSON file holding the pending uploads.
    pub path: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the configuration as YAML to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Default path for the configuration file.
    ///
    /// `$TRACKDAV_CONFIG` when set and non-empty, otherwise
    /// `$XDG_CONFIG_HOME/trackdav/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        path_from_env(std::env::var_os(CONFIG_ENV))
    }

    /// The server section as an all-or-nothing [`ServerConfig`].
    pub fn server_config(&self) -> Option<ServerConfig> {
        ServerConfig::from_parts(
            self.server.uri.clone(),
            self.server.base_path.clone(),
            self.server.user.clone(),
            self.server.password.clone(),
        )
    }

    /// Seed a settings store with the server and tracking sections.
    ///
    /// Server keys are only written when the section is fully defined, so a
    /// partial section leaves the store without a server configuration.
    pub fn apply_to_settings(&self, store: &dyn ISettingsStore) {
        if let Some(server) = self.server_config() {
            server.write_to_settings(store);
        }
        self.tracking.write_to_settings(store);
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            uri: None,
            base_path: None,
            user: None,
            password: None,
            request_timeout_secs: 30,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            source: "gpsd".to_string(),
            gpsd_host: "127.0.0.1".to_string(),
            gpsd_port: 2947,
            static_latitude: 0.0,
            static_longitude: 0.0,
            validate_speed: true,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trackdav");
        Self {
            persist: true,
            path: data_dir.join("offline_queue.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"tracking.min_track_interval"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `location.source`.
const VALID_LOCATION_SOURCES: &[&str] = &["gpsd", "static"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. An undefined server
    /// section is not an error; synchronization simply does not start.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- server ---
        let parts = [
            ("server.uri", &self.server.uri),
            ("server.base_path", &self.server.base_path),
            ("server.user", &self.server.user),
            ("server.password", &self.server.password),
        ];
        let defined = parts
            .iter()
            .filter(|(_, v)| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
            .count();
        if defined > 0 && defined < parts.len() {
            for (field, value) in parts {
                if value.as_deref().map_or(true, |s| s.trim().is_empty()) {
                    errors.push(ValidationError {
                        field: field.into(),
                        message: "required when any server setting is present".into(),
                    });
                }
            }
        }
        if let Some(uri) = &self.server.uri {
            if !uri.is_empty() && !(uri.starts_with("http://") || uri.starts_with("https://")) {
                errors.push(ValidationError {
                    field: "server.uri".into(),
                    message: format!("must start with http:// or https://, got '{uri}'"),
                });
            }
        }
        if self.server.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "server.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- tracking ---
        if let Err(e) = self.tracking.validate() {
            errors.push(ValidationError {
                field: "tracking".into(),
                message: e.to_string(),
            });
        }
        if self.tracking.gps_timeout == 0 {
            errors.push(ValidationError {
                field: "tracking.gps_timeout".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- location ---
        if !VALID_LOCATION_SOURCES.contains(&self.location.source.as_str()) {
            errors.push(ValidationError {
                field: "location.source".into(),
                message: format!(
                    "invalid source '{}'; valid options: {}",
                    self.location.source,
                    VALID_LOCATION_SOURCES.join(", ")
                ),
            });
        }
        if self.location.gpsd_port == 0 {
            errors.push(ValidationError {
                field: "location.gpsd_port".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use trackdav_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .server("https://cloud.example.com", "/dav/tracks", "alice", "secret")
///     .min_track_interval(60)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- server ---

    pub fn server(
        mut self,
        uri: impl Into<String>,
        base_path: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.config.server.uri = Some(uri.into());
        self.config.server.base_path = Some(base_path.into());
        self.config.server.user = Some(user.into());
        self.config.server.password = Some(password.into());
        self
    }

    pub fn request_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.server.request_timeout_secs = seconds;
        self
    }

    // --- tracking ---

    pub fn tracking(mut self, policy: TrackingPolicy) -> Self {
        self.config.tracking = policy;
        self
    }

    pub fn min_track_interval(mut self, seconds: u64) -> Self {
        self.config.tracking.min_track_interval = seconds;
        self
    }

    pub fn max_track_interval(mut self, seconds: u64) -> Self {
        self.config.tracking.max_track_interval = seconds;
        self
    }

    pub fn offline_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.tracking.offline_queue_capacity = capacity;
        self
    }

    // --- location ---

    pub fn location_source(mut self, source: impl Into<String>) -> Self {
        self.config.location.source = source.into();
        self
    }

    pub fn static_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.config.location.source = "static".to_string();
        self.config.location.static_latitude = latitude;
        self.config.location.static_longitude = longitude;
        self
    }

    pub fn gpsd(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.location.source = "gpsd".to_string();
        self.config.location.gpsd_host = host.into();
        self.config.location.gpsd_port = port;
        self
    }

    // --- queue ---

    pub fn queue_path(mut self, path: PathBuf) -> Self {
        self.config.queue.path = path;
        self
    }

    pub fn queue_persist(mut self, persist: bool) -> Self {
        self.config.queue.persist = persist;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
