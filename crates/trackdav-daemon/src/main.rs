//! trackdav Daemon - Background tracking service
//!
//! This binary runs as a user service and handles:
//! - Periodic position sampling with an adaptive interval
//! - Serialized uploads to the WebDAV store, with an offline queue
//! - Configuration reload on SIGHUP
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon seeds an in-memory settings store from the YAML config, waits
//! until a complete server configuration is available, then spawns the
//! upload controller task and runs the tracking loop. The loop is controlled
//! by a `CancellationToken` that is triggered on receipt of SIGTERM or SIGINT.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use trackdav_core::{
    config::{Config, LocationConfig},
    domain::{ServerConfig, TrackingPolicy},
    ports::{ILocationRetriever, ISettingsStore},
    settings::{keys, MemorySettingsStore},
};
use trackdav_sync::{
    controller::{ControllerHandle, UploadController},
    gpsd::GpsdRetriever,
    offline_queue::OfflineQueue,
    processor::LocationProcessor,
    retriever::{StaticRetriever, ValidatingRetriever},
    scheduler::TrackingLoop,
};
use trackdav_webdav::provider::WebDavRemoteStore;

/// How often to re-check for a server configuration while none is defined
const SERVER_CONFIG_CHECK_INTERVAL: Duration = Duration::from_secs(30);

// ============================================================================
// DaemonService
// ============================================================================

/// Main daemon service that wires the tracking engine together
struct DaemonService {
    /// Path the configuration was loaded from (re-read on SIGHUP)
    config_path: PathBuf,
    /// Configuration loaded at startup
    config: Config,
    /// Settings store seeded from the configuration
    settings: Arc<MemorySettingsStore>,
    /// Token for signalling graceful shutdown to all async tasks
    shutdown: CancellationToken,
}

impl DaemonService {
    fn new(config_path: PathBuf, config: Config, shutdown: CancellationToken) -> Self {
        let settings = Arc::new(MemorySettingsStore::new());
        config.apply_to_settings(settings.as_ref());

        Self {
            config_path,
            config,
            settings,
            shutdown,
        }
    }

    /// Runs the daemon until shutdown
    ///
    /// 1. Waits for a complete server configuration
    /// 2. Loads the persisted offline queue and spawns the upload controller
    /// 3. Runs the tracking loop, forwarding policy changes to the controller
    /// 4. On shutdown, lets the controller drain its inbox and persist the queue
    async fn run(&self) -> Result<()> {
        let Some(server) = self.wait_for_server_config().await else {
            return Ok(());
        };
        info!(server = %server.server_uri(), base_path = %server.base_path(), "Server configuration found");

        let timeout = Duration::from_secs(self.config.server.request_timeout_secs);
        let store = Arc::new(WebDavRemoteStore::connect(&server, timeout)?);

        let policy = TrackingPolicy::from_settings(self.settings.as_ref(), &self.config.tracking);
        let queue = self.load_queue(policy.offline_queue_capacity).await;

        let (controller, handle) = UploadController::new(store, policy.clone(), queue);
        let controller = if self.config.queue.persist {
            controller.with_persistence(self.config.queue.path.clone())
        } else {
            controller
        };
        let controller_task = tokio::spawn(controller.run());

        let (policy_tx, policy_rx) = watch::channel(policy.clone());
        let forwarder = self.spawn_policy_forwarder(handle.clone(), policy_tx);

        let retriever = build_retriever(&self.config.location, &policy)?;
        let processor = LocationProcessor::new(retriever, handle, policy.gps_timeout_duration())
            .with_policy_updates(policy_rx);

        self.settings
            .set_date(keys::TRACKING_STARTED_AT, Some(Utc::now()));
        let result = TrackingLoop::new(processor, self.shutdown.child_token())
            .reset_stats_on_start(policy.reset_stats_on_start)
            .run()
            .await;

        // The loop owned the last processor handle; stop the forwarder so the
        // controller sees every handle dropped.
        self.shutdown.cancel();
        if let Err(e) = forwarder.await {
            warn!(error = %e, "Policy forwarder task panicked");
        }
        match controller_task.await {
            Ok(queue) => info!(pending = queue.len(), "Upload controller finished"),
            Err(e) => error!(error = %e, "Upload controller task panicked"),
        }

        let cycles = result.context("Tracking loop stopped unexpectedly")?;
        info!(cycles, "Tracking session ended");
        Ok(())
    }

    /// Waits until the settings hold a complete server configuration
    ///
    /// Checks every 30 seconds. Returns `None` if shutdown is requested first.
    async fn wait_for_server_config(&self) -> Option<ServerConfig> {
        if let Some(server) = ServerConfig::from_settings(self.settings.as_ref()) {
            return Some(server);
        }

        warn!(
            config = %self.config_path.display(),
            "Server configuration incomplete (uri, base_path, user and password are required). \
             Waiting for configuration."
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(SERVER_CONFIG_CHECK_INTERVAL) => {
                    if let Some(server) = ServerConfig::from_settings(self.settings.as_ref()) {
                        return Some(server);
                    }
                    debug!("Still no server configuration");
                }
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received while waiting for configuration");
                    return None;
                }
            }
        }
    }

    /// Loads the persisted queue, starting empty when it cannot be read
    async fn load_queue(&self, capacity: usize) -> OfflineQueue {
        if !self.config.queue.persist {
            return OfflineQueue::new(capacity);
        }
        let path = &self.config.queue.path;
        match OfflineQueue::load(path, capacity).await {
            Ok(queue) => {
                info!(path = %path.display(), pending = queue.len(), "Loaded offline queue");
                queue
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load offline queue, starting empty");
                OfflineQueue::new(capacity)
            }
        }
    }

    /// Forwards changes of `tracking.*` settings to the controller and processor
    fn spawn_policy_forwarder(
        &self,
        handle: ControllerHandle,
        policy_tx: watch::Sender<TrackingPolicy>,
    ) -> tokio::task::JoinHandle<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let listener_id = self.settings.add_listener(Arc::new(move |key: &str| {
            if key.starts_with(keys::TRACKING_PREFIX) && key != keys::TRACKING_STARTED_AT {
                let _ = tx.send(key.to_string());
            }
        }));

        let settings = Arc::clone(&self.settings);
        let defaults = self.config.tracking.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    key = rx.recv() => {
                        let Some(key) = key else { break };
                        debug!(key = %key, "Tracking setting changed");
                        let policy = TrackingPolicy::from_settings(settings.as_ref(), &defaults);
                        if handle.update_policy(policy.clone()).await.is_err() {
                            break;
                        }
                        let _ = policy_tx.send(policy);
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
            settings.remove_listener(listener_id);
        })
    }
}

/// Builds the configured location source, optionally speed-validated
fn build_retriever(
    location: &LocationConfig,
    policy: &TrackingPolicy,
) -> Result<Arc<dyn ILocationRetriever>> {
    let base: Arc<dyn ILocationRetriever> = match location.source.as_str() {
        "static" => Arc::new(
            StaticRetriever::new(location.static_latitude, location.static_longitude)
                .context("Invalid static position in configuration")?,
        ),
        "gpsd" => Arc::new(GpsdRetriever::new(location.gpsd_host.clone(), location.gpsd_port)),
        other => anyhow::bail!("Unknown location source '{other}' (expected 'gpsd' or 'static')"),
    };
    info!(source = %location.source, validate_speed = location.validate_speed, "Location source ready");

    if location.validate_speed {
        Ok(Arc::new(ValidatingRetriever::new(
            base,
            policy.max_accepted_speed(),
        )))
    } else {
        Ok(base)
    }
}

// ============================================================================
// Signal handling
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
        _ = token.cancelled() => return,
    }

    token.cancel();
}

/// Re-reads the config file on SIGHUP and writes it into the settings store
///
/// Listeners on the store pick up tracking changes; a server section that
/// becomes complete ends the wait for configuration.
#[cfg(unix)]
async fn reload_on_sighup(
    config_path: PathBuf,
    settings: Arc<MemorySettingsStore>,
    token: CancellationToken,
) {
    let mut hangup = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
        Ok(signal) => signal,
        Err(e) => {
            warn!(error = %e, "Failed to install SIGHUP handler, reload disabled");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = hangup.recv() => {
                match Config::load(&config_path) {
                    Ok(config) => {
                        config.apply_to_settings(settings.as_ref());
                        info!(config = %config_path.display(), "Configuration reloaded");
                    }
                    Err(e) => warn!(error = %e, "Failed to reload configuration"),
                }
            }
            _ = token.cancelled() => return,
        }
    }
}

#[cfg(not(unix))]
async fn reload_on_sighup(
    _config_path: PathBuf,
    _settings: Arc<MemorySettingsStore>,
    _token: CancellationToken,
) {
}

// ============================================================================
// Main entry point
// ============================================================================

fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = Config::default_path();
    let config = Config::load_or_default(&config_path);
    init_tracing(&config);

    info!(config_path = %config_path.display(), "trackdav daemon starting (trackdavd)");
    for issue in config.validate() {
        warn!(field = %issue.field, "{}", issue.message);
    }

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(config_path.clone(), config, shutdown_token.clone());

    tokio::spawn(reload_on_sighup(
        config_path,
        Arc::clone(&service.settings),
        shutdown_token.clone(),
    ));

    let result = service.run().await;
    shutdown_token.cancel();

    match &result {
        Ok(()) => info!("trackdav daemon shut down gracefully"),
        Err(e) => error!(error = %e, "trackdav daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
