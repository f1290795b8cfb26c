//! Upload controller actor
//!
//! The [`UploadController`] is the single serialization point of the
//! tracking engine. It runs as a tokio task that owns the remote store and
//! the [`OfflineQueue`], and processes [`ControllerOp`]s one at a time from
//! a single-slot channel. No two remote operations are ever in flight.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐  ControllerOp   ┌──────────────────┐
//! │ LocationProcessor │ ──────────────► │ UploadController │
//! │     (caller)      │                 │       task       │
//! └───────────────────┘                 └──────────────────┘
//!          │                                  │        │
//!          │        next delay via oneshot    │        ▼
//!          │ ◄────────────────────────────────┤  ┌──────────────┐
//!          │                                  │  │ OfflineQueue │
//!                                             ▼  └──────────────┘
//!                                     ┌──────────────┐
//!                                     │ IRemoteStore │
//!                                     └──────────────┘
//! ```
//!
//! ## Per-message processing
//!
//! 1. Upload the position as `<timestamp>.json`.
//! 2. On success, drain up to `multi_upload_chunk_size` queued records,
//!    bounded by `max_offline_sync_time`, stopping at the first failure.
//! 3. On failure, queue the record (evicting the oldest when full).
//! 4. Reply with the next sampling delay.

use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::{mpsc, oneshot},
    time::Instant,
};
use tracing::{debug, info, trace, warn};
use trackdav_core::{
    domain::{Position, TrackingPolicy},
    ports::IRemoteStore,
};

use crate::{
    interval::{self, IntervalState},
    offline_queue::OfflineQueue,
    SyncError,
};

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Format of remote record names, relative to the base path
pub const REMOTE_PATH_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3fZ.json";

/// Builds the remote path of a record captured at `captured_at`
pub fn remote_path_for(captured_at: DateTime<Utc>) -> String {
    captured_at.format(REMOTE_PATH_FORMAT).to_string()
}

// ============================================================================
// Messages
// ============================================================================

/// One sampling result handed to the controller
///
/// `next_delay` is resolved exactly once, after the message (including any
/// queue drain) has been fully processed.
#[derive(Debug)]
pub struct LocationMessage {
    pub position: Position,
    /// `false` when no fix was obtained; `position` is then a placeholder
    pub raw_fix_present: bool,
    pub next_delay: oneshot::Sender<u64>,
}

/// Counters describing the current tracking session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackingStats {
    pub uploads_succeeded: u64,
    pub upload_errors: u64,
    pub queued_uploads_flushed: u64,
    pub last_distance_m: Option<f64>,
    pub last_upload_at: Option<DateTime<Utc>>,
    pub current_interval: u64,
    pub queue_len: usize,
}

/// Operations processed by the controller task
#[derive(Debug)]
pub enum ControllerOp {
    /// Process a sampling result
    Location(LocationMessage),

    /// Snapshot the session counters
    Stats {
        reply: oneshot::Sender<TrackingStats>,
    },

    /// Zero the session counters and forget the previous position
    ResetStats { reply: oneshot::Sender<()> },

    /// Drain the whole queue, bounded by `max_offline_sync_time`
    FlushQueue { reply: oneshot::Sender<usize> },

    /// Number of pending queue entries
    QueueLen { reply: oneshot::Sender<usize> },

    /// Replace the tracking policy
    UpdatePolicy {
        policy: Box<TrackingPolicy>,
        reply: oneshot::Sender<()>,
    },
}

// ============================================================================
// ControllerHandle
// ============================================================================

/// Handle for sending operations to the [`UploadController`]
///
/// This handle can be cloned and shared across tasks. All operations are
/// processed sequentially, in send order, by the controller task.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<ControllerOp>,
}

impl ControllerHandle {
    async fn call<T>(&self, op: ControllerOp, rx: oneshot::Receiver<T>) -> Result<T> {
        self.tx
            .send(op)
            .await
            .map_err(|_| SyncError::ControllerStopped)?;
        rx.await.map_err(|_| SyncError::ControllerResponseLost)
    }

    /// Submits a sampling result and waits for the next sampling delay
    ///
    /// Suspends while the controller is busy with an earlier message.
    pub async fn submit(&self, position: Position, raw_fix_present: bool) -> Result<u64> {
        let (tx, rx) = oneshot::channel();
        let msg = LocationMessage {
            position,
            raw_fix_present,
            next_delay: tx,
        };
        self.call(ControllerOp::Location(msg), rx).await
    }

    /// Returns a snapshot of the session counters
    pub async fn stats(&self) -> Result<TrackingStats> {
        let (tx, rx) = oneshot::channel();
        self.call(ControllerOp::Stats { reply: tx }, rx).await
    }

    /// Resets the session counters
    pub async fn reset_stats(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.call(ControllerOp::ResetStats { reply: tx }, rx).await
    }

    /// Drains the offline queue now
    ///
    /// # Returns
    /// Number of records delivered
    pub async fn flush_queue(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.call(ControllerOp::FlushQueue { reply: tx }, rx).await
    }

    /// Returns the number of pending queue entries
    pub async fn queue_len(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.call(ControllerOp::QueueLen { reply: tx }, rx).await
    }

    /// Replaces the tracking policy used for subsequent messages
    pub async fn update_policy(&self, policy: TrackingPolicy) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let op = ControllerOp::UpdatePolicy {
            policy: Box::new(policy),
            reply: tx,
        };
        self.call(op, rx).await
    }
}

// ============================================================================
// UploadController
// ============================================================================

/// Serializes uploads and owns the offline queue
///
/// # Example
///
/// ```ignore
/// let (controller, handle) = UploadController::new(store, policy, OfflineQueue::new(500));
/// tokio::spawn(controller.run());
///
/// let delay = handle.submit(position, true).await?;
/// ```
pub struct UploadController {
    rx: mpsc::Receiver<ControllerOp>,
    store: Arc<dyn IRemoteStore>,
    queue: OfflineQueue,
    policy: TrackingPolicy,
    queue_path: Option<PathBuf>,
    previous: Option<Position>,
    stats: TrackingStats,
}

impl UploadController {
    /// Creates a controller and the handle used to reach it
    ///
    /// The queue capacity follows `policy.offline_queue_capacity`. The caller
    /// must spawn [`run()`](Self::run).
    pub fn new(
        store: Arc<dyn IRemoteStore>,
        policy: TrackingPolicy,
        mut queue: OfflineQueue,
    ) -> (Self, ControllerHandle) {
        // Single slot: a sender waits while a message is being processed
        let (tx, rx) = mpsc::channel(1);
        queue.set_capacity(policy.offline_queue_capacity);

        let stats = TrackingStats {
            current_interval: policy.min_track_interval,
            queue_len: queue.len(),
            ..TrackingStats::default()
        };

        let controller = Self {
            rx,
            store,
            queue,
            policy,
            queue_path: None,
            previous: None,
            stats,
        };
        (controller, ControllerHandle { tx })
    }

    /// Persists the queue to `path` after every change
    pub fn with_persistence(mut self, path: PathBuf) -> Self {
        self.queue_path = Some(path);
        self
    }

    /// Runs until every handle has been dropped
    ///
    /// # Returns
    /// The queue as it stands when the controller stops
    pub async fn run(mut self) -> OfflineQueue {
        info!(
            pending = self.queue.len(),
            capacity = self.queue.capacity(),
            "Upload controller started"
        );

        while let Some(op) = self.rx.recv().await {
            self.process_operation(op).await;
        }

        self.persist().await;
        info!(
            pending = self.queue.len(),
            "Upload controller stopped (all handles dropped)"
        );
        self.queue
    }

    async fn process_operation(&mut self, op: ControllerOp) {
        match op {
            ControllerOp::Location(msg) => {
                let delay = self.process_location(msg.position, msg.raw_fix_present).await;
                if msg.next_delay.send(delay).is_err() {
                    debug!("Location sender went away before the delay was delivered");
                }
            }
            ControllerOp::Stats { reply } => {
                let mut stats = self.stats.clone();
                stats.queue_len = self.queue.len();
                let _ = reply.send(stats);
            }
            ControllerOp::ResetStats { reply } => {
                trace!("Processing ResetStats");
                self.stats = TrackingStats {
                    current_interval: self.policy.min_track_interval,
                    queue_len: self.queue.len(),
                    ..TrackingStats::default()
                };
                self.previous = None;
                let _ = reply.send(());
            }
            ControllerOp::FlushQueue { reply } => {
                let flushed = self.drain(self.queue.len()).await;
                let _ = reply.send(flushed);
            }
            ControllerOp::QueueLen { reply } => {
                let _ = reply.send(self.queue.len());
            }
            ControllerOp::UpdatePolicy { policy, reply } => {
                info!(?policy, "Tracking policy updated");
                self.policy = *policy;
                if self.queue.capacity() != self.policy.offline_queue_capacity {
                    self.queue.set_capacity(self.policy.offline_queue_capacity);
                    self.persist().await;
                }
                let _ = reply.send(());
            }
        }
    }

    /// Handles one sampling result and returns the next delay
    async fn process_location(&mut self, position: Position, raw_fix_present: bool) -> u64 {
        if !raw_fix_present {
            // Nothing to deliver; treat as no movement
            let state = IntervalState::IdleGrowth;
            let delay = interval::interval_for(state, self.stats.current_interval, &self.policy);
            debug!(delay, %state, "No position fix this cycle");
            self.stats.current_interval = delay;
            return delay;
        }

        let remote_path = remote_path_for(position.captured_at());
        let content = match serde_json::to_string(&position) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "Failed to serialize position");
                return self.policy.retry_on_error_time;
            }
        };

        let ok = self.store.upload(&remote_path, content.as_bytes()).await;
        if ok {
            self.stats.uploads_succeeded += 1;
            self.stats.last_upload_at = Some(Utc::now());
            debug!(path = %remote_path, "Position uploaded");

            let chunk = self.policy.multi_upload_chunk_size;
            if !self.queue.is_empty() {
                self.drain(chunk).await;
            }
        } else {
            self.stats.upload_errors += 1;
            warn!(path = %remote_path, "Upload failed, queueing position");
            self.queue.push(remote_path, content, Utc::now());
            self.persist().await;
        }

        let (state, delay) = interval::next_interval(
            self.previous.as_ref(),
            &position,
            ok,
            self.stats.current_interval,
            &self.policy,
        );
        if let Some(previous) = &self.previous {
            self.stats.last_distance_m = Some(previous.distance_to(&position));
        }
        self.previous = Some(position);
        self.stats.current_interval = delay;

        info!(
            delay,
            %state,
            uploaded = ok,
            pending = self.queue.len(),
            "Location processed"
        );
        delay
    }

    /// Delivers up to `limit` oldest queued records
    ///
    /// Stops at the first failure or once `max_offline_sync_time` has
    /// elapsed. Each record is removed only after a confirmed upload.
    ///
    /// The budget is checked before each upload, never during one, so a
    /// drain may run past it by at most one request timeout.
    ///
    /// # Returns
    /// Number of records delivered
    async fn drain(&mut self, limit: usize) -> usize {
        let started = Instant::now();
        let budget = self.policy.max_offline_sync_duration();
        let mut flushed = 0;

        for entry in self.queue.peek_oldest(limit) {
            if started.elapsed() >= budget {
                debug!(flushed, "Offline sync time exhausted");
                break;
            }
            if !self.store.upload(&entry.remote_path, entry.content.as_bytes()).await {
                debug!(path = %entry.remote_path, "Queued upload failed, stopping drain");
                break;
            }
            self.queue.remove(entry.id);
            flushed += 1;
        }

        if flushed > 0 {
            self.stats.queued_uploads_flushed += flushed as u64;
            info!(flushed, remaining = self.queue.len(), "Flushed offline queue");
            self.persist().await;
        }
        flushed
    }

    async fn persist(&self) {
        let Some(path) = &self.queue_path else {
            return;
        };
        if let Err(e) = self.queue.save(path).await {
            warn!(path = %path.display(), error = %e, "Failed to persist offline queue");
        }
    }
}
