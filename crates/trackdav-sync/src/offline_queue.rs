//! Bounded offline queue
//!
//! Holds location records whose upload failed, oldest first. When the queue
//! is full, pushing a new entry silently evicts the oldest one: bounded
//! memory takes precedence over completeness.
//!
//! The queue is not synchronized. It is owned by the upload controller task,
//! which is the only code that touches it while tracking runs.
//!
//! ## Persistence
//!
//! [`OfflineQueue::save`] writes the pending entries to a JSON file and
//! [`OfflineQueue::load`] reads them back, so undelivered records survive a
//! daemon restart. Both go through `tokio::fs`, so the owning task never
//! blocks its worker thread. Writes go to a temporary sibling file that is
//! then renamed over the target.

use std::{collections::VecDeque, io::ErrorKind, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::SyncError;

/// One undelivered location record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Identity used to remove the entry after a confirmed upload
    pub id: u64,
    /// Path of the record relative to the remote base path
    pub remote_path: String,
    /// Serialized record
    pub content: String,
    /// When the entry was queued
    pub enqueued_at: DateTime<Utc>,
}

/// On-disk representation
#[derive(Serialize, Deserialize)]
struct QueueFile {
    next_id: u64,
    entries: Vec<QueueEntry>,
}

/// Bounded FIFO of undelivered records
#[derive(Debug, Clone)]
pub struct OfflineQueue {
    entries: VecDeque<QueueEntry>,
    capacity: usize,
    next_id: u64,
}

impl OfflineQueue {
    /// Creates an empty queue; a capacity of 0 is raised to 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    /// Appends a record, evicting the oldest entry when the queue is full
    ///
    /// # Returns
    /// The evicted entry, if any
    pub fn push(
        &mut self,
        remote_path: impl Into<String>,
        content: impl Into<String>,
        enqueued_at: DateTime<Utc>,
    ) -> Option<QueueEntry> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        if let Some(old) = &evicted {
            debug!(id = old.id, path = %old.remote_path, "Offline queue full, evicted oldest entry");
        }

        let entry = QueueEntry {
            id: self.next_id,
            remote_path: remote_path.into(),
            content: content.into(),
            enqueued_at,
        };
        self.next_id += 1;
        self.entries.push_back(entry);
        evicted
    }

    /// Returns up to `n` oldest entries without removing them
    pub fn peek_oldest(&self, n: usize) -> Vec<QueueEntry> {
        self.entries.iter().take(n).cloned().collect()
    }

    /// Removes the entry with the given id
    ///
    /// # Returns
    /// `true` if the entry was still queued
    pub fn remove(&mut self, id: u64) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over pending entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    /// Changes the capacity, evicting the oldest entries if it shrinks
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Loads a queue from `path`
    ///
    /// A missing file yields an empty queue. When the file holds more entries
    /// than `capacity`, only the newest are kept.
    pub async fn load(path: &Path, capacity: usize) -> Result<Self, SyncError> {
        let mut queue = Self::new(capacity);
        let data = match tokio::fs::read_to_string(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(queue),
            Err(e) => return Err(e.into()),
        };

        let file: QueueFile = serde_json::from_str(&data)?;
        let max_id = file.entries.iter().map(|e| e.id).max().unwrap_or(0);
        queue.next_id = file.next_id.max(max_id + 1);
        queue.entries = file.entries.into();
        while queue.entries.len() > queue.capacity {
            queue.entries.pop_front();
        }

        debug!(path = %path.display(), entries = queue.len(), "Loaded offline queue");
        Ok(queue)
    }

    /// Writes the pending entries to `path`, creating parent directories
    pub async fn save(&self, path: &Path) -> Result<(), SyncError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = QueueFile {
            next_id: self.next_id,
            entries: self.entries.iter().cloned().collect(),
        };
        let data = serde_json::to_string_pretty(&file)?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}
