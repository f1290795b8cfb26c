//! In-test port implementations

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use trackdav_core::{
    domain::{Position, RemoteFolder},
    ports::{ILocationRetriever, IRemoteStore},
};

/// Remote store that records every upload and fails on demand
#[derive(Default)]
pub struct RecordingStore {
    pub uploads: Mutex<Vec<(String, String)>>,
    pub deletes: Mutex<Vec<String>>,
    fail_all: AtomicBool,
    fail_paths: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_all.store(failing, Ordering::SeqCst);
    }

    pub fn fail_path(&self, path: &str) {
        self.fail_paths.lock().unwrap().push(path.to_string());
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }
}

#[async_trait]
impl IRemoteStore for RecordingStore {
    async fn upload(&self, path: &str, content: &[u8]) -> bool {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_all.load(Ordering::SeqCst)
            || self.fail_paths.lock().unwrap().iter().any(|p| p == path)
        {
            return false;
        }
        self.uploads.lock().unwrap().push((
            path.to_string(),
            String::from_utf8_lossy(content).into_owned(),
        ));
        true
    }

    async fn delete(&self, path: &str) -> bool {
        self.deletes.lock().unwrap().push(path.to_string());
        !self.fail_all.load(Ordering::SeqCst)
    }

    async fn load_folder(&self, _path: &str) -> RemoteFolder {
        RemoteFolder::empty()
    }
}

/// Retriever that replays a scripted sequence of fixes
pub struct ScriptedRetriever {
    fixes: Mutex<VecDeque<Option<Position>>>,
}

impl ScriptedRetriever {
    pub fn new(fixes: Vec<Option<Position>>) -> Self {
        Self {
            fixes: Mutex::new(fixes.into()),
        }
    }
}

#[async_trait]
impl ILocationRetriever for ScriptedRetriever {
    async fn fetch(&self) -> Option<Position> {
        self.fixes.lock().unwrap().pop_front().flatten()
    }
}

/// Retriever that never answers
pub struct HangingRetriever;

#[async_trait]
impl ILocationRetriever for HangingRetriever {
    async fn fetch(&self) -> Option<Position> {
        std::future::pending().await
    }
}
