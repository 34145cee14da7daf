//! In-process object store
//!
//! Used by `--dry-run` and by the test suite. It can simulate per-put latency
//! and inject failures for chosen keys, and it records how many puts were in
//! flight at once. In metadata-only mode (dry runs) bodies are dropped and only
//! key, content type and length are kept.

use super::{ObjectStore, PutAck};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// An object held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub length: u64,
}

/// Object store that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    latency: Duration,
    fail_keys: HashSet<String>,
    metadata_only: bool,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    attempts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every put
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Reject puts to `key`
    pub fn fail_on(mut self, key: impl Into<String>) -> Self {
        self.fail_keys.insert(key.into());
        self
    }

    /// Keep key, content type and length only; bodies are discarded
    pub fn metadata_only(mut self) -> Self {
        self.metadata_only = true;
        self
    }

    /// Snapshot of stored objects, ordered by key
    pub fn objects(&self) -> BTreeMap<String, StoredObject> {
        self.objects
            .lock()
            .map(|objects| objects.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().ok()?.get(key).cloned()
    }

    /// Number of objects successfully stored
    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes stored
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .lock()
            .map(|o| o.values().map(|obj| obj.length).sum())
            .unwrap_or(0)
    }

    /// Puts started, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Puts currently executing
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of puts observed executing at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        length: u64,
    ) -> Result<PutAck, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        // Injected failures return at once, before any simulated latency
        if self.fail_keys.contains(key) {
            return Err(StoreError::new(key, "injected failure"));
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let object = StoredObject {
            body: if self.metadata_only { Vec::new() } else { body },
            content_type: content_type.to_string(),
            length,
        };
        let result = match self.objects.lock() {
            Ok(mut objects) => {
                objects.insert(key.to_string(), object);
                Ok(PutAck::default())
            }
            Err(_) => Err(StoreError::new(key, "memory store poisoned")),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn describe(&self) -> String {
        "memory://dry-run".to_string()
    }
}
