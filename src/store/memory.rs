use super::{apply_fields, DocumentStore, Record, StoreKey};
use crate::error::StoreError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-process store, for demos and tests.
///
/// An optional latency is applied to every call; saves can be made to fail
/// to exercise the persistence failure path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<StoreKey, Record>>,
    latency: Duration,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn insert(&self, key: StoreKey, record: Record) {
        if let Ok(mut records) = self.records.lock() {
            records.insert(key, record);
        }
    }

    pub fn get(&self, key: &StoreKey) -> Option<Record> {
        self.records
            .lock()
            .ok()
            .and_then(|records| records.get(key).cloned())
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of save calls that reached the store, failed ones included.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("memory store lock poisoned".to_string())
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, key: &StoreKey) -> Result<Option<Record>, StoreError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let records = self.records.lock().map_err(|_| Self::poisoned())?;
        Ok(records.get(key).cloned())
    }

    async fn save(&self, key: &StoreKey, fields: Record, merge: bool) -> Result<(), StoreError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("save rejected for {key}")));
        }

        let mut records = self.records.lock().map_err(|_| Self::poisoned())?;
        let existing = records.remove(key);
        records.insert(key.clone(), apply_fields(existing, fields, merge));
        Ok(())
    }
}
