/// In-process snooze store. State lives only as long as the value, so this
/// is for tests and fakes, not for deployments.

use std::collections::HashMap;

use super::SnoozeStore;
use crate::model::{LocationKey, SnoozeRecord, StoreError};

#[derive(Debug, Default)]
pub struct MemorySnoozeStore {
    records: HashMap<LocationKey, SnoozeRecord>,
    writes: usize,
}

impl MemorySnoozeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without counting it as a write.
    pub fn insert(&mut self, key: LocationKey, record: SnoozeRecord) {
        self.records.insert(key, record);
    }

    pub fn record(&self, key: &LocationKey) -> Option<SnoozeRecord> {
        self.records.get(key).copied()
    }

    /// Number of mutating calls (set, mark, clear) made through the store.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl SnoozeStore for MemorySnoozeStore {
    fn load(&mut self, key: &LocationKey) -> Result<Option<SnoozeRecord>, StoreError> {
        Ok(self.records.get(key).copied())
    }

    fn set(&mut self, key: &LocationKey, expires_at: i64) -> Result<(), StoreError> {
        self.writes += 1;
        self.records.insert(
            key.clone(),
            SnoozeRecord {
                expires_at: Some(expires_at),
                resume_notice_sent: false,
            },
        );
        Ok(())
    }

    fn mark_resume_sent(&mut self, key: &LocationKey) -> Result<(), StoreError> {
        self.writes += 1;
        if let Some(record) = self.records.get_mut(key) {
            record.resume_notice_sent = true;
        }
        Ok(())
    }

    fn clear(&mut self, key: &LocationKey) -> Result<(), StoreError> {
        self.writes += 1;
        self.records.remove(key);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
