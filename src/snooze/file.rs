/// JSON file snooze store for single-host deployments without Postgres.
///
/// The whole file is a map of location key to record. Every mutation reads
/// the file, changes one entry and writes a temporary sibling that is then
/// renamed over the original, so a reader never sees a half-written file.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::SnoozeStore;
use crate::model::{LocationKey, SnoozeRecord, StoreError};

type Records = BTreeMap<LocationKey, SnoozeRecord>;

pub struct FileSnoozeStore {
    path: PathBuf,
}

impl FileSnoozeStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_all(&self) -> Result<Records, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Records::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Records::new());
        }
        serde_json::from_str(&contents).map_err(|e| {
            StoreError::Corrupt(format!("{}: {}", self.path.display(), e))
        })
    }

    fn write_all(&self, records: &Records) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Records),
    {
        let mut records = self.read_all()?;
        change(&mut records);
        self.write_all(&records)
    }
}

impl SnoozeStore for FileSnoozeStore {
    fn load(&mut self, key: &LocationKey) -> Result<Option<SnoozeRecord>, StoreError> {
        Ok(self.read_all()?.get(key).copied())
    }

    fn set(&mut self, key: &LocationKey, expires_at: i64) -> Result<(), StoreError> {
        self.update(|records| {
            records.insert(
                key.clone(),
                SnoozeRecord {
                    expires_at: Some(expires_at),
                    resume_notice_sent: false,
                },
            );
        })
    }

    fn mark_resume_sent(&mut self, key: &LocationKey) -> Result<(), StoreError> {
        self.update(|records| {
            if let Some(record) = records.get_mut(key) {
                record.resume_notice_sent = true;
            }
        })
    }

    fn clear(&mut self, key: &LocationKey) -> Result<(), StoreError> {
        self.update(|records| {
            records.remove(key);
        })
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
