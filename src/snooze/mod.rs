/// Snooze state machine and its persistence seam.
///
/// ## States (per location)
///
/// - **Active**: no record, or a record without an expiry.
/// - **Snoozed**: record present, expiry strictly in the future.
/// - **Expiring**: record present, expiry reached, not yet resolved.
///
/// ```text
/// Active --(alert fires)--> Snoozed --(expiry reached)--> Expiring
///    ^                                                       |
///    +-------------------(resolve_expiry)--------------------+
/// ```
///
/// The record lives in a `SnoozeStore` and is the single source of truth
/// shared by every invocation, possibly on different hosts. The controller
/// never caches it: each decision re-reads the store. There is no lock;
/// two overlapping runs may both alert and both snooze, and the later write
/// wins. A duplicate notification is preferred over a missed one.

pub mod file;
pub mod memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::model::{LocationKey, NotifyError, SnoozeRecord, SnoozeTier, StoreError};

pub use file::FileSnoozeStore;
pub use memory::MemorySnoozeStore;
pub use postgres::PostgresSnoozeStore;

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// Persisted per-location snooze record. Storage only, no policy.
pub trait SnoozeStore {
    /// Read the record for `key`, reporting failures.
    fn load(&mut self, key: &LocationKey) -> Result<Option<SnoozeRecord>, StoreError>;

    /// Write a fresh record: `expires_at` set, resume flag cleared.
    /// Replaces any existing record.
    fn set(&mut self, key: &LocationKey, expires_at: i64) -> Result<(), StoreError>;

    fn mark_resume_sent(&mut self, key: &LocationKey) -> Result<(), StoreError>;

    /// Remove the record (expiry and flag together).
    fn clear(&mut self, key: &LocationKey) -> Result<(), StoreError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Read the record for `key`, treating an unreachable store as "no
    /// record" so the monitor fails open into normal operation.
    fn get(&mut self, key: &LocationKey) -> Option<SnoozeRecord> {
        match self.load(key) {
            Ok(record) => record,
            Err(e) => {
                warn!(backend = self.backend(), key = %key, error = %e,
                    "snooze store read failed, treating location as active");
                None
            }
        }
    }
}

/// Pick the store for this run from configuration: Postgres when a
/// database URL is configured, else the JSON state file, else none.
///
/// Nothing is connected here; the Postgres store connects on first use and
/// releases the connection when dropped at the end of the run.
pub fn open_store(config: &MonitorConfig) -> Option<Box<dyn SnoozeStore>> {
    if let Some(url) = &config.snooze.database_url {
        debug!("using postgres snooze store");
        return Some(Box::new(PostgresSnoozeStore::new(url.clone())));
    }
    if let Some(path) = &config.snooze.state_file {
        debug!(path = %path, "using file snooze store");
        return Some(Box::new(FileSnoozeStore::new(path)));
    }
    info!("no snooze store configured, alerts will not be snoozed");
    None
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Snooze status of one location at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SnoozeStatus {
    Active,
    Snoozed {
        expires_at: i64,
    },
    Expiring {
        expires_at: i64,
        resume_notice_sent: bool,
    },
}

/// What `resolve_expiry` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ResumeNotice {
    /// Location was not expiring; nothing to do.
    NotDue,
    /// Notice delivered this run. `cleared` is false if the record could
    /// not be removed and will be seen again next run.
    Sent { cleared: bool },
    /// Notice was delivered by an earlier run; only the clear remained.
    AlreadySent { cleared: bool },
    /// Delivery failed. Record left untouched so the next run retries.
    DeliveryFailed { error: String },
}

/// Applies snooze transitions for a single location against a store.
pub struct SnoozeController<'a> {
    store: &'a mut dyn SnoozeStore,
    key: LocationKey,
}

impl<'a> SnoozeController<'a> {
    pub fn new(store: &'a mut dyn SnoozeStore, key: LocationKey) -> Self {
        Self { store, key }
    }

    pub fn status(&mut self, now: DateTime<Utc>) -> SnoozeStatus {
        let now = now.timestamp();
        match self.store.get(&self.key) {
            Some(SnoozeRecord {
                expires_at: Some(expires_at),
                ..
            }) if expires_at > now => SnoozeStatus::Snoozed { expires_at },
            Some(SnoozeRecord {
                expires_at: Some(expires_at),
                resume_notice_sent,
            }) => SnoozeStatus::Expiring {
                expires_at,
                resume_notice_sent,
            },
            _ => SnoozeStatus::Active,
        }
    }

    /// Resolve a lapsed snooze: deliver the resume notice through
    /// `send_notice` unless an earlier run already did, flag it, then clear
    /// the record.
    ///
    /// The notice is sent before it is flagged. A crash in between repeats
    /// the notice next run; it is never silently dropped.
    pub fn resolve_expiry<F>(&mut self, now: DateTime<Utc>, send_notice: F) -> ResumeNotice
    where
        F: FnOnce() -> Result<(), NotifyError>,
    {
        let already_sent = match self.status(now) {
            SnoozeStatus::Expiring {
                resume_notice_sent, ..
            } => resume_notice_sent,
            _ => return ResumeNotice::NotDue,
        };

        if !already_sent {
            if let Err(e) = send_notice() {
                warn!(key = %self.key, error = %e, "resume notice not delivered, will retry next run");
                return ResumeNotice::DeliveryFailed {
                    error: e.to_string(),
                };
            }
            info!(key = %self.key, "resume notice delivered");
            if let Err(e) = self.store.mark_resume_sent(&self.key) {
                warn!(key = %self.key, error = %e, "could not flag resume notice as sent");
            }
        }

        let cleared = match self.clear() {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.key, error = %e, "could not clear expired snooze");
                false
            }
        };

        if already_sent {
            ResumeNotice::AlreadySent { cleared }
        } else {
            ResumeNotice::Sent { cleared }
        }
    }

    /// Start (or restart) the cooldown for `tier`. Returns the new expiry.
    pub fn apply_snooze(&mut self, tier: &SnoozeTier, now: DateTime<Utc>) -> Result<i64, StoreError> {
        let expires_at = now.timestamp() + tier.duration_secs();
        self.store.set(&self.key, expires_at)?;
        info!(key = %self.key, tier = %tier.level, weeks = tier.weeks, expires_at,
            "snooze applied");
        Ok(expires_at)
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.clear(&self.key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
