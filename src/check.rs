/// One monitoring run, end to end.
///
/// ```text
/// status ── Snoozed ──────────────────────────────► skip (no fetch)
///   │
///   ├─ Expiring ─► resolve_expiry (resume notice, clear) ─┐
///   │                                                     │
///   └─ Active ────────────────────────────────────────────┤
///                                                         ▼
///                     fetch_total ─► evaluate ─► [alert] send ─► [sent + tier + store] apply_snooze
/// ```
///
/// The run never returns an error. Every degraded step (unreachable store,
/// missing weather data, failed delivery, failed snooze write) is reported
/// in the `CheckResult` instead.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::alert::{evaluate, messages};
use crate::config::MonitorConfig;
use crate::ingest::WeatherSource;
use crate::model::{LocationKey, SnoozeTier, Window};
use crate::notify::Notifier;
use crate::snooze::{ResumeNotice, SnoozeController, SnoozeStatus, SnoozeStore};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Structured output of one run. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub location: String,
    pub location_key: LocationKey,
    pub checked_at: DateTime<Utc>,
    /// Set when the run found a lapsed snooze and handled it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_notice: Option<ResumeNotice>,
    pub outcome: CheckOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Location is snoozed; precipitation was not looked at.
    Snoozed { expires_at: i64 },
    /// The weather source had no usable total. Nothing was sent or written.
    /// `window` is absent when no valid date range could be formed.
    DataUnavailable {
        window: Option<Window>,
        reason: String,
    },
    Evaluated {
        window: Window,
        total_inches: f64,
        threshold_inches: f64,
        alert: AlertOutcome,
        tier: Option<SnoozeTier>,
        snooze: SnoozeOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AlertOutcome {
    NotTriggered,
    Sent,
    DeliveryFailed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SnoozeOutcome {
    /// No alert was confirmed, so there was nothing to snooze.
    NotApplicable,
    NoStore,
    NoTier,
    Applied { weeks: u32, expires_at: i64 },
    /// The alert went out but the cooldown could not be recorded.
    WriteFailed { error: String },
}

impl CheckResult {
    /// True if an alert was delivered this run.
    pub fn alert_fired(&self) -> bool {
        matches!(
            self.outcome,
            CheckOutcome::Evaluated {
                alert: AlertOutcome::Sent,
                ..
            }
        )
    }

    /// Expiry of the snooze written this run, if any.
    pub fn snooze_applied(&self) -> Option<i64> {
        match &self.outcome {
            CheckOutcome::Evaluated {
                snooze: SnoozeOutcome::Applied { expires_at, .. },
                ..
            } => Some(*expires_at),
            _ => None,
        }
    }

    pub fn total_inches(&self) -> Option<f64> {
        match &self.outcome {
            CheckOutcome::Evaluated { total_inches, .. } => Some(*total_inches),
            _ => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Snoozed { .. })
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Wires the collaborators for one run. Build it, optionally attach a
/// store, call `run` once.
pub struct CheckRun<'a> {
    config: &'a MonitorConfig,
    weather: &'a dyn WeatherSource,
    notifier: &'a dyn Notifier,
    store: Option<&'a mut dyn SnoozeStore>,
}

impl<'a> CheckRun<'a> {
    pub fn new(
        config: &'a MonitorConfig,
        weather: &'a dyn WeatherSource,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            config,
            weather,
            notifier,
            store: None,
        }
    }

    /// Without a store every run is a fresh evaluation and alerts are never
    /// snoozed.
    pub fn with_store(mut self, store: &'a mut dyn SnoozeStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn run(&mut self, now: DateTime<Utc>) -> CheckResult {
        let config = self.config;
        let notifier = self.notifier;
        let key = config.location_key();
        let recipient = config.notify.recipient.as_str();
        let mut resume_notice = None;

        if let Some(store) = self.store.as_deref_mut() {
            let mut snooze = SnoozeController::new(store, key.clone());
            match snooze.status(now) {
                SnoozeStatus::Snoozed { expires_at } => {
                    info!(key = %key, expires_at, "location snoozed, skipping evaluation");
                    return finish(config, key, now, None, CheckOutcome::Snoozed { expires_at });
                }
                SnoozeStatus::Expiring { expires_at, .. } => {
                    debug!(key = %key, expires_at, "snooze lapsed, resolving");
                    let outcome = snooze.resolve_expiry(now, || {
                        notifier.send(&messages::resume_notice(config, expires_at), recipient)
                    });
                    resume_notice = Some(outcome);
                }
                SnoozeStatus::Active => {}
            }
        }

        let Some(window) = Window::trailing(now, config.alert.window_days) else {
            warn!(key = %key, window_days = config.alert.window_days, "window start out of range, no evaluation");
            let outcome = CheckOutcome::DataUnavailable {
                window: None,
                reason: format!("no valid {}-day window ending {}", config.alert.window_days, now.date_naive()),
            };
            return finish(config, key, now, resume_notice, outcome);
        };
        let total_inches = match self.weather.fetch_total(
            config.location.latitude,
            config.location.longitude,
            window.start,
            window.end,
        ) {
            Ok(total) => total,
            Err(e) => {
                warn!(key = %key, window = %window, error = %e, "precipitation unavailable, no evaluation");
                let outcome = CheckOutcome::DataUnavailable {
                    window: Some(window),
                    reason: e.to_string(),
                };
                return finish(config, key, now, resume_notice, outcome);
            }
        };

        let threshold_inches = config.alert.threshold_inches;
        let evaluation = evaluate(total_inches, threshold_inches, &config.tier_table());
        info!(
            key = %key,
            total_inches,
            threshold_inches,
            alert = evaluation.alert,
            tier = ?evaluation.tier.map(|t| t.level),
            "precipitation evaluated"
        );

        let (alert, snooze) = if !evaluation.alert {
            (AlertOutcome::NotTriggered, SnoozeOutcome::NotApplicable)
        } else {
            let message = messages::rain_alert(
                config,
                total_inches,
                &window,
                &evaluation,
                self.store.is_some(),
            );
            match notifier.send(&message, recipient) {
                Err(e) => {
                    error!(key = %key, channel = notifier.channel_name(), error = %e,
                        "rain alert not delivered, snooze not applied");
                    (
                        AlertOutcome::DeliveryFailed {
                            error: e.to_string(),
                        },
                        SnoozeOutcome::NotApplicable,
                    )
                }
                Ok(()) => {
                    info!(key = %key, channel = notifier.channel_name(), "rain alert sent");
                    let snooze = match (self.store.as_deref_mut(), evaluation.tier) {
                        (None, _) => SnoozeOutcome::NoStore,
                        (Some(_), None) => SnoozeOutcome::NoTier,
                        (Some(store), Some(tier)) => {
                            match SnoozeController::new(store, key.clone()).apply_snooze(&tier, now) {
                                Ok(expires_at) => SnoozeOutcome::Applied {
                                    weeks: tier.weeks,
                                    expires_at,
                                },
                                Err(e) => {
                                    warn!(key = %key, error = %e, "alert sent but snooze not recorded");
                                    SnoozeOutcome::WriteFailed {
                                        error: e.to_string(),
                                    }
                                }
                            }
                        }
                    };
                    (AlertOutcome::Sent, snooze)
                }
            }
        };

        let outcome = CheckOutcome::Evaluated {
            window,
            total_inches,
            threshold_inches,
            alert,
            tier: evaluation.tier,
            snooze,
        };
        finish(config, key, now, resume_notice, outcome)
    }
}

fn finish(
    config: &MonitorConfig,
    location_key: LocationKey,
    now: DateTime<Utc>,
    resume_notice: Option<ResumeNotice>,
    outcome: CheckOutcome,
) -> CheckResult {
    CheckResult {
        location: config.location.name.clone(),
        location_key,
        checked_at: now,
        resume_notice,
        outcome,
    }
}

// ---------------------------------------------------------------------------
// Status query
// ---------------------------------------------------------------------------

/// Read-only view of the snooze state, for `rainmon status` and `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub location: String,
    pub location_key: LocationKey,
    pub checked_at: DateTime<Utc>,
    pub store: &'static str,
    pub snooze: SnoozeStatus,
}

pub fn status_report(
    config: &MonitorConfig,
    store: &mut dyn SnoozeStore,
    now: DateTime<Utc>,
) -> StatusReport {
    let backend = store.backend();
    let key = config.location_key();
    let snooze = SnoozeController::new(store, key.clone()).status(now);
    StatusReport {
        location: config.location.name.clone(),
        location_key: key,
        checked_at: now,
        store: backend,
        snooze,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NotifyError, WeatherError};
    use crate::notify::Notification;
    use crate::snooze::MemorySnoozeStore;
    use chrono::{NaiveDate, TimeZone};
    use std::cell::RefCell;

    struct FixedTotal(f64);

    impl WeatherSource for FixedTotal {
        fn fetch_total(&self, _: f64, _: f64, _: NaiveDate, _: NaiveDate) -> Result<f64, WeatherError> {
            Ok(self.0)
        }
    }

    #[derive(Default)]
    struct Outbox(RefCell<Vec<Notification>>);

    impl Notifier for Outbox {
        fn send(&self, notification: &Notification, _: &str) -> Result<(), NotifyError> {
            self.0.borrow_mut().push(notification.clone());
            Ok(())
        }

        fn channel_name(&self) -> &str {
            "outbox"
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_run_without_store_alerts_but_never_snoozes() {
        let config = MonitorConfig::default();
        let outbox = Outbox::default();
        let result = CheckRun::new(&config, &FixedTotal(1.2), &outbox).run(now());

        assert!(result.alert_fired());
        assert_eq!(result.snooze_applied(), None);
        assert!(matches!(
            result.outcome,
            CheckOutcome::Evaluated {
                snooze: SnoozeOutcome::NoStore,
                ..
            }
        ));
        assert_eq!(outbox.0.borrow().len(), 1);
    }

    #[test]
    fn test_result_serializes_with_tagged_outcome() {
        let config = MonitorConfig::default();
        let outbox = Outbox::default();
        let mut store = MemorySnoozeStore::new();
        let result = CheckRun::new(&config, &FixedTotal(0.7), &outbox)
            .with_store(&mut store)
            .run(now());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"]["status"], "evaluated");
        assert_eq!(json["outcome"]["alert"]["result"], "sent");
        assert_eq!(json["outcome"]["snooze"]["result"], "applied");
        assert_eq!(json["outcome"]["snooze"]["weeks"], 2);
        assert_eq!(json["outcome"]["tier"]["level"], "medium");
        assert_eq!(json["outcome"]["window"]["start"], "2025-05-25");
        assert!(json.get("resume_notice").is_none());
    }

    #[test]
    fn test_unrepresentable_window_reports_data_unavailable() {
        // Bypasses validate(), as a caller building MonitorConfig by hand could.
        let mut config = MonitorConfig::default();
        config.alert.window_days = 200_000_000;
        let outbox = Outbox::default();
        let mut store = MemorySnoozeStore::new();

        let result = CheckRun::new(&config, &FixedTotal(5.0), &outbox)
            .with_store(&mut store)
            .run(now());

        assert!(matches!(
            result.outcome,
            CheckOutcome::DataUnavailable { window: None, .. }
        ));
        assert!(outbox.0.borrow().is_empty());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_status_report_reflects_store() {
        let config = MonitorConfig::default();
        let mut store = MemorySnoozeStore::new();
        let report = status_report(&config, &mut store, now());
        assert_eq!(report.store, "memory");
        assert_eq!(report.snooze, SnoozeStatus::Active);
        assert_eq!(report.location_key, config.location_key());
    }
}
