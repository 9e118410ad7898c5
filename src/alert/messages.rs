/// Subject and body text for the two messages the monitor sends.

use chrono::{DateTime, Utc};

use crate::alert::Evaluation;
use crate::config::MonitorConfig;
use crate::model::Window;
use crate::notify::Notification;

/// Rain alert. `snooze_enabled` says whether a matched tier will actually
/// be persisted, so the text does not promise a quiet period that will not
/// happen.
pub fn rain_alert(
    config: &MonitorConfig,
    total_inches: f64,
    window: &Window,
    evaluation: &Evaluation,
    snooze_enabled: bool,
) -> Notification {
    let subject = format!(
        "{} {:.2} in of rain at {} since {}",
        config.notify.subject_prefix, total_inches, config.location.name, window.start
    );

    let mut body = format!(
        "Rain monitor alert for {name} ({lat:.4}, {lon:.4}).\n\n\
         Total precipitation {window}: {total:.2} in\n\
         Alert threshold: {threshold:.2} in\n",
        name = config.location.name,
        lat = config.location.latitude,
        lon = config.location.longitude,
        window = window,
        total = total_inches,
        threshold = config.alert.threshold_inches,
    );

    match (evaluation.tier, snooze_enabled) {
        (Some(tier), true) => body.push_str(&format!(
            "\nFurther alerts are snoozed for {} weeks ({} rainfall band).\n",
            tier.weeks, tier.level
        )),
        (Some(_), false) => {
            body.push_str("\nNo snooze store is configured; the next run will check again.\n")
        }
        (None, _) => body.push_str(
            "\nThis total is outside the configured snooze bands; the next run will check again.\n",
        ),
    }

    Notification { subject, body }
}

/// Notice that a snooze has lapsed and normal checks resume.
pub fn resume_notice(config: &MonitorConfig, expired_at: i64) -> Notification {
    let expired = DateTime::<Utc>::from_timestamp(expired_at, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| expired_at.to_string());

    Notification {
        subject: format!(
            "{} Rain monitoring resumed for {}",
            config.notify.subject_prefix, config.location.name
        ),
        body: format!(
            "The rain alert snooze for {} ended at {}.\n\
             Normal monitoring has resumed; you will be alerted again if \
             precipitation over {} days exceeds {:.2} in.\n",
            config.location.name, expired, config.alert.window_days, config.alert.threshold_inches
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::evaluate;
    use chrono::NaiveDate;

    fn window() -> Window {
        Window {
            start: NaiveDate::from_ymd_opt(2025, 5, 25).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    #[test]
    fn test_alert_mentions_total_and_snooze_weeks() {
        let config = MonitorConfig::default();
        let e = evaluate(1.5, 0.5, &config.tier_table());
        let note = rain_alert(&config, 1.5, &window(), &e, true);

        assert!(note.subject.starts_with("[rainmon] 1.50 in"));
        assert!(note.subject.ends_with("since 2025-05-25"));
        assert!(note.body.contains("2025-05-25 to 2025-06-01"));
        assert!(note.body.contains("snoozed for 3 weeks"));
        assert!(note.body.contains("high"));
    }

    #[test]
    fn test_alert_without_store_does_not_promise_snooze() {
        let config = MonitorConfig::default();
        let e = evaluate(0.7, 0.5, &config.tier_table());
        let note = rain_alert(&config, 0.7, &window(), &e, false);
        assert!(!note.body.contains("snoozed for"));
    }

    #[test]
    fn test_resume_notice_formats_expiry() {
        let config = MonitorConfig::default();
        let note = resume_notice(&config, 1_748_779_200);
        assert!(note.subject.contains("resumed"));
        assert!(note.body.contains("2025-06-01 12:00 UTC"));
    }
}
