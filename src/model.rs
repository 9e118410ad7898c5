/// Shared data types for the rainfall monitor.
///
/// Everything here is plain data: the location key used to namespace
/// persisted state, the persisted snooze record, the tier bands that map a
/// rainfall total to a cooldown, and the error types raised at the
/// boundaries with external collaborators.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Seconds in one week. Snooze durations are configured in whole weeks.
pub const SECONDS_PER_WEEK: i64 = 7 * 24 * 3600;

/// Coordinates are rounded to this many ten-thousandths of a degree
/// (4 decimal places) before a key is derived from them.
const KEY_SCALE: f64 = 10_000.0;

// ---------------------------------------------------------------------------
// LocationKey
// ---------------------------------------------------------------------------

/// Stable identifier for a monitored location, derived from its coordinates.
///
/// Coordinates are rounded to 4 decimal degrees (roughly 11 m), so two
/// configurations that agree at that precision share persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationKey(String);

impl LocationKey {
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        // Rounding through integers also normalises -0.0 to 0.
        let lat = (latitude * KEY_SCALE).round() as i64;
        let lon = (longitude * KEY_SCALE).round() as i64;
        LocationKey(format!(
            "{:.4}_{:.4}",
            lat as f64 / KEY_SCALE,
            lon as f64 / KEY_SCALE
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Snooze state
// ---------------------------------------------------------------------------

/// Persisted snooze state for one location.
///
/// A record without `expires_at` is treated the same as no record at all.
/// `resume_notice_sent` only means something while the record exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnoozeRecord {
    /// Epoch seconds at which the snooze lapses.
    pub expires_at: Option<i64>,
    pub resume_notice_sent: bool,
}

/// Which band of the tier table matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierLevel {
    Medium,
    High,
}

impl fmt::Display for TierLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierLevel::Medium => f.write_str("medium"),
            TierLevel::High => f.write_str("high"),
        }
    }
}

/// A rainfall band and the snooze it earns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnoozeTier {
    pub level: TierLevel,
    pub min_inches: f64,
    /// `None` means the band is unbounded above.
    pub max_inches: Option<f64>,
    pub weeks: u32,
}

impl SnoozeTier {
    /// True if `total_inches` lies inside the band, both ends inclusive.
    pub fn contains(&self, total_inches: f64) -> bool {
        total_inches >= self.min_inches
            && self.max_inches.map_or(true, |max| total_inches <= max)
    }

    pub fn duration_secs(&self) -> i64 {
        i64::from(self.weeks) * SECONDS_PER_WEEK
    }
}

/// The two configured bands. High is always consulted before medium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    pub medium: SnoozeTier,
    pub high: SnoozeTier,
}

impl Default for TierTable {
    fn default() -> Self {
        TierTable {
            medium: SnoozeTier {
                level: TierLevel::Medium,
                min_inches: 0.5,
                max_inches: Some(1.0),
                weeks: 2,
            },
            high: SnoozeTier {
                level: TierLevel::High,
                min_inches: 1.0,
                max_inches: None,
                weeks: 3,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Query window
// ---------------------------------------------------------------------------

/// Inclusive range of UTC days summed for one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// The window ending on the UTC day of `now`, starting `days` earlier.
    /// `None` if the start would fall outside the calendar chrono supports.
    pub fn trailing(now: DateTime<Utc>, days: u32) -> Option<Self> {
        let end = now.date_naive();
        let start = end.checked_sub_signed(Duration::days(i64::from(days)))?;
        Some(Window { start, end })
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// Failure talking to the snooze store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("snooze store unavailable: {0}")]
    Unavailable(String),

    #[error("snooze store query failed: {0}")]
    Query(#[from] postgres::Error),

    #[error("snooze state file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snooze state is corrupt: {0}")]
    Corrupt(String),
}

/// Failure obtaining a precipitation total.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("weather API returned HTTP {0}")]
    Status(u16),

    #[error("weather API response could not be parsed: {0}")]
    Parse(String),

    #[error("no precipitation data for {0}")]
    DataUnavailable(String),

    #[error("expected precipitation in inches, got '{0}'")]
    UnexpectedUnit(String),
}

/// Failure delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid mail address: {0}")]
    Address(String),

    #[error("could not build message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("notifier configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_key_rounds_to_four_places() {
        let a = LocationKey::from_coordinates(40.693_94, -89.589_81);
        let b = LocationKey::from_coordinates(40.693_9, -89.589_8);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "40.6939_-89.5898");
    }

    #[test]
    fn test_location_key_distinguishes_fifth_place_carry() {
        let a = LocationKey::from_coordinates(40.693_96, -89.5898);
        assert_eq!(a.as_str(), "40.6940_-89.5898");
    }

    #[test]
    fn test_location_key_normalises_negative_zero() {
        let key = LocationKey::from_coordinates(-0.000_01, 0.0);
        assert_eq!(key.as_str(), "0.0000_0.0000");
    }

    #[test]
    fn test_tier_contains_is_inclusive() {
        let tiers = TierTable::default();
        assert!(tiers.medium.contains(0.5));
        assert!(tiers.medium.contains(1.0));
        assert!(!tiers.medium.contains(1.01));
        assert!(tiers.high.contains(1.0));
        assert!(tiers.high.contains(250.0));
        assert!(!tiers.high.contains(0.99));
    }

    #[test]
    fn test_trailing_window_ends_on_utc_day() {
        use chrono::TimeZone;
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 0).unwrap();
        let window = Window::trailing(now, 7).unwrap();
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2025, 5, 25).unwrap());
        assert_eq!(window.to_string(), "2025-05-25 to 2025-06-01");
    }

    #[test]
    fn test_trailing_window_out_of_calendar_is_none() {
        use chrono::TimeZone;
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(Window::trailing(now, 200_000_000), None);
    }

    #[test]
    fn test_tier_duration() {
        let tiers = TierTable::default();
        assert_eq!(tiers.medium.duration_secs(), 2 * 604_800);
        assert_eq!(tiers.high.duration_secs(), 3 * 604_800);
    }
}
