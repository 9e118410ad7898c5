/// Monitor configuration loader - parses rainmon.toml
///
/// Keeps the monitored location, alert threshold and snooze tier bands out
/// of code so they can be adjusted without recompiling. The file is
/// optional: every field has a default, and a handful of environment
/// variables override the file after it is read. The result is an
/// immutable `MonitorConfig` built once per run and handed to every
/// component.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::model::{LocationKey, SnoozeTier, TierLevel, TierTable};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "rainmon.toml";

/// Longest look-back the Open-Meteo forecast endpoint serves (`past_days`).
pub const MAX_WINDOW_DAYS: u32 = 92;

/// Configuration loading or validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("environment variable {var} has invalid value '{value}'")]
    Override { var: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Configuration sections
// ---------------------------------------------------------------------------

/// Root configuration, one section per concern.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub location: LocationConfig,
    pub alert: AlertConfig,
    pub tiers: TierConfig,
    pub notify: NotifyConfig,
    pub weather: WeatherConfig,
    pub snooze: SnoozeConfig,
}

/// The single monitored location
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            name: "Peoria, IL".to_string(),
            latitude: 40.6936,
            longitude: -89.5890,
        }
    }
}

/// Alert threshold and look-back window
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    /// Alert fires when the window total is strictly above this.
    pub threshold_inches: f64,
    /// Length of the trailing precipitation window in days.
    pub window_days: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold_inches: 0.5,
            window_days: 7,
        }
    }
}

/// Snooze tier bands, flattened for readable TOML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TierConfig {
    pub medium_min_inches: f64,
    pub medium_max_inches: f64,
    pub medium_weeks: u32,
    pub high_min_inches: f64,
    pub high_weeks: u32,
}

impl Default for TierConfig {
    fn default() -> Self {
        let defaults = TierTable::default();
        Self {
            medium_min_inches: defaults.medium.min_inches,
            medium_max_inches: defaults.medium.max_inches.unwrap_or(1.0),
            medium_weeks: defaults.medium.weeks,
            high_min_inches: defaults.high.min_inches,
            high_weeks: defaults.high.weeks,
        }
    }
}

/// Alert delivery settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotifyConfig {
    /// Who receives alerts and resume notices. Empty means unset.
    pub recipient: String,
    pub from: String,
    pub smtp_host: String,
    pub smtp_port: Option<u16>,
    /// STARTTLS (or implicit TLS on port 465). Disable only for local relays.
    pub smtp_tls: bool,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub subject_prefix: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            from: "Rain Monitor <rainmon@localhost>".to_string(),
            smtp_host: String::new(),
            smtp_port: None,
            smtp_tls: true,
            smtp_username: None,
            smtp_password: None,
            subject_prefix: "[rainmon]".to_string(),
        }
    }
}

/// Weather API settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Snooze persistence settings. A database URL (normally from
/// `DATABASE_URL`) selects the Postgres store; otherwise `state_file`
/// selects the JSON file store; with neither, alerts are never snoozed.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnoozeConfig {
    pub database_url: Option<String>,
    pub state_file: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl MonitorConfig {
    /// Load configuration from `path` (or the default file if it exists),
    /// apply process environment overrides, then validate.
    ///
    /// An explicitly named file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };

        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply `RAINMON_*` / `SMTP_*` overrides using `lookup` to read each
    /// variable. Unset variables leave the file value alone.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RAINMON_LOCATION_NAME") {
            self.location.name = v;
        }
        override_parsed(&lookup, "RAINMON_LATITUDE", &mut self.location.latitude)?;
        override_parsed(&lookup, "RAINMON_LONGITUDE", &mut self.location.longitude)?;
        override_parsed(&lookup, "RAINMON_THRESHOLD_INCHES", &mut self.alert.threshold_inches)?;
        override_parsed(&lookup, "RAINMON_WINDOW_DAYS", &mut self.alert.window_days)?;
        override_parsed(&lookup, "RAINMON_MEDIUM_MIN_INCHES", &mut self.tiers.medium_min_inches)?;
        override_parsed(&lookup, "RAINMON_MEDIUM_MAX_INCHES", &mut self.tiers.medium_max_inches)?;
        override_parsed(&lookup, "RAINMON_MEDIUM_WEEKS", &mut self.tiers.medium_weeks)?;
        override_parsed(&lookup, "RAINMON_HIGH_MIN_INCHES", &mut self.tiers.high_min_inches)?;
        override_parsed(&lookup, "RAINMON_HIGH_WEEKS", &mut self.tiers.high_weeks)?;
        if let Some(v) = lookup("RAINMON_RECIPIENT") {
            self.notify.recipient = v;
        }
        if let Some(v) = lookup("RAINMON_FROM") {
            self.notify.from = v;
        }
        if let Some(v) = lookup("SMTP_HOST") {
            self.notify.smtp_host = v;
        }
        if let Some(v) = lookup("SMTP_PORT") {
            let port = v.parse().map_err(|_| ConfigError::Override {
                var: "SMTP_PORT".to_string(),
                value: v.clone(),
            })?;
            self.notify.smtp_port = Some(port);
        }
        if let Some(v) = lookup("SMTP_USERNAME") {
            self.notify.smtp_username = Some(v);
        }
        if let Some(v) = lookup("SMTP_PASSWORD") {
            self.notify.smtp_password = Some(v);
        }
        override_parsed(&lookup, "SMTP_TLS", &mut self.notify.smtp_tls)?;
        if let Some(v) = lookup("RAINMON_WEATHER_URL") {
            self.weather.base_url = v;
        }
        if let Some(v) = lookup("RAINMON_STATE_FILE") {
            self.snooze.state_file = Some(v);
        }
        if let Some(v) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.snooze.database_url = Some(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let loc = &self.location;
        if !(-90.0..=90.0).contains(&loc.latitude) {
            return Err(ConfigError::Invalid(format!(
                "latitude {} out of range",
                loc.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&loc.longitude) {
            return Err(ConfigError::Invalid(format!(
                "longitude {} out of range",
                loc.longitude
            )));
        }
        if !self.alert.threshold_inches.is_finite() || self.alert.threshold_inches < 0.0 {
            return Err(ConfigError::Invalid(
                "threshold_inches must be a non-negative number".to_string(),
            ));
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.alert.window_days) {
            return Err(ConfigError::Invalid(format!(
                "window_days must be between 1 and {}, got {}",
                MAX_WINDOW_DAYS, self.alert.window_days
            )));
        }

        let t = &self.tiers;
        let bounds = [t.medium_min_inches, t.medium_max_inches, t.high_min_inches];
        if bounds.iter().any(|b| !b.is_finite() || *b < 0.0) {
            return Err(ConfigError::Invalid(
                "tier bounds must be non-negative numbers".to_string(),
            ));
        }
        if t.medium_min_inches > t.medium_max_inches {
            return Err(ConfigError::Invalid(format!(
                "medium tier is empty: min {} > max {}",
                t.medium_min_inches, t.medium_max_inches
            )));
        }
        if t.medium_weeks == 0 || t.high_weeks == 0 {
            return Err(ConfigError::Invalid("tier weeks must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn location_key(&self) -> LocationKey {
        LocationKey::from_coordinates(self.location.latitude, self.location.longitude)
    }

    /// Converts the flattened `[tiers]` section into the evaluator's table.
    pub fn tier_table(&self) -> TierTable {
        TierTable {
            medium: SnoozeTier {
                level: TierLevel::Medium,
                min_inches: self.tiers.medium_min_inches,
                max_inches: Some(self.tiers.medium_max_inches),
                weeks: self.tiers.medium_weeks,
            },
            high: SnoozeTier {
                level: TierLevel::High,
                min_inches: self.tiers.high_min_inches,
                max_inches: None,
                weeks: self.tiers.high_weeks,
            },
        }
    }
}

fn override_parsed<F, T>(lookup: &F, var: &str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(value) = lookup(var) {
        *target = value.trim().parse().map_err(|_| ConfigError::Override {
            var: var.to_string(),
            value: value.clone(),
        })?;
    }
    Ok(())
}
