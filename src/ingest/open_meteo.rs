/// Open-Meteo daily precipitation client.
///
/// Sums `precipitation_sum` over an inclusive day range for one grid point,
/// asking the API for inches so no unit conversion happens here.
///
/// API Documentation: https://open-meteo.com/en/docs
/// Example:
///   https://api.open-meteo.com/v1/forecast?latitude=40.69&longitude=-89.59
///     &start_date=2025-05-25&end_date=2025-06-01
///     &daily=precipitation_sum&precipitation_unit=inch&timezone=UTC

use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::WeatherSource;
use crate::config::WeatherConfig;
use crate::model::WeatherError;

const EXPECTED_UNIT: &str = "inch";

// ---------------------------------------------------------------------------
// Response structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily_units: Option<DailyUnits>,
    daily: Option<Daily>,
}

#[derive(Debug, Deserialize)]
struct DailyUnits {
    precipitation_sum: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Daily {
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    reason: String,
}

// ---------------------------------------------------------------------------
// URL construction and parsing
// ---------------------------------------------------------------------------

/// Build the daily precipitation request URL.
pub fn build_daily_url(
    base_url: &str,
    latitude: f64,
    longitude: f64,
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    format!(
        "{}/v1/forecast?latitude={:.4}&longitude={:.4}&start_date={}&end_date={}\
         &daily=precipitation_sum&precipitation_unit={}&timezone=UTC",
        base_url.trim_end_matches('/'),
        latitude,
        longitude,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
        EXPECTED_UNIT,
    )
}

/// Sum the daily precipitation values in a forecast response.
///
/// Null days are skipped. If no day has a value the range is reported as
/// unavailable rather than as zero rain.
pub fn parse_daily_total(json: &str) -> Result<f64, WeatherError> {
    let response: ForecastResponse =
        serde_json::from_str(json).map_err(|e| WeatherError::Parse(e.to_string()))?;

    let unit = response
        .daily_units
        .and_then(|u| u.precipitation_sum)
        .unwrap_or_default();
    if unit != EXPECTED_UNIT {
        return Err(WeatherError::UnexpectedUnit(unit));
    }

    let values: Vec<f64> = response
        .daily
        .map(|d| d.precipitation_sum)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();

    if values.is_empty() {
        return Err(WeatherError::DataUnavailable(
            "response contained no daily precipitation values".to_string(),
        ));
    }

    Ok(values.iter().sum())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking Open-Meteo client. One request per `fetch_total`, no retries.
pub struct OpenMeteoSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl OpenMeteoSource {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("rainmon_service/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

impl WeatherSource for OpenMeteoSource {
    fn fetch_total(
        &self,
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64, WeatherError> {
        let url = build_daily_url(&self.base_url, latitude, longitude, start, end);
        debug!(url = %url, "fetching precipitation");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<ErrorResponse>(&body) {
                debug!(reason = %err.reason, "Open-Meteo rejected request");
            }
            return Err(WeatherError::Status(status.as_u16()));
        }

        parse_daily_total(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
