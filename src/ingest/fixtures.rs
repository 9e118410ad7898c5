/// Test fixtures: representative JSON payloads from the Open-Meteo
/// forecast API with `daily=precipitation_sum&precipitation_unit=inch`.
///
/// Response shape:
///   daily_units.precipitation_sum - "inch" (or "mm" if the unit was not requested)
///   daily.time[]                  - ISO dates, one per day in the range
///   daily.precipitation_sum[]     - daily totals, `null` where no data exists
///
/// Trimmed to the fields the parser reads plus enough envelope to look real.

/// Eight days (start through end inclusive) with a wet middle: 0.74 in total.
pub(crate) fn fixture_wet_week_json() -> &'static str {
    r#"{
      "latitude": 40.69,
      "longitude": -89.59,
      "generationtime_ms": 0.08,
      "utc_offset_seconds": 0,
      "timezone": "UTC",
      "timezone_abbreviation": "UTC",
      "elevation": 160.0,
      "daily_units": { "time": "iso8601", "precipitation_sum": "inch" },
      "daily": {
        "time": ["2025-05-25", "2025-05-26", "2025-05-27", "2025-05-28",
                 "2025-05-29", "2025-05-30", "2025-05-31", "2025-06-01"],
        "precipitation_sum": [0.0, 0.12, 0.40, 0.22, 0.0, 0.0, 0.0, 0.0]
      }
    }"#
}

/// Trailing days not yet reported come back as null; they are skipped.
pub(crate) fn fixture_partial_nulls_json() -> &'static str {
    r#"{
      "daily_units": { "time": "iso8601", "precipitation_sum": "inch" },
      "daily": {
        "time": ["2025-05-30", "2025-05-31", "2025-06-01"],
        "precipitation_sum": [0.25, 0.30, null]
      }
    }"#
}

/// Every day null: the grid point has no data for the range.
pub(crate) fn fixture_all_null_json() -> &'static str {
    r#"{
      "daily_units": { "time": "iso8601", "precipitation_sum": "inch" },
      "daily": {
        "time": ["2025-05-31", "2025-06-01"],
        "precipitation_sum": [null, null]
      }
    }"#
}

/// Unit parameter ignored upstream: values are millimetres.
pub(crate) fn fixture_millimetre_json() -> &'static str {
    r#"{
      "daily_units": { "time": "iso8601", "precipitation_sum": "mm" },
      "daily": {
        "time": ["2025-06-01"],
        "precipitation_sum": [12.7]
      }
    }"#
}

/// Error envelope returned with HTTP 400 for bad parameters.
pub(crate) fn fixture_error_json() -> &'static str {
    r#"{ "error": true, "reason": "Parameter 'start_date' is out of allowed range" }"#
}
