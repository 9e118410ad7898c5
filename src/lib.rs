/// rainmon_service: rainfall alert monitor with tiered snoozing.
///
/// # Module structure
///
/// ```text
/// rainmon_service
/// ├── model       — shared data types (LocationKey, SnoozeRecord, SnoozeTier, Window, errors)
/// ├── config      — monitor configuration loader (rainmon.toml + environment overrides)
/// ├── db          — PostgreSQL connection and schema helpers
/// ├── snooze      — snooze state machine and its stores
/// │   ├── postgres — shared state in rainmon.snooze_state
/// │   ├── file     — JSON state file for single-host installs
/// │   └── memory   — in-process store for tests
/// ├── ingest
/// │   ├── open_meteo — Open-Meteo daily precipitation client
/// │   └── fixtures (test only) — representative API response payloads
/// ├── alert
/// │   ├── precipitation — threshold check and tier selection
/// │   └── messages      — alert and resume notice text
/// ├── notify      — notifier trait, SMTP and dry-run implementations
/// ├── check       — one monitoring run, end to end
/// └── endpoint    — HTTP trigger for checks
/// ```

/// Public modules
pub mod alert;
pub mod check;
pub mod config;
pub mod db;
pub mod endpoint;
pub mod ingest;
pub mod model;
pub mod notify;
pub mod snooze;
