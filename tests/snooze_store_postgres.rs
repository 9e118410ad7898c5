/// Integration tests for the PostgreSQL snooze store
///
/// Verifies the store contract against a real database: a set overwrites
/// and resets the resume flag, clear removes the row, and two store
/// instances see each other's writes (state shared across invocations).
///
/// Prerequisites:
/// - PostgreSQL running with rainmon_db database
/// - DATABASE_URL set in .env
/// - Schema applied (rainmon init-db)
///
/// Run with: cargo test --test snooze_store_postgres -- --ignored --test-threads=1

use chrono::{TimeZone, Utc};
use std::env;

use rainmon_service::db;
use rainmon_service::model::{LocationKey, SnoozeRecord, TierTable, SECONDS_PER_WEEK};
use rainmon_service::snooze::{PostgresSnoozeStore, SnoozeController, SnoozeStatus, SnoozeStore};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn database_url() -> String {
    dotenv::dotenv().ok();
    env::var("DATABASE_URL").expect("DATABASE_URL must be set")
}

/// Keys far outside real coordinates so tests never touch live rows.
fn test_key(n: u32) -> LocationKey {
    LocationKey::from_coordinates(-89.0, -179.0 + f64::from(n) * 0.001)
}

fn cleanup(key: &LocationKey) {
    let mut store = PostgresSnoozeStore::new(database_url());
    let _ = store.clear(key);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
#[ignore] // Requires database
fn test_schema_exists() {
    let mut client = db::connect(&database_url()).expect("connect");
    db::verify_schema(&mut client, db::SNOOZE_SCHEMA).expect("schema present");
}

#[test]
#[ignore] // Requires database
fn test_set_mark_clear_roundtrip() {
    let key = test_key(1);
    cleanup(&key);
    let mut store = PostgresSnoozeStore::new(database_url());

    assert_eq!(store.load(&key).unwrap(), None);

    store.set(&key, 1_000).unwrap();
    store.mark_resume_sent(&key).unwrap();
    assert_eq!(
        store.load(&key).unwrap(),
        Some(SnoozeRecord {
            expires_at: Some(1_000),
            resume_notice_sent: true
        })
    );

    // A fresh snooze resets the flag.
    store.set(&key, 2_000).unwrap();
    assert_eq!(
        store.load(&key).unwrap(),
        Some(SnoozeRecord {
            expires_at: Some(2_000),
            resume_notice_sent: false
        })
    );

    store.clear(&key).unwrap();
    assert_eq!(store.load(&key).unwrap(), None);
}

#[test]
#[ignore] // Requires database
fn test_state_is_shared_between_store_instances() {
    let key = test_key(2);
    cleanup(&key);
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    let expires_at = {
        let mut first = PostgresSnoozeStore::new(database_url());
        SnoozeController::new(&mut first, key.clone())
            .apply_snooze(&TierTable::default().medium, now)
            .unwrap()
    };
    assert_eq!(expires_at, now.timestamp() + 2 * SECONDS_PER_WEEK);

    let mut second = PostgresSnoozeStore::new(database_url());
    let status = SnoozeController::new(&mut second, key.clone()).status(now);
    assert_eq!(status, SnoozeStatus::Snoozed { expires_at });

    cleanup(&key);
}
