/// Postgres-backed snooze store.
///
/// One row per location in `rainmon.snooze_state`. Every operation is a
/// single statement, so a clear removes expiry and flag together and a set
/// overwrites any earlier record in one step.
///
/// The connection is opened on first use and closed when the store is
/// dropped, so it never outlives the run that created it.

use postgres::Client;
use tracing::debug;

use super::SnoozeStore;
use crate::db;
use crate::model::{LocationKey, SnoozeRecord, StoreError};

pub struct PostgresSnoozeStore {
    database_url: String,
    client: Option<Client>,
}

impl PostgresSnoozeStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            client: None,
        }
    }

    fn client(&mut self) -> Result<&mut Client, StoreError> {
        if self.client.is_none() {
            debug!("opening snooze store connection");
            let client = db::connect(&self.database_url)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            self.client = Some(client);
        }
        self.client
            .as_mut()
            .ok_or_else(|| StoreError::Unavailable("no database connection".to_string()))
    }
}

impl SnoozeStore for PostgresSnoozeStore {
    fn load(&mut self, key: &LocationKey) -> Result<Option<SnoozeRecord>, StoreError> {
        let rows = self.client()?.query(
            "SELECT expires_at, resume_notice_sent
             FROM rainmon.snooze_state
             WHERE location_key = $1",
            &[&key.as_str()],
        )?;

        Ok(rows.first().map(|row| SnoozeRecord {
            expires_at: row.get(0),
            resume_notice_sent: row.get(1),
        }))
    }

    fn set(&mut self, key: &LocationKey, expires_at: i64) -> Result<(), StoreError> {
        self.client()?.execute(
            "INSERT INTO rainmon.snooze_state
             (location_key, expires_at, resume_notice_sent, updated_at)
             VALUES ($1, $2, FALSE, NOW())
             ON CONFLICT (location_key) DO UPDATE SET
                expires_at = EXCLUDED.expires_at,
                resume_notice_sent = FALSE,
                updated_at = NOW()",
            &[&key.as_str(), &expires_at],
        )?;
        Ok(())
    }

    fn mark_resume_sent(&mut self, key: &LocationKey) -> Result<(), StoreError> {
        self.client()?.execute(
            "UPDATE rainmon.snooze_state
             SET resume_notice_sent = TRUE, updated_at = NOW()
             WHERE location_key = $1",
            &[&key.as_str()],
        )?;
        Ok(())
    }

    fn clear(&mut self, key: &LocationKey) -> Result<(), StoreError> {
        self.client()?.execute(
            "DELETE FROM rainmon.snooze_state WHERE location_key = $1",
            &[&key.as_str()],
        )?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
