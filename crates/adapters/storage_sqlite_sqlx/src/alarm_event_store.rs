//! `SQLite` implementation of [`AlarmEventStore`].

use chrono::SecondsFormat;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use homeguard_app::ports::AlarmEventStore;
use homeguard_domain::alarm::{AlarmEdge, AlarmEvent};
use homeguard_domain::error::HomeGuardError;
use homeguard_domain::id::AlarmEventId;

use crate::error::StorageError;

struct Wrapper(AlarmEvent);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let timestamp_str: String = row.try_get("timestamp")?;
        let event_str: String = row.try_get("event")?;
        let reason: String = row.try_get("reason")?;

        let event: AlarmEdge = event_str
            .parse()
            .map_err(|err: String| sqlx::Error::Decode(err.into()))?;
        let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp_str)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(AlarmEvent {
            id: AlarmEventId::from_uuid(id),
            timestamp,
            event,
            reason,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO alarm_events (id, timestamp, event, reason)
    VALUES (?, ?, ?, ?)
";

const SELECT_RECENT: &str =
    "SELECT * FROM alarm_events ORDER BY timestamp DESC, rowid DESC LIMIT ?";

/// `SQLite`-backed alarm telemetry.
#[derive(Debug, Clone)]
pub struct SqliteAlarmEventStore {
    pool: SqlitePool,
}

impl SqliteAlarmEventStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AlarmEventStore for SqliteAlarmEventStore {
    async fn store_batch(&self, events: Vec<AlarmEvent>) -> Result<(), HomeGuardError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        for event in &events {
            sqlx::query(INSERT)
                .bind(event.id.as_uuid())
                .bind(event.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
                .bind(event.event.as_str())
                .bind(&event.reason)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AlarmEvent>, HomeGuardError> {
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
