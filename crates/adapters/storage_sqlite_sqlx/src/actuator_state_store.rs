//! `SQLite` implementation of [`ActuatorStateStore`].

use chrono::SecondsFormat;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use homeguard_app::ports::ActuatorStateStore;
use homeguard_domain::actuator::ActuatorRecord;
use homeguard_domain::error::HomeGuardError;
use homeguard_domain::id::ActuatorRecordId;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(ActuatorRecord);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<ActuatorRecord> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let device_id: String = row.try_get("device_id")?;
        let code: String = row.try_get("code")?;
        let name: String = row.try_get("name")?;
        let value_json: String = row.try_get("value")?;
        let simulated: bool = row.try_get("simulated")?;
        let timestamp_str: String = row.try_get("timestamp")?;

        let value: serde_json::Value =
            serde_json::from_str(&value_json).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp_str)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(ActuatorRecord {
            id: ActuatorRecordId::from_uuid(id),
            device_id,
            code,
            name,
            value,
            simulated,
            timestamp,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO actuator_states (id, device_id, code, name, value, simulated, timestamp)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const SELECT_LATEST_PER_CODE: &str = r"
    SELECT * FROM actuator_states
    WHERE rowid IN (SELECT MAX(rowid) FROM actuator_states GROUP BY code)
    ORDER BY code
";

const SELECT_LATEST_FOR_CODE: &str =
    "SELECT * FROM actuator_states WHERE code = ? ORDER BY rowid DESC LIMIT 1";

/// `SQLite`-backed mirror of issued actuator commands.
#[derive(Debug, Clone)]
pub struct SqliteActuatorStateStore {
    pool: SqlitePool,
}

impl SqliteActuatorStateStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ActuatorStateStore for SqliteActuatorStateStore {
    async fn record(&self, record: ActuatorRecord) -> Result<ActuatorRecord, HomeGuardError> {
        let value_json = serde_json::to_string(&record.value).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(record.id.as_uuid())
            .bind(&record.device_id)
            .bind(&record.code)
            .bind(&record.name)
            .bind(&value_json)
            .bind(record.simulated)
            .bind(record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(record)
    }

    async fn latest(&self) -> Result<Vec<ActuatorRecord>, HomeGuardError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_LATEST_PER_CODE)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn latest_for(&self, code: &str) -> Result<Option<ActuatorRecord>, HomeGuardError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_LATEST_FOR_CODE)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }
}
