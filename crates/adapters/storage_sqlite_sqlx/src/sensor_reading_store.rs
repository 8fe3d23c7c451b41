//! `SQLite` implementation of [`SensorReadingStore`].

use chrono::SecondsFormat;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, Sqlite, SqlitePool};

use homeguard_app::ports::SensorReadingStore;
use homeguard_domain::error::HomeGuardError;
use homeguard_domain::id::SensorReadingId;
use homeguard_domain::telemetry::SensorReadingRecord;

use crate::error::StorageError;

struct Wrapper(SensorReadingRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let code: String = row.try_get("code")?;
        let value_json: String = row.try_get("value")?;
        let applied: bool = row.try_get("applied")?;
        let timestamp_str: String = row.try_get("timestamp")?;

        let value: serde_json::Value =
            serde_json::from_str(&value_json).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp_str)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(SensorReadingRecord {
            id: SensorReadingId::from_uuid(id),
            code,
            value,
            applied,
            timestamp,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO sensor_readings (id, code, value, applied, timestamp)
    VALUES (?, ?, ?, ?, ?)
";

const SELECT_RECENT: &str =
    "SELECT * FROM sensor_readings ORDER BY timestamp DESC, rowid DESC LIMIT ?";

const SELECT_RECENT_FOR_CODE: &str =
    "SELECT * FROM sensor_readings WHERE code = ? ORDER BY timestamp DESC, rowid DESC LIMIT ?";

/// `SQLite`-backed raw sensor telemetry.
#[derive(Debug, Clone)]
pub struct SqliteSensorReadingStore {
    pool: SqlitePool,
}

impl SqliteSensorReadingStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SensorReadingStore for SqliteSensorReadingStore {
    async fn store_batch(&self, readings: Vec<SensorReadingRecord>) -> Result<(), HomeGuardError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        for reading in &readings {
            sqlx::query(INSERT)
                .bind(reading.id.as_uuid())
                .bind(&reading.code)
                .bind(reading.value.to_string())
                .bind(reading.applied)
                .bind(reading.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }

    async fn recent(
        &self,
        code: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SensorReadingRecord>, HomeGuardError> {
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);
        let query = match code {
            Some(code) => sqlx::query_as::<Sqlite, Wrapper>(SELECT_RECENT_FOR_CODE)
                .bind(code.trim().to_ascii_uppercase()),
            None => sqlx::query_as::<Sqlite, Wrapper>(SELECT_RECENT),
        };
        let rows: Vec<Wrapper> = query
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use homeguard_domain::time::now;
    use serde_json::json;

    use super::*;
    use crate::pool::Config;

    async fn setup() -> SqliteSensorReadingStore {
        Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap()
        .sensor_reading_store()
    }

    #[tokio::test]
    async fn should_store_readings_and_read_back_newest_first() {
        let store = setup().await;
        let start = now();
        let dht = SensorReadingRecord::new(
            "DHT1",
            json!({"temperature": 21.5, "humidity": 40.0}),
            true,
            start,
        );
        let junk = SensorReadingRecord::new("XYZ", json!("??"), false, start + TimeDelta::seconds(1));

        store.store_batch(vec![dht.clone(), junk]).await.unwrap();

        let recent = store.recent(None, 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].code, "XYZ");
        assert!(!recent[0].applied);
        assert_eq!(recent[1].id, dht.id);
        assert_eq!(recent[1].value, dht.value);
        assert!(recent[1].applied);
    }

    #[tokio::test]
    async fn should_filter_by_code_and_respect_limit() {
        let store = setup().await;
        let start = now();
        let readings = (0..4)
            .map(|i| SensorReadingRecord::new("DUS1", json!(100 + i), true, start + TimeDelta::seconds(i)))
            .chain(std::iter::once(SensorReadingRecord::new("DS1", json!(true), true, start)))
            .collect();
        store.store_batch(readings).await.unwrap();

        let recent = store.recent(Some("dus1"), 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|r| r.code == "DUS1"));
        assert_eq!(recent[0].value, json!(103));
        assert_eq!(store.recent(Some("DS1"), 10).await.unwrap().len(), 1);
    }
}
