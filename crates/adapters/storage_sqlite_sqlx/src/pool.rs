//! `SQLite` connection pool setup and migration runner.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

use crate::actuator_state_store::SqliteActuatorStateStore;
use crate::alarm_event_store::SqliteAlarmEventStore;
use crate::error::StorageError;
use crate::sensor_reading_store::SqliteSensorReadingStore;

/// Configuration for the `SQLite` storage adapter.
#[derive(Debug, Clone)]
pub struct Config {
    /// `SQLite` connection URL (e.g. `sqlite:homeguard.db` or `sqlite::memory:`).
    pub database_url: String,
}

impl Config {
    /// Build a [`Database`] from this configuration.
    ///
    /// Creates the connection pool, creates the database file if missing,
    /// and runs all pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the connection or migrations fail.
    pub async fn build(self) -> Result<Database, StorageError> {
        Database::initialize(&self.database_url).await
    }
}

/// Holds the `SQLite` connection pool and hands out the stores built on it.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn initialize(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Borrow the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[must_use]
    pub fn alarm_event_store(&self) -> SqliteAlarmEventStore {
        SqliteAlarmEventStore::new(self.pool.clone())
    }

    #[must_use]
    pub fn actuator_state_store(&self) -> SqliteActuatorStateStore {
        SqliteActuatorStateStore::new(self.pool.clone())
    }

    #[must_use]
    pub fn sensor_reading_store(&self) -> SqliteSensorReadingStore {
        SqliteSensorReadingStore::new(self.pool.clone())
    }
}
