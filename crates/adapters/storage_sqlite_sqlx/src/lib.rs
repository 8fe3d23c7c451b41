//! # homeguard-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement `AlarmEventStore`, `ActuatorStateStore` and
//!   `SensorReadingStore` from `homeguard-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `homeguard-app` (for port traits) and `homeguard-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod actuator_state_store;
mod alarm_event_store;
mod error;
mod pool;
mod sensor_reading_store;

pub use actuator_state_store::SqliteActuatorStateStore;
pub use alarm_event_store::SqliteAlarmEventStore;
pub use error::StorageError;
pub use pool::{Config, Database};
pub use sensor_reading_store::SqliteSensorReadingStore;
