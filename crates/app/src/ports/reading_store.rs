//! Sensor reading store port: raw telemetry of every submitted reading.

use std::future::Future;

use homeguard_domain::error::HomeGuardError;
use homeguard_domain::telemetry::SensorReadingRecord;

/// Repository for [`SensorReadingRecord`]s.
pub trait SensorReadingStore {
    /// Persist a batch of drained readings.
    fn store_batch(
        &self,
        readings: Vec<SensorReadingRecord>,
    ) -> impl Future<Output = Result<(), HomeGuardError>> + Send;

    /// The most recent readings, newest first, optionally for one code.
    fn recent(
        &self,
        code: Option<&str>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SensorReadingRecord>, HomeGuardError>> + Send;
}
