//! Alarm event store port: persistence for alarm on/off telemetry.

use std::future::Future;

use homeguard_domain::alarm::AlarmEvent;
use homeguard_domain::error::HomeGuardError;

/// Repository for persisting and querying [`AlarmEvent`]s.
pub trait AlarmEventStore {
    /// Persist a batch of drained events.
    fn store_batch(
        &self,
        events: Vec<AlarmEvent>,
    ) -> impl Future<Output = Result<(), HomeGuardError>> + Send;

    /// Get the most recent events, ordered newest-first.
    fn recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<AlarmEvent>, HomeGuardError>> + Send;
}
