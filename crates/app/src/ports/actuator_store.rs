//! Actuator state store port: mirrors every issued command.

use std::future::Future;

use homeguard_domain::actuator::ActuatorRecord;
use homeguard_domain::error::HomeGuardError;

/// Repository for [`ActuatorRecord`]s.
pub trait ActuatorStateStore {
    /// Persist a record.
    fn record(
        &self,
        record: ActuatorRecord,
    ) -> impl Future<Output = Result<ActuatorRecord, HomeGuardError>> + Send;

    /// The most recent record of every actuator code, ordered by code.
    fn latest(&self) -> impl Future<Output = Result<Vec<ActuatorRecord>, HomeGuardError>> + Send;

    /// The most recent record for one actuator code.
    fn latest_for(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<ActuatorRecord>, HomeGuardError>> + Send;
}
