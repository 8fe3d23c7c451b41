//! Actuator sink port: delivers commands to output devices.

use std::future::Future;

use homeguard_domain::actuator::ActuatorCommand;
use homeguard_domain::error::HomeGuardError;

/// Receives the commands issued by the reconciliation loop.
///
/// Implementations live in adapter crates: virtual actuators for local
/// runs, the MQTT bridge for real devices.
pub trait ActuatorSink {
    /// Deliver one command to its target device.
    fn send(
        &self,
        command: &ActuatorCommand,
    ) -> impl Future<Output = Result<(), HomeGuardError>> + Send;

    /// Whether commands only reach simulated devices.
    fn is_simulated(&self) -> bool {
        false
    }
}

impl<T: ActuatorSink + Send + Sync> ActuatorSink for std::sync::Arc<T> {
    fn send(
        &self,
        command: &ActuatorCommand,
    ) -> impl Future<Output = Result<(), HomeGuardError>> + Send {
        (**self).send(command)
    }

    fn is_simulated(&self) -> bool {
        (**self).is_simulated()
    }
}
