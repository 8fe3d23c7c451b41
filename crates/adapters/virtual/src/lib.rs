//! # homeguard-adapter-virtual
//!
//! Simulated actuators for local runs without a broker. Every command is
//! logged; the reconciliation loop marks the mirrored records as simulated.
//!
//! ## Provided devices
//!
//! | Code | Device | Payload |
//! |------|--------|---------|
//! | `DB` | Door Buzzer | `{"state": bool}` |
//! | `DL` | Door Light | `{"state": bool}` |
//! | `4SD` | 4 Digit 7 Segment Display | `{"text", "blink", "running"}` |
//! | `LCD` | LCD Display | `{"text"}` |
//! | `BRGB` | RGB Light | `{"state", "color"}` |
//!
//! ## Dependency rule
//!
//! Depends on `homeguard-app` (port traits) and `homeguard-domain` only.

use homeguard_app::ports::ActuatorSink;
use homeguard_domain::actuator::ActuatorCommand;
use homeguard_domain::error::HomeGuardError;

/// Actuator bank that only logs, implementing [`ActuatorSink`].
#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualActuators;

impl ActuatorSink for VirtualActuators {
    async fn send(&self, command: &ActuatorCommand) -> Result<(), HomeGuardError> {
        tracing::info!(
            code = command.target.code(),
            device = command.target.device_name(),
            payload = %command.payload,
            "virtual actuator updated"
        );
        Ok(())
    }

    fn is_simulated(&self) -> bool {
        true
    }
}
