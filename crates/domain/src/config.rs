//! Tunables of the home state machine.

use serde::{Deserialize, Serialize};

use crate::access::{DEFAULT_PIN, validate_pin};
use crate::error::ValidationError;
use crate::timer::DEFAULT_STEP_SECS;

/// Security, occupancy and timer settings consumed by
/// [`HomeState`](crate::home::HomeState).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    /// Four-digit keypad secret.
    pub pin: String,
    /// Seconds between an accepted arm request and the armed state.
    pub arm_delay_secs: f64,
    /// Seconds granted to enter the PIN after an armed door opens.
    pub entry_delay_secs: f64,
    /// Seconds a door may stay open before raising an alarm.
    pub door_timeout_secs: f64,
    /// Tilt magnitude at or above which the alarm is raised.
    pub tilt_threshold: f64,
    /// Minimum seconds between accepted pulses of one motion sensor.
    pub motion_debounce_secs: f64,
    /// Mean distance change, in centimetres, that counts as a passage.
    pub direction_threshold_cm: f64,
    /// Seconds added to the timer by one push-button press.
    pub timer_step_secs: u32,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            pin: DEFAULT_PIN.to_string(),
            arm_delay_secs: 10.0,
            entry_delay_secs: 30.0,
            door_timeout_secs: 5.0,
            tilt_threshold: 20.0,
            motion_debounce_secs: 2.0,
            direction_threshold_cm: 10.0,
            timer_step_secs: DEFAULT_STEP_SECS,
        }
    }
}

impl HomeConfig {
    /// Check the PIN format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPin`] when the secret is not four digits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_pin(&self.pin)
    }
}
