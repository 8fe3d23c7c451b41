//! Ingestion dispatcher: routes decoded sensor readings into the hub.

use serde::Serialize;

use homeguard_domain::access::KeypadInput;
use homeguard_domain::home::{PinAction, PinOutcome};
use homeguard_domain::occupancy::Direction;
use homeguard_domain::sensor::SensorReading;

use crate::hub::{HomeHub, log_alarm_edge};

/// Result of submitting one raw reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// The reading was decoded and applied.
    Applied { sensor: String, effect: ReadingEffect },
    /// Unknown code or a value that does not fit the sensor class.
    Dropped { sensor: String },
}

impl IngestOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// What an applied reading changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReadingEffect {
    Door {
        open: bool,
        entry_delay_started: bool,
        entry_delay_cancelled: bool,
    },
    Motion {
        accepted: bool,
        direction: Option<Direction>,
        pulse_light: bool,
    },
    Distance {
        cm: f64,
    },
    Keypad {
        pin: PinResult,
    },
    Tilt {
        alarm_raised: bool,
    },
    Climate,
    Button {
        pressed: bool,
    },
    Remote,
}

/// Flat, serializable view of a [`PinOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PinResult {
    Ignored,
    Buffered,
    Cleared,
    Rejected,
    Disarmed,
    Arming,
    AlreadyArming,
}

impl From<&PinOutcome> for PinResult {
    fn from(outcome: &PinOutcome) -> Self {
        match outcome {
            PinOutcome::Pending(KeypadInput::Buffered) => Self::Buffered,
            PinOutcome::Pending(KeypadInput::Cleared) => Self::Cleared,
            PinOutcome::Pending(_) => Self::Ignored,
            PinOutcome::Rejected => Self::Rejected,
            PinOutcome::Accepted { action, .. } => match action {
                PinAction::Disarmed => Self::Disarmed,
                PinAction::Arming(_) => Self::Arming,
                PinAction::AlreadyArming => Self::AlreadyArming,
            },
        }
    }
}

impl HomeHub {
    /// Decode a raw `(code, value)` pair and apply it.
    ///
    /// Malformed input is never an error: it is logged and reported as
    /// [`IngestOutcome::Dropped`]. Either way the raw reading is kept for
    /// telemetry.
    pub fn submit_reading(&self, code: &str, value: &serde_json::Value) -> IngestOutcome {
        let sensor = code.trim().to_ascii_uppercase();
        let Some(reading) = SensorReading::decode(code, value) else {
            tracing::debug!(%sensor, %value, "dropped unknown or malformed reading");
            self.record_reading(code, value, false);
            return IngestOutcome::Dropped { sensor };
        };
        let effect = self.dispatch(reading);
        self.record_reading(code, value, true);
        IngestOutcome::Applied { sensor, effect }
    }

    fn dispatch(&self, reading: SensorReading) -> ReadingEffect {
        match reading {
            SensorReading::Door { sensor, open } => {
                let outcome = self.with_state(|state, now| state.door_changed(sensor, open, now));
                if outcome.entry_delay_started {
                    tracing::warn!(%sensor, "entry delay started");
                }
                if outcome.entry_delay_cancelled {
                    tracing::info!(%sensor, "entry delay cancelled, door closed");
                }
                log_alarm_edge(outcome.alarm_event.as_ref());
                ReadingEffect::Door {
                    open,
                    entry_delay_started: outcome.entry_delay_started,
                    entry_delay_cancelled: outcome.entry_delay_cancelled,
                }
            }
            SensorReading::Motion { sensor, active } => {
                let (outcome, person_count) = self.with_state(|state, now| {
                    let outcome = state.motion(sensor, active, now);
                    (outcome, state.person_count())
                });
                if let Some(direction) = outcome.direction {
                    tracing::info!(%sensor, ?direction, person_count, "passage detected");
                }
                log_alarm_edge(outcome.alarm_event.as_ref());
                ReadingEffect::Motion {
                    accepted: outcome.accepted,
                    direction: outcome.direction,
                    pulse_light: outcome.pulse_light,
                }
            }
            SensorReading::Distance { sensor, cm } => {
                self.with_state(|state, now| state.record_distance(sensor, cm, now));
                ReadingEffect::Distance { cm }
            }
            SensorReading::Keypad(token) => {
                let outcome = self.with_state(|state, now| state.keypad(&token, now));
                self.after_pin(&outcome);
                ReadingEffect::Keypad {
                    pin: PinResult::from(&outcome),
                }
            }
            SensorReading::Tilt(magnitude) => {
                let alarm_raised = self.with_state(|state, now| state.tilt(magnitude, now));
                if alarm_raised {
                    tracing::warn!(magnitude, "tilt above threshold");
                }
                ReadingEffect::Tilt { alarm_raised }
            }
            SensorReading::Climate {
                sensor,
                temperature_c,
                humidity_pct,
            } => {
                self.with_state(|state, now| {
                    state.climate(sensor, temperature_c, humidity_pct, now);
                });
                ReadingEffect::Climate
            }
            SensorReading::Button { pressed } => {
                self.with_state(|state, _| state.button(pressed));
                ReadingEffect::Button { pressed }
            }
            SensorReading::Remote(command) => {
                self.with_state(|state, _| state.remote(&command));
                ReadingEffect::Remote
            }
        }
    }
}
