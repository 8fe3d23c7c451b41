//! Demo hooks that age internal timestamps so a time-based rule fires now.

use std::str::FromStr;

use serde::Serialize;

use crate::error::ValidationError;
use crate::sensor::{DoorSensor, MotionSensor};

/// A named scenario with its resolved sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Backdate a door's open time past the timeout.
    DoorOpenTooLong(DoorSensor),
    /// Force the armed state and backdate an entry delay past its window.
    EntryDelayExpired(DoorSensor),
    /// Empty the house and fire a motion pulse.
    MotionEmptyHouse(MotionSensor),
    /// Feed a tilt reading above the threshold.
    GsgTilt,
}

impl Scenario {
    pub const NAMES: [&'static str; 4] = [
        "ds_open_too_long",
        "entry_delay_expired",
        "motion_empty_house",
        "gsg_tilt",
    ];

    /// Resolve `name` and its optional `{"sensor": ..}` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownScenario`] for an unknown name and
    /// [`ValidationError::InvalidSensor`] when the sensor does not fit.
    pub fn parse(name: &str, params: &serde_json::Value) -> Result<Self, ValidationError> {
        let sensor = params.get("sensor").and_then(serde_json::Value::as_str);
        match name.trim() {
            "ds_open_too_long" => Ok(Self::DoorOpenTooLong(sensor_or(sensor, DoorSensor::Ds1)?)),
            "entry_delay_expired" => {
                Ok(Self::EntryDelayExpired(sensor_or(sensor, DoorSensor::Ds1)?))
            }
            "motion_empty_house" => Ok(Self::MotionEmptyHouse(sensor_or(
                sensor,
                MotionSensor::Dpir3,
            )?)),
            "gsg_tilt" => Ok(Self::GsgTilt),
            other => Err(ValidationError::UnknownScenario(other.to_string())),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DoorOpenTooLong(_) => Self::NAMES[0],
            Self::EntryDelayExpired(_) => Self::NAMES[1],
            Self::MotionEmptyHouse(_) => Self::NAMES[2],
            Self::GsgTilt => Self::NAMES[3],
        }
    }

    /// Sensor code the scenario acts on, if any.
    #[must_use]
    pub fn sensor(self) -> Option<&'static str> {
        match self {
            Self::DoorOpenTooLong(s) | Self::EntryDelayExpired(s) => Some(s.code()),
            Self::MotionEmptyHouse(s) => Some(s.code()),
            Self::GsgTilt => None,
        }
    }
}

fn sensor_or<T>(raw: Option<&str>, default: T) -> Result<T, ValidationError>
where
    T: FromStr<Err = ValidationError>,
{
    raw.map_or(Ok(default), str::parse)
}

/// What a scenario run did, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub ok: bool,
    pub scenario: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor: Option<&'static str>,
    pub alarm_active: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn should_default_sensors_when_params_missing() {
        assert_eq!(
            Scenario::parse("ds_open_too_long", &json!({})).unwrap(),
            Scenario::DoorOpenTooLong(DoorSensor::Ds1)
        );
        assert_eq!(
            Scenario::parse("motion_empty_house", &serde_json::Value::Null).unwrap(),
            Scenario::MotionEmptyHouse(MotionSensor::Dpir3)
        );
    }

    #[test]
    fn should_accept_lowercase_sensor_param() {
        assert_eq!(
            Scenario::parse("entry_delay_expired", &json!({"sensor": "ds2"})).unwrap(),
            Scenario::EntryDelayExpired(DoorSensor::Ds2)
        );
    }

    #[test]
    fn should_reject_sensor_of_wrong_class() {
        assert_eq!(
            Scenario::parse("ds_open_too_long", &json!({"sensor": "DPIR1"})).unwrap_err(),
            ValidationError::InvalidSensor("DPIR1".into())
        );
    }

    #[test]
    fn should_reject_unknown_scenario() {
        assert_eq!(
            Scenario::parse("flood", &json!({})).unwrap_err(),
            ValidationError::UnknownScenario("flood".into())
        );
    }

    #[test]
    fn should_roundtrip_every_name() {
        for name in Scenario::NAMES {
            assert_eq!(Scenario::parse(name, &json!({})).unwrap().name(), name);
        }
    }
}
