//! Sensor vocabulary and the ingestion-boundary decoder.
//!
//! Every reading enters the system as a `(code, value)` pair with a loosely
//! typed JSON value. [`SensorReading::decode`] turns that pair into a closed
//! enum once; anything that does not fit is dropped by returning `None`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::light::RemoteCommand;

macro_rules! define_sensor_ids {
    ($(#[doc = $doc:expr])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            /// Every sensor of this class, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical upper-case sensor code.
            #[must_use]
            pub fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Match a sensor code, ignoring ASCII case.
            #[must_use]
            pub fn parse(code: &str) -> Option<Self> {
                let code = code.trim();
                Self::ALL.iter().copied().find(|s| s.code().eq_ignore_ascii_case(code))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s).ok_or_else(|| ValidationError::InvalidSensor(s.to_string()))
            }
        }
    };
}

define_sensor_ids!(
    /// Door contact sensors.
    DoorSensor { Ds1 => "DS1", Ds2 => "DS2" }
);

define_sensor_ids!(
    /// Passive infrared motion sensors.
    MotionSensor { Dpir1 => "DPIR1", Dpir2 => "DPIR2", Dpir3 => "DPIR3" }
);

define_sensor_ids!(
    /// Ultrasonic distance sensors paired with entrance motion sensors.
    DistanceSensor { Dus1 => "DUS1", Dus2 => "DUS2" }
);

define_sensor_ids!(
    /// Temperature/humidity sensors shown on the rotating display.
    ClimateSensor { Dht1 => "DHT1", Dht2 => "DHT2", Dht3 => "DHT3" }
);

impl MotionSensor {
    /// Distance sensor watching the same passage, if any.
    #[must_use]
    pub fn paired_distance(self) -> Option<DistanceSensor> {
        match self {
            Self::Dpir1 => Some(DistanceSensor::Dus1),
            Self::Dpir2 => Some(DistanceSensor::Dus2),
            Self::Dpir3 => None,
        }
    }

    /// Whether an accepted firing pulses the door light.
    #[must_use]
    pub fn pulses_light(self) -> bool {
        matches!(self, Self::Dpir1)
    }
}

/// Keypad (membrane switch) codes.
const KEYPAD_CODES: &[&str] = &["DMS", "DMS1"];
/// Gyroscope tilt sensor code.
const TILT_CODE: &str = "GSG";
/// Kitchen timer push-button codes.
const BUTTON_CODES: &[&str] = &["BTN", "DBTN"];
/// Infrared remote receiver code.
const REMOTE_CODE: &str = "IR";

/// A decoded sensor reading.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorReading {
    Door { sensor: DoorSensor, open: bool },
    Motion { sensor: MotionSensor, active: bool },
    Distance { sensor: DistanceSensor, cm: f64 },
    Keypad(String),
    Tilt(f64),
    Climate {
        sensor: ClimateSensor,
        temperature_c: Option<f64>,
        humidity_pct: Option<f64>,
    },
    Button { pressed: bool },
    Remote(RemoteCommand),
}

impl SensorReading {
    /// Decode a raw `(code, value)` pair.
    ///
    /// Returns `None` for unknown codes and for values that do not fit the
    /// sensor class.
    #[must_use]
    pub fn decode(code: &str, value: &serde_json::Value) -> Option<Self> {
        let code = code.trim();

        if let Some(sensor) = DoorSensor::parse(code) {
            return as_flag(value).map(|open| Self::Door { sensor, open });
        }
        if let Some(sensor) = MotionSensor::parse(code) {
            return as_flag(value).map(|active| Self::Motion { sensor, active });
        }
        if let Some(sensor) = DistanceSensor::parse(code) {
            return as_number(value).map(|cm| Self::Distance { sensor, cm });
        }
        if let Some(sensor) = ClimateSensor::parse(code) {
            return decode_climate(sensor, value);
        }
        if matches_any(code, KEYPAD_CODES) {
            return as_token(value).map(Self::Keypad);
        }
        if code.eq_ignore_ascii_case(TILT_CODE) {
            return as_number(value).map(Self::Tilt);
        }
        if matches_any(code, BUTTON_CODES) {
            return as_flag(value).map(|pressed| Self::Button { pressed });
        }
        if code.eq_ignore_ascii_case(REMOTE_CODE) {
            return RemoteCommand::decode(value).map(Self::Remote);
        }
        None
    }
}

fn matches_any(code: &str, codes: &[&str]) -> bool {
    codes.iter().any(|c| c.eq_ignore_ascii_case(code))
}

/// Coerce a loosely typed value into a boolean flag.
#[must_use]
pub fn as_flag(value: &serde_json::Value) -> Option<bool> {
    match value {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "open" | "active" | "pressed" => Some(true),
            "0" | "false" | "off" | "closed" | "inactive" | "released" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Coerce a loosely typed value into a finite number.
#[must_use]
pub fn as_number(value: &serde_json::Value) -> Option<f64> {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn as_token(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        serde_json::Value::Number(n) => n.as_u64().map(|v| v.to_string()),
        _ => None,
    }
}

fn decode_climate(sensor: ClimateSensor, value: &serde_json::Value) -> Option<SensorReading> {
    let obj = value.as_object()?;
    let field = |primary: &str, alias: &str| {
        obj.get(primary)
            .or_else(|| obj.get(alias))
            .and_then(as_number)
    };
    let temperature_c = field("temperature_c", "temperature");
    let humidity_pct = field("humidity_pct", "humidity");
    if temperature_c.is_none() && humidity_pct.is_none() {
        return None;
    }
    Some(SensorReading::Climate {
        sensor,
        temperature_c,
        humidity_pct,
    })
}
