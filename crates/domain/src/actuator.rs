//! Actuator targets, commands and persisted actuator-state records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ValidationError;
use crate::id::ActuatorRecordId;
use crate::light::ColorLight;
use crate::time::Timestamp;
use crate::timer::TimerStatus;

/// Every output device driven by the reconciliation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActuatorTarget {
    #[serde(rename = "DB")]
    Buzzer,
    #[serde(rename = "DL")]
    DoorLight,
    #[serde(rename = "4SD")]
    TimerDisplay,
    #[serde(rename = "LCD")]
    TextDisplay,
    #[serde(rename = "BRGB")]
    ColorLight,
}

impl ActuatorTarget {
    pub const ALL: [Self; 5] = [
        Self::Buzzer,
        Self::DoorLight,
        Self::TimerDisplay,
        Self::TextDisplay,
        Self::ColorLight,
    ];

    /// Device code, as used in actuator records.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Buzzer => "DB",
            Self::DoorLight => "DL",
            Self::TimerDisplay => "4SD",
            Self::TextDisplay => "LCD",
            Self::ColorLight => "BRGB",
        }
    }

    /// Short lowercase name used in command topics.
    #[must_use]
    pub fn topic_name(self) -> &'static str {
        match self {
            Self::Buzzer => "buzzer",
            Self::DoorLight => "led",
            Self::TimerDisplay => "segment_display",
            Self::TextDisplay => "lcd",
            Self::ColorLight => "rgb",
        }
    }

    /// Human readable device name.
    #[must_use]
    pub fn device_name(self) -> &'static str {
        match self {
            Self::Buzzer => "Door Buzzer",
            Self::DoorLight => "Door Light",
            Self::TimerDisplay => "4 Digit 7 Segment Display",
            Self::TextDisplay => "LCD Display",
            Self::ColorLight => "RGB Light",
        }
    }
}

impl fmt::Display for ActuatorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ActuatorTarget {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(s) || t.topic_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownActuator(s.to_string()))
    }
}

/// A payload addressed to one actuator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActuatorCommand {
    pub target: ActuatorTarget,
    pub payload: serde_json::Value,
}

impl ActuatorCommand {
    /// An operator-supplied payload, forwarded as is.
    #[must_use]
    pub fn manual(target: ActuatorTarget, payload: serde_json::Value) -> Self {
        Self { target, payload }
    }

    #[must_use]
    pub fn buzzer(on: bool) -> Self {
        Self {
            target: ActuatorTarget::Buzzer,
            payload: json!({ "state": on }),
        }
    }

    #[must_use]
    pub fn door_light(on: bool) -> Self {
        Self {
            target: ActuatorTarget::DoorLight,
            payload: json!({ "state": on }),
        }
    }

    #[must_use]
    pub fn timer_display(status: &TimerStatus) -> Self {
        Self {
            target: ActuatorTarget::TimerDisplay,
            payload: json!({
                "text": status.display_text(),
                "blink": status.blink,
                "running": status.running,
            }),
        }
    }

    #[must_use]
    pub fn text_display(text: &str) -> Self {
        Self {
            target: ActuatorTarget::TextDisplay,
            payload: json!({ "text": text }),
        }
    }

    #[must_use]
    pub fn color_light(light: &ColorLight) -> Self {
        Self {
            target: ActuatorTarget::ColorLight,
            payload: json!({ "state": light.on, "color": light.color }),
        }
    }
}

/// A command mirrored into persistent storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorRecord {
    pub id: ActuatorRecordId,
    pub device_id: String,
    pub code: String,
    pub name: String,
    pub value: serde_json::Value,
    pub simulated: bool,
    pub timestamp: Timestamp,
}

impl ActuatorRecord {
    /// Build the record for a command issued by `device_id`.
    #[must_use]
    pub fn from_command(
        device_id: &str,
        command: &ActuatorCommand,
        simulated: bool,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: ActuatorRecordId::new(),
            device_id: device_id.to_string(),
            code: command.target.code().to_string(),
            name: command.target.device_name().to_string(),
            value: command.payload.clone(),
            simulated,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;

    #[test]
    fn should_render_timer_payload_with_mmss_text() {
        let status = TimerStatus {
            seconds: 75,
            running: true,
            blink: false,
            step: 30,
        };
        let cmd = ActuatorCommand::timer_display(&status);
        assert_eq!(
            cmd.payload,
            json!({"text": "01:15", "blink": false, "running": true})
        );
    }

    #[test]
    fn should_render_color_light_payload() {
        let cmd = ActuatorCommand::color_light(&ColorLight::default());
        assert_eq!(cmd.payload, json!({"state": false, "color": "#ffffff"}));
        assert_eq!(cmd.target.code(), "BRGB");
    }

    #[test]
    fn should_parse_target_from_code_or_topic_name() {
        assert_eq!("4sd".parse::<ActuatorTarget>().unwrap(), ActuatorTarget::TimerDisplay);
        assert_eq!("led".parse::<ActuatorTarget>().unwrap(), ActuatorTarget::DoorLight);
        assert!("fan".parse::<ActuatorTarget>().is_err());
    }

    #[test]
    fn should_copy_command_into_record() {
        let cmd = ActuatorCommand::buzzer(true);
        let record = ActuatorRecord::from_command("PI1", &cmd, true, now());
        assert_eq!(record.device_id, "PI1");
        assert_eq!(record.code, "DB");
        assert_eq!(record.name, "Door Buzzer");
        assert_eq!(record.value, json!({"state": true}));
        assert!(record.simulated);
    }
}
