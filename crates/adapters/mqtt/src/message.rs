//! Topic layout and payload decoding.
//!
//! Sensor publishers send either one JSON object or a batch (a JSON array of
//! objects) to any topic under the base topic. Each object carries the
//! reading in `value` and the sensor code in `code`; when `code` is missing
//! the last topic segment is used instead.

use homeguard_domain::actuator::ActuatorTarget;

use crate::error::MqttError;

/// A raw `(code, value)` pair ready for the hub.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    pub code: String,
    pub value: serde_json::Value,
}

/// Subscription filter covering every topic under `base`.
#[must_use]
pub fn subscription(base: &str) -> String {
    format!("{}/#", base.trim_end_matches('/'))
}

/// Whether `topic` is one of the command topics this bridge publishes to.
#[must_use]
pub fn is_command_topic(topic: &str) -> bool {
    topic.split('/').any(|segment| segment == "cmd")
}

/// Command topic of `target` on device `pi_id`, e.g. `home/pi1/cmd/buzzer`.
#[must_use]
pub fn command_topic(base: &str, pi_id: &str, target: ActuatorTarget) -> String {
    format!(
        "{}/{}/cmd/{}",
        base.trim_end_matches('/'),
        pi_id.to_ascii_lowercase(),
        target.topic_name()
    )
}

/// Decode a sensor payload into readings.
///
/// Entries without a usable code or without a `value` are skipped.
///
/// # Errors
///
/// Returns [`MqttError::PayloadParse`] when the payload is not JSON.
pub fn decode_payload(topic: &str, payload: &[u8]) -> Result<Vec<RawReading>, MqttError> {
    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(MqttError::PayloadParse)?;
    let fallback_code = topic.rsplit('/').next().unwrap_or_default();
    let items = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };
    Ok(items
        .iter()
        .filter_map(|item| {
            let object = item.as_object()?;
            let value = object.get("value")?.clone();
            let code = object
                .get("code")
                .and_then(serde_json::Value::as_str)
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(fallback_code);
            (!code.is_empty()).then(|| RawReading {
                code: code.to_string(),
                value,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn should_decode_single_object_with_code() {
        let payload = br#"{"pi": "PI1", "code": "DS1", "value": true, "simulated": true}"#;
        let readings = decode_payload("home/pi1/sensors", payload).unwrap();
        assert_eq!(
            readings,
            vec![RawReading {
                code: "DS1".to_string(),
                value: json!(true)
            }]
        );
    }

    #[test]
    fn should_use_topic_tail_when_code_missing() {
        let readings = decode_payload("home/pi1/DUS1", br#"{"value": 42.5}"#).unwrap();
        assert_eq!(readings[0].code, "DUS1");
        assert_eq!(readings[0].value, json!(42.5));
    }

    #[test]
    fn should_decode_batch_and_skip_entries_without_value() {
        let payload = br#"[
            {"code": "DHT1", "value": {"temperature": 21.0, "humidity": 40.0}},
            {"code": "DPIR1"},
            "noise",
            {"code": "GSG", "value": 3.2}
        ]"#;
        let readings = decode_payload("home/pi1/batch", payload).unwrap();
        let codes: Vec<&str> = readings.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["DHT1", "GSG"]);
    }

    #[test]
    fn should_reject_non_json_payload() {
        assert!(matches!(
            decode_payload("home/pi1/DS1", b"open"),
            Err(MqttError::PayloadParse(_))
        ));
    }

    #[test]
    fn should_build_lowercase_command_topic() {
        assert_eq!(
            command_topic("home", "PI1", ActuatorTarget::TimerDisplay),
            "home/pi1/cmd/segment_display"
        );
        assert!(is_command_topic("home/pi1/cmd/buzzer"));
        assert!(!is_command_topic("home/pi1/sensors"));
        assert_eq!(subscription("home/"), "home/#");
    }
}
