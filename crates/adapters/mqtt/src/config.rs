//! MQTT bridge configuration.

use serde::Deserialize;

/// Configuration for the MQTT bridge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Whether the daemon starts the bridge at all.
    pub enabled: bool,
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Base topic prefix for sensor payloads and commands.
    pub base_topic: String,
    /// Device id whose command topics receive actuator commands.
    pub pi_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "homeguard".to_string(),
            base_topic: "home".to_string(),
            pi_id: "PI1".to_string(),
            keep_alive_secs: 30,
        }
    }
}
