//! # homeguard-adapter-mqtt
//!
//! MQTT adapter: connects the home hub to sensor nodes and actuators over a
//! broker, using [rumqttc](https://docs.rs/rumqttc).
//!
//! ## Responsibilities
//! - Subscribe to `<base_topic>/#` and feed every decoded sensor payload
//!   (single object or batch) into `HomeHub::submit_reading`
//! - Ignore the command topics this bridge publishes to itself
//! - Publish actuator commands to `<base_topic>/<pi_id>/cmd/<name>` at
//!   QoS 1, as an `ActuatorSink`
//! - Never wait on the client's request channel: a publish made while the
//!   broker is unreachable fails once the channel is full
//!
//! ## Dependency rule
//! Same as other adapters: depends on `homeguard-app` and `homeguard-domain`.

mod bridge;
mod config;
mod error;
pub mod message;

pub use bridge::MqttBridge;
pub use config::MqttConfig;
pub use error::MqttError;
