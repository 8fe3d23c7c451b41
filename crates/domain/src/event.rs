//! Event: an immutable record of something the hub did.
//!
//! Events are fanned out on the in-process bus so that adapters (the SSE
//! stream, for instance) can observe alarm edges and actuator traffic
//! without polling.

use serde::{Deserialize, Serialize};

use crate::id::EventId;
use crate::time::{Timestamp, now};

/// Kind of hub event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The alarm turned on or off.
    AlarmChanged,
    /// A command was sent to an actuator.
    ActuatorCommanded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub timestamp: Timestamp,
    pub data: serde_json::Value,
}

impl Event {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(event_type: EventType, data: serde_json::Value) -> Self {
        Self::at(event_type, data, now())
    }

    /// Create an event with an explicit timestamp.
    #[must_use]
    pub fn at(event_type: EventType, data: serde_json::Value, timestamp: Timestamp) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            timestamp,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_assign_unique_ids() {
        let a = Event::new(EventType::AlarmChanged, serde_json::json!({}));
        let b = Event::new(EventType::AlarmChanged, serde_json::json!({}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn should_serialize_type_in_snake_case() {
        let event = Event::new(EventType::ActuatorCommanded, serde_json::json!({"code": "DB"}));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "actuator_commanded");
        assert_eq!(json["data"]["code"], "DB");
    }
}
