//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the hub and the adapter layer
//! can depend on them without creating circular dependencies.

pub mod actuator_sink;
pub mod actuator_store;
pub mod alarm_store;
pub mod event_bus;
pub mod reading_store;

pub use actuator_sink::ActuatorSink;
pub use actuator_store::ActuatorStateStore;
pub use alarm_store::AlarmEventStore;
pub use event_bus::EventPublisher;
pub use reading_store::SensorReadingStore;
