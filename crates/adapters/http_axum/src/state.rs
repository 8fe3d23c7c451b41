//! Shared application state for axum handlers.

use std::sync::Arc;

use homeguard_app::event_bus::InProcessEventBus;
use homeguard_app::hub::HomeHub;
use homeguard_app::ports::{ActuatorStateStore, AlarmEventStore, SensorReadingStore};

/// Application state shared across all axum handlers.
///
/// Generic over the three store types to avoid dynamic dispatch. `Clone` is
/// implemented manually so the stores themselves do not need to be `Clone`.
pub struct AppState<AS, RS, SS> {
    /// The home hub every command and query goes through.
    pub hub: HomeHub,
    /// Persisted alarm telemetry.
    pub alarm_store: Arc<AS>,
    /// Persisted actuator-state records.
    pub actuator_store: Arc<RS>,
    /// Persisted raw sensor telemetry.
    pub reading_store: Arc<SS>,
    /// Event bus for SSE subscriptions.
    pub event_bus: InProcessEventBus,
}

impl<AS, RS, SS> Clone for AppState<AS, RS, SS> {
    fn clone(&self) -> Self {
        Self {
            hub: self.hub.clone(),
            alarm_store: Arc::clone(&self.alarm_store),
            actuator_store: Arc::clone(&self.actuator_store),
            reading_store: Arc::clone(&self.reading_store),
            event_bus: self.event_bus.clone(),
        }
    }
}

impl<AS, RS, SS> AppState<AS, RS, SS>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    /// Create a new application state.
    pub fn new(
        hub: HomeHub,
        alarm_store: AS,
        actuator_store: RS,
        reading_store: SS,
        event_bus: InProcessEventBus,
    ) -> Self {
        Self::from_arcs(
            hub,
            Arc::new(alarm_store),
            Arc::new(actuator_store),
            Arc::new(reading_store),
            event_bus,
        )
    }

    /// Create a new application state from stores already shared with
    /// background tasks.
    pub fn from_arcs(
        hub: HomeHub,
        alarm_store: Arc<AS>,
        actuator_store: Arc<RS>,
        reading_store: Arc<SS>,
        event_bus: InProcessEventBus,
    ) -> Self {
        Self {
            hub,
            alarm_store,
            actuator_store,
            reading_store,
            event_bus,
        }
    }
}
