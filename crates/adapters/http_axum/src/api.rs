//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod alarm;
#[allow(clippy::missing_errors_doc)]
pub mod control;
#[allow(clippy::missing_errors_doc)]
pub mod queries;
#[allow(clippy::missing_errors_doc)]
pub mod readings;
#[allow(clippy::missing_errors_doc)]
pub mod scenarios;
pub mod sse;

use axum::Router;
use axum::body::Bytes;
use axum::routing::{get, post, put};
use serde::de::DeserializeOwned;

use homeguard_app::ports::{ActuatorStateStore, AlarmEventStore, SensorReadingStore};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<AS, RS, SS>() -> Router<AppState<AS, RS, SS>>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    Router::new()
        // Queries
        .route("/state", get(queries::state::<AS, RS, SS>))
        .route("/alarm/events", get(queries::alarm_events::<AS, RS, SS>))
        .route("/actuators", get(queries::actuators::<AS, RS, SS>))
        .route(
            "/actuators/{code}",
            get(queries::actuator::<AS, RS, SS>).post(control::command_actuator::<AS, RS, SS>),
        )
        .route("/events/stream", get(sse::stream::<AS, RS, SS>))
        // Sensor ingestion and telemetry
        .route(
            "/readings",
            get(readings::recent::<AS, RS, SS>).post(readings::submit::<AS, RS, SS>),
        )
        // Alarm and access control
        .route("/alarm/arm", post(alarm::arm::<AS, RS, SS>))
        .route("/alarm/disarm", post(alarm::disarm::<AS, RS, SS>))
        .route("/alarm/activate", post(alarm::activate::<AS, RS, SS>))
        .route("/alarm/deactivate", post(alarm::deactivate::<AS, RS, SS>))
        .route("/pin", post(alarm::pin::<AS, RS, SS>))
        .route("/rules/{name}", put(alarm::set_rule::<AS, RS, SS>))
        // Kitchen timer
        .route("/timer/set", post(control::set_timer::<AS, RS, SS>))
        .route("/timer/add", post(control::add_timer::<AS, RS, SS>))
        .route("/timer/step", put(control::set_timer_step::<AS, RS, SS>))
        .route("/timer/start", post(control::start_timer::<AS, RS, SS>))
        .route("/timer/stop", post(control::stop_timer::<AS, RS, SS>))
        .route("/timer/ack", post(control::ack_timer::<AS, RS, SS>))
        // Color light
        .route("/light", put(control::set_light::<AS, RS, SS>))
        // Scenarios
        .route("/scenarios/{name}", post(scenarios::trigger::<AS, RS, SS>))
}

/// Parse an optional JSON body; an empty body yields `T::default()`.
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|err| ApiError::BadRequest(err.to_string()))
}
