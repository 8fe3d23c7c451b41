//! Kitchen timer, color light and manual actuator endpoints.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use homeguard_app::ports::{ActuatorStateStore, AlarmEventStore, SensorReadingStore};
use homeguard_domain::home::HomeSnapshot;
use homeguard_domain::light::ColorLight;

use crate::api::optional_json;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SecondsRequest {
    pub seconds: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct LightRequest {
    #[serde(default)]
    pub on: Option<bool>,
    #[serde(default)]
    pub color: Option<String>,
}

/// `POST /api/timer/set`: set the remaining time; negative values clamp to 0.
pub async fn set_timer<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    Json(request): Json<SecondsRequest>,
) -> Json<HomeSnapshot>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    state.hub.set_timer(request.seconds);
    Json(state.hub.snapshot())
}

/// `POST /api/timer/add`: add (or subtract) seconds.
pub async fn add_timer<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    Json(request): Json<SecondsRequest>,
) -> Json<HomeSnapshot>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    state.hub.add_timer(request.seconds);
    Json(state.hub.snapshot())
}

/// `PUT /api/timer/step`: seconds added per button press.
pub async fn set_timer_step<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    Json(request): Json<SecondsRequest>,
) -> Json<HomeSnapshot>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    state.hub.set_timer_step(request.seconds);
    Json(state.hub.snapshot())
}

/// `POST /api/timer/start`
pub async fn start_timer<AS, RS, SS>(State(state): State<AppState<AS, RS, SS>>) -> Json<HomeSnapshot>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    state.hub.start_timer();
    Json(state.hub.snapshot())
}

/// `POST /api/timer/stop`
pub async fn stop_timer<AS, RS, SS>(State(state): State<AppState<AS, RS, SS>>) -> Json<HomeSnapshot>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    state.hub.stop_timer();
    Json(state.hub.snapshot())
}

/// `POST /api/timer/ack`: silence the finished-timer blink.
pub async fn ack_timer<AS, RS, SS>(State(state): State<AppState<AS, RS, SS>>) -> Json<HomeSnapshot>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    state.hub.ack_timer_blink();
    Json(state.hub.snapshot())
}

/// Echo of a queued manual command.
#[derive(Debug, Serialize)]
pub struct CommandQueued {
    pub code: &'static str,
    pub name: &'static str,
    pub payload: serde_json::Value,
}

/// `POST /api/actuators/{code}`: forward a raw payload to one actuator.
///
/// The command is queued and sent on the next reconciliation tick, hence
/// `202 Accepted`. An empty body sends `{}`.
pub async fn command_actuator<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    Path(code): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<CommandQueued>), ApiError>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    let payload: serde_json::Value = optional_json(&body)?;
    let payload = if payload.is_null() {
        serde_json::json!({})
    } else {
        payload
    };
    let command = state.hub.command_actuator(&code, payload)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CommandQueued {
            code: command.target.code(),
            name: command.target.device_name(),
            payload: command.payload,
        }),
    ))
}

/// `PUT /api/light`: partial update of the color light.
pub async fn set_light<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    Json(request): Json<LightRequest>,
) -> Json<ColorLight>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    state
        .hub
        .set_color_light(request.on, request.color.as_deref());
    Json(state.hub.snapshot().color_light)
}
