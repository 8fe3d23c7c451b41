//! Alarm, arming, PIN and rule endpoints.

use std::collections::BTreeMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use homeguard_app::ingest::PinResult;
use homeguard_app::ports::{ActuatorStateStore, AlarmEventStore, SensorReadingStore};
use homeguard_domain::home::{HomeSnapshot, PinOutcome};

use crate::api::optional_json;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ActivateRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// A PIN sent either as a string or as a bare number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PinCode {
    Text(String),
    Number(u64),
}

impl PinCode {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub code: PinCode,
}

#[derive(Debug, Deserialize)]
pub struct RuleRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ArmBody {
    pub scheduled: bool,
}

#[derive(Debug, Serialize)]
pub struct PinBody {
    pub result: PinResult,
    pub entry_delay_cancelled: bool,
}

/// Possible responses from the arm endpoint.
pub enum ArmResponse {
    Scheduled(Json<ArmBody>),
    Unchanged(Json<ArmBody>),
}

impl IntoResponse for ArmResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Scheduled(json) => (StatusCode::ACCEPTED, json).into_response(),
            Self::Unchanged(json) => json.into_response(),
        }
    }
}

/// Possible responses from the PIN endpoint.
pub enum PinResponse {
    Accepted(Json<PinBody>),
    Rejected(Json<PinBody>),
}

impl IntoResponse for PinResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted(json) => json.into_response(),
            Self::Rejected(json) => (StatusCode::FORBIDDEN, json).into_response(),
        }
    }
}

/// `POST /api/alarm/arm`: schedule arming after the arm delay.
pub async fn arm<AS, RS, SS>(State(state): State<AppState<AS, RS, SS>>) -> ArmResponse
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    if state.hub.arm() {
        ArmResponse::Scheduled(Json(ArmBody { scheduled: true }))
    } else {
        ArmResponse::Unchanged(Json(ArmBody { scheduled: false }))
    }
}

/// `POST /api/alarm/disarm`
pub async fn disarm<AS, RS, SS>(State(state): State<AppState<AS, RS, SS>>) -> Json<HomeSnapshot>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    state.hub.disarm();
    Json(state.hub.snapshot())
}

/// `POST /api/alarm/activate`: raise an alarm reason, `manual` by default.
pub async fn activate<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    body: Bytes,
) -> Result<Json<HomeSnapshot>, ApiError>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    let request: ActivateRequest = optional_json(&body)?;
    let reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    state.hub.activate_alarm(reason);
    Ok(Json(state.hub.snapshot()))
}

/// `POST /api/alarm/deactivate`: clear every alarm reason.
pub async fn deactivate<AS, RS, SS>(State(state): State<AppState<AS, RS, SS>>) -> Json<HomeSnapshot>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    state.hub.deactivate_alarm();
    Json(state.hub.snapshot())
}

/// `POST /api/pin`: verify a complete PIN.
pub async fn pin<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    Json(request): Json<PinRequest>,
) -> PinResponse
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    let outcome = state.hub.enter_pin(&request.code.into_string());
    let entry_delay_cancelled = matches!(
        outcome,
        PinOutcome::Accepted {
            entry_delay_cancelled: true,
            ..
        }
    );
    let body = Json(PinBody {
        result: PinResult::from(&outcome),
        entry_delay_cancelled,
    });
    match outcome {
        PinOutcome::Rejected => PinResponse::Rejected(body),
        _ => PinResponse::Accepted(body),
    }
}

/// `PUT /api/rules/{name}`: enable or disable an alarm rule.
pub async fn set_rule<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    Path(name): Path<String>,
    Json(request): Json<RuleRequest>,
) -> Result<Json<BTreeMap<String, bool>>, ApiError>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    state.hub.set_rule_enabled(&name, request.enabled)?;
    Ok(Json(state.hub.snapshot().alarm_rules))
}
