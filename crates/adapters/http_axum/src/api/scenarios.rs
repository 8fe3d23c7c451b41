//! Manual scenario triggers for demos and drills.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};

use homeguard_app::ports::{ActuatorStateStore, AlarmEventStore, SensorReadingStore};
use homeguard_domain::scenario::ScenarioReport;

use crate::api::optional_json;
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/scenarios/{name}`: run a scenario; the body (`{"sensor": ..}`)
/// is optional.
pub async fn trigger<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<ScenarioReport>, ApiError>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    let params: serde_json::Value = optional_json(&body)?;
    let report = state.hub.trigger_scenario(&name, &params)?;
    Ok(Json(report))
}
