//! Sensor ingestion over HTTP and the raw reading telemetry.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use homeguard_app::ingest::IngestOutcome;
use homeguard_app::ports::{ActuatorStateStore, AlarmEventStore, SensorReadingStore};
use homeguard_domain::telemetry::SensorReadingRecord;

use crate::api::queries::{DEFAULT_EVENT_LIMIT, MAX_EVENT_LIMIT};
use crate::error::ApiError;
use crate::state::AppState;

/// A raw reading as published by a sensor node.
#[derive(Debug, Deserialize)]
pub struct ReadingRequest {
    #[serde(alias = "code")]
    pub sensor: String,
    pub value: serde_json::Value,
}

/// `POST /api/readings`: apply one raw reading.
///
/// Unknown sensors and malformed values are not errors: the response reports
/// them as `dropped`, so a misbehaving node never sees a failure status.
pub async fn submit<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    Json(request): Json<ReadingRequest>,
) -> Json<IngestOutcome>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    Json(state.hub.submit_reading(&request.sensor, &request.value))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadingsQuery {
    pub sensor: Option<String>,
    pub limit: Option<usize>,
}

/// `GET /api/readings?sensor=&limit=`: persisted readings, newest first.
pub async fn recent<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    Query(query): Query<ReadingsQuery>,
) -> Result<Json<Vec<SensorReadingRecord>>, ApiError>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .min(MAX_EVENT_LIMIT);
    let sensor = query.sensor.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let readings = state.reading_store.recent(sensor, limit).await?;
    Ok(Json(readings))
}
