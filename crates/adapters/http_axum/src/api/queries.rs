//! Read-only endpoints: state snapshot, alarm telemetry and actuator records.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use homeguard_app::ports::{ActuatorStateStore, AlarmEventStore, SensorReadingStore};
use homeguard_domain::actuator::ActuatorRecord;
use homeguard_domain::alarm::AlarmEvent;
use homeguard_domain::error::{HomeGuardError, NotFoundError};
use homeguard_domain::home::HomeSnapshot;

use crate::error::ApiError;
use crate::state::AppState;

pub(crate) const DEFAULT_EVENT_LIMIT: usize = 100;
pub(crate) const MAX_EVENT_LIMIT: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

/// `GET /api/state`: full state snapshot.
pub async fn state<AS, RS, SS>(State(state): State<AppState<AS, RS, SS>>) -> Json<HomeSnapshot>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    Json(state.hub.snapshot())
}

/// `GET /api/alarm/events?limit=`: persisted alarm events, newest first.
pub async fn alarm_events<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<AlarmEvent>>, ApiError>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .min(MAX_EVENT_LIMIT);
    let events = state.alarm_store.recent(limit).await?;
    Ok(Json(events))
}

/// `GET /api/actuators`: latest record of every actuator.
pub async fn actuators<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
) -> Result<Json<Vec<ActuatorRecord>>, ApiError>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    let records = state.actuator_store.latest().await?;
    Ok(Json(records))
}

/// `GET /api/actuators/{code}`: latest record of one actuator.
pub async fn actuator<AS, RS, SS>(
    State(state): State<AppState<AS, RS, SS>>,
    Path(code): Path<String>,
) -> Result<Json<ActuatorRecord>, ApiError>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    let code = code.trim().to_ascii_uppercase();
    let record = state
        .actuator_store
        .latest_for(&code)
        .await?
        .ok_or_else(|| {
            HomeGuardError::from(NotFoundError {
                entity: "Actuator",
                id: code,
            })
        })?;
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use homeguard_domain::actuator::ActuatorCommand;
    use homeguard_domain::alarm::AlarmEdge;
    use homeguard_domain::time::now;

    use crate::test_support::{TestApp, failing_app};

    use super::*;

    #[tokio::test]
    async fn should_return_snapshot() {
        let app = TestApp::new();
        app.state.hub.activate_alarm(Some("gsg_tilt"));

        let (status, body) = app.get("/api/state").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alarm_active"], true);
        assert_eq!(body["alarm_reasons"][0], "gsg_tilt");
        assert_eq!(body["display_text"], "No DHT data");
    }

    #[tokio::test]
    async fn should_list_persisted_alarm_events_with_limit() {
        let app = TestApp::new();
        let events = (0..3)
            .map(|_| AlarmEvent::new(AlarmEdge::On, "manual", now()))
            .collect();
        app.state.alarm_store.store_batch(events).await.unwrap();

        let (status, body) = app.get("/api/alarm/events?limit=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["event"], "on");
    }

    #[tokio::test]
    async fn should_list_latest_actuator_records() {
        let app = TestApp::new();
        let record = ActuatorRecord::from_command("PI1", &ActuatorCommand::buzzer(true), true, now());
        app.state.actuator_store.record(record).await.unwrap();

        let (status, body) = app.get("/api/actuators").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["code"], "DB");
        assert_eq!(body[0]["value"]["state"], true);
    }

    #[tokio::test]
    async fn should_return_single_actuator_or_404() {
        let app = TestApp::new();
        for on in [true, false] {
            let record =
                ActuatorRecord::from_command("PI1", &ActuatorCommand::buzzer(on), true, now());
            app.state.actuator_store.record(record).await.unwrap();
        }

        let (status, body) = app.get("/api/actuators/db").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"]["state"], false);

        let (status, body) = app.get("/api/actuators/LCD").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Actuator `LCD` not found");
    }

    #[tokio::test]
    async fn should_return_500_when_store_fails() {
        let app = failing_app();

        let (status, body) = app.get("/api/alarm/events").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal server error");
    }
}
