//! In-memory stores and a request helper shared by the handler tests.

use std::sync::Mutex;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use homeguard_app::event_bus::InProcessEventBus;
use homeguard_app::hub::HomeHub;
use homeguard_app::ports::{ActuatorStateStore, AlarmEventStore, SensorReadingStore};
use homeguard_domain::actuator::ActuatorRecord;
use homeguard_domain::alarm::AlarmEvent;
use homeguard_domain::error::HomeGuardError;
use homeguard_domain::home::HomeState;
use homeguard_domain::telemetry::SensorReadingRecord;

use crate::state::AppState;

#[derive(Default)]
pub struct InMemoryAlarmStore {
    events: Mutex<Vec<AlarmEvent>>,
}

impl AlarmEventStore for InMemoryAlarmStore {
    async fn store_batch(&self, events: Vec<AlarmEvent>) -> Result<(), HomeGuardError> {
        self.events.lock().unwrap().extend(events);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AlarmEvent>, HomeGuardError> {
        let events = self.events.lock().unwrap();
        Ok(events.iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryActuatorStore {
    records: Mutex<Vec<ActuatorRecord>>,
}

impl ActuatorStateStore for InMemoryActuatorStore {
    async fn record(&self, record: ActuatorRecord) -> Result<ActuatorRecord, HomeGuardError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn latest(&self) -> Result<Vec<ActuatorRecord>, HomeGuardError> {
        let records = self.records.lock().unwrap();
        let mut latest: Vec<ActuatorRecord> = Vec::new();
        for record in records.iter().rev() {
            if !latest.iter().any(|r| r.code == record.code) {
                latest.push(record.clone());
            }
        }
        latest.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(latest)
    }

    async fn latest_for(&self, code: &str) -> Result<Option<ActuatorRecord>, HomeGuardError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().rev().find(|r| r.code == code).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryReadingStore {
    readings: Mutex<Vec<SensorReadingRecord>>,
}

impl SensorReadingStore for InMemoryReadingStore {
    async fn store_batch(&self, readings: Vec<SensorReadingRecord>) -> Result<(), HomeGuardError> {
        self.readings.lock().unwrap().extend(readings);
        Ok(())
    }

    async fn recent(
        &self,
        code: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SensorReadingRecord>, HomeGuardError> {
        let readings = self.readings.lock().unwrap();
        Ok(readings
            .iter()
            .rev()
            .filter(|r| code.is_none_or(|code| r.code.eq_ignore_ascii_case(code)))
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Store whose every call fails.
pub struct FailingStore;

impl AlarmEventStore for FailingStore {
    async fn store_batch(&self, _events: Vec<AlarmEvent>) -> Result<(), HomeGuardError> {
        Err(HomeGuardError::Storage("disk full".into()))
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<AlarmEvent>, HomeGuardError> {
        Err(HomeGuardError::Storage("disk full".into()))
    }
}

impl ActuatorStateStore for FailingStore {
    async fn record(&self, _record: ActuatorRecord) -> Result<ActuatorRecord, HomeGuardError> {
        Err(HomeGuardError::Storage("disk full".into()))
    }

    async fn latest(&self) -> Result<Vec<ActuatorRecord>, HomeGuardError> {
        Err(HomeGuardError::Storage("disk full".into()))
    }

    async fn latest_for(&self, _code: &str) -> Result<Option<ActuatorRecord>, HomeGuardError> {
        Err(HomeGuardError::Storage("disk full".into()))
    }
}

impl SensorReadingStore for FailingStore {
    async fn store_batch(&self, _readings: Vec<SensorReadingRecord>) -> Result<(), HomeGuardError> {
        Err(HomeGuardError::Storage("disk full".into()))
    }

    async fn recent(
        &self,
        _code: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<SensorReadingRecord>, HomeGuardError> {
        Err(HomeGuardError::Storage("disk full".into()))
    }
}

/// A router over in-memory state plus JSON request helpers.
pub struct TestApp<AS, RS, SS> {
    pub state: AppState<AS, RS, SS>,
    router: Router,
}

impl TestApp<InMemoryAlarmStore, InMemoryActuatorStore, InMemoryReadingStore> {
    pub fn new() -> Self {
        Self::with_stores(
            InMemoryAlarmStore::default(),
            InMemoryActuatorStore::default(),
            InMemoryReadingStore::default(),
        )
    }
}

pub fn failing_app() -> TestApp<FailingStore, FailingStore, FailingStore> {
    TestApp::with_stores(FailingStore, FailingStore, FailingStore)
}

impl<AS, RS, SS> TestApp<AS, RS, SS>
where
    AS: AlarmEventStore + Send + Sync + 'static,
    RS: ActuatorStateStore + Send + Sync + 'static,
    SS: SensorReadingStore + Send + Sync + 'static,
{
    pub fn with_stores(alarm_store: AS, actuator_store: RS, reading_store: SS) -> Self {
        let state = AppState::new(
            HomeHub::new(HomeState::default()),
            alarm_store,
            actuator_store,
            reading_store,
            InProcessEventBus::new(16),
        );
        let router = crate::router::build(state.clone());
        Self { state, router }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(Method::GET, uri, Body::empty()).await
    }

    pub async fn post(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.send(Method::POST, uri, Body::from(body.to_string()))
            .await
    }

    pub async fn post_empty(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(Method::POST, uri, Body::empty()).await
    }

    pub async fn put(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.send(Method::PUT, uri, Body::from(body.to_string()))
            .await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Body,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, json)
    }
}
