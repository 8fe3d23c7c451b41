//! End-to-end smoke tests for the full homeguardd stack.
//!
//! Each test wires the complete application (in-memory `SQLite`, real stores,
//! the hub, the reconciler on virtual actuators, the real axum router) and
//! exercises the HTTP layer via `tower::ServiceExt::oneshot`: no TCP port is
//! bound. Reconciliation ticks are driven by hand.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use homeguard_adapter_http_axum::router;
use homeguard_adapter_http_axum::state::AppState;
use homeguard_adapter_storage_sqlite_sqlx::{
    Config, SqliteActuatorStateStore, SqliteAlarmEventStore, SqliteSensorReadingStore,
};
use homeguard_adapter_virtual::VirtualActuators;
use homeguard_app::event_bus::InProcessEventBus;
use homeguard_app::hub::HomeHub;
use homeguard_app::reconciler::{Reconciler, ReconcilerConfig};
use homeguard_domain::home::HomeState;

type TestReconciler = Reconciler<
    VirtualActuators,
    SqliteAlarmEventStore,
    SqliteActuatorStateStore,
    SqliteSensorReadingStore,
    InProcessEventBus,
>;

struct Stack {
    app: axum::Router,
    reconciler: TestReconciler,
    event_bus: InProcessEventBus,
}

/// Build a fully-wired stack backed by an in-memory `SQLite` database.
async fn stack() -> Stack {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");

    let hub = HomeHub::new(HomeState::default());
    let event_bus = InProcessEventBus::new(256);

    let reconciler = Reconciler::new(
        hub.clone(),
        VirtualActuators,
        db.alarm_event_store(),
        db.actuator_state_store(),
        db.sensor_reading_store(),
        event_bus.clone(),
        ReconcilerConfig::default(),
    );
    let state = AppState::new(
        hub,
        db.alarm_event_store(),
        db.actuator_state_store(),
        db.sensor_reading_store(),
        event_bus.clone(),
    );

    Stack {
        app: router::build(state),
        reconciler,
        event_bus,
    }
}

async fn call(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = body.map_or_else(Body::empty, |value| Body::from(value.to_string()));
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let stack = stack().await;
    let resp = stack
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Alarm flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_persist_alarm_edges_and_drive_buzzer() {
    let mut stack = stack().await;
    let mut events = stack.event_bus.subscribe();

    let (status, body) = call(
        &stack.app,
        Method::POST,
        "/api/readings",
        Some(json!({ "sensor": "GSG", "value": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "applied");

    let report = stack.reconciler.tick().await.unwrap();
    assert_eq!(report.alarm_events, 1);
    let (_, buzzer) = call(&stack.app, Method::GET, "/api/actuators/DB", None).await;
    assert_eq!(buzzer["value"], json!({ "state": true }));
    let first = events.recv().await.unwrap();
    assert_eq!(first.data["reason"], "gsg_tilt");

    let (status, body) = call(&stack.app, Method::POST, "/api/pin", Some(json!({ "code": "1234" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "disarmed");

    stack.reconciler.tick().await.unwrap();
    let (_, buzzer) = call(&stack.app, Method::GET, "/api/actuators/db", None).await;
    assert_eq!(buzzer["value"], json!({ "state": false }));

    let (status, body) = call(&stack.app, Method::GET, "/api/alarm/events", None).await;
    assert_eq!(status, StatusCode::OK);
    let edges: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    assert_eq!(edges, vec!["off", "on"]);
    assert_eq!(body[0]["reason"], "clear_all");
}

#[tokio::test]
async fn should_record_latest_actuator_states() {
    let mut stack = stack().await;

    call(
        &stack.app,
        Method::PUT,
        "/api/light",
        Some(json!({ "on": true, "color": "#00ff00" })),
    )
    .await;
    stack.reconciler.tick().await.unwrap();

    let (status, body) = call(&stack.app, Method::GET, "/api/actuators", None).await;
    assert_eq!(status, StatusCode::OK);
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 4);
    let rgb = records.iter().find(|r| r["code"] == "BRGB").unwrap();
    assert_eq!(rgb["value"], json!({ "state": true, "color": "#00ff00" }));
    assert_eq!(rgb["simulated"], true);
    assert_eq!(rgb["device_id"], "PI1");
}

#[tokio::test]
async fn should_send_manual_command_on_next_tick() {
    let mut stack = stack().await;
    stack.reconciler.tick().await.unwrap();

    let (status, body) = call(
        &stack.app,
        Method::POST,
        "/api/actuators/led",
        Some(json!({ "state": true })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["code"], "DL");
    let (status, _) = call(&stack.app, Method::GET, "/api/actuators/DL", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let report = stack.reconciler.tick().await.unwrap();
    assert_eq!(report.commands, 1);
    let (status, record) = call(&stack.app, Method::GET, "/api/actuators/DL", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["value"], json!({ "state": true }));
}

#[tokio::test]
async fn should_persist_raw_readings() {
    let mut stack = stack().await;

    for (sensor, value) in [("DHT1", json!({ "temperature": 21.5 })), ("zzz", json!(1))] {
        call(
            &stack.app,
            Method::POST,
            "/api/readings",
            Some(json!({ "sensor": sensor, "value": value })),
        )
        .await;
    }
    let report = stack.reconciler.tick().await.unwrap();
    assert_eq!(report.readings, 2);

    let (status, body) = call(&stack.app, Method::GET, "/api/readings?sensor=DHT1", None).await;
    assert_eq!(status, StatusCode::OK);
    let readings = body.as_array().unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0]["value"]["temperature"], 21.5);
    assert_eq!(readings[0]["applied"], true);

    let (_, body) = call(&stack.app, Method::GET, "/api/readings", None).await;
    let dropped = body
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["code"] == "ZZZ")
        .unwrap();
    assert_eq!(dropped["applied"], false);
}

// ---------------------------------------------------------------------------
// Scenarios and validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_run_scenario_and_reject_unknown_rule() {
    let stack = stack().await;

    let (status, body) = call(&stack.app, Method::POST, "/api/scenarios/gsg_tilt", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alarm_active"], true);

    let (status, _) = call(
        &stack.app,
        Method::PUT,
        "/api/rules/fire",
        Some(json!({ "enabled": false })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&stack.app, Method::GET, "/api/state", None).await;
    assert_eq!(body["alarm_reasons"], json!(["gsg_tilt"]));
}
