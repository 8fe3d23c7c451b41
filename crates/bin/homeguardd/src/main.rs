//! # homeguardd: homeguard daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`homeguard.toml` plus env overrides)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Build the home hub and the in-process event bus
//! - Pick the actuator sink (MQTT bridge or virtual actuators) and spawn the
//!   reconciliation loop on it
//! - Build the axum router, bind and serve until SIGINT/SIGTERM
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use homeguard_adapter_http_axum::router;
use homeguard_adapter_http_axum::state::AppState;
use homeguard_adapter_mqtt::MqttBridge;
use homeguard_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteActuatorStateStore, SqliteAlarmEventStore,
    SqliteSensorReadingStore,
};
use homeguard_adapter_virtual::VirtualActuators;
use homeguard_app::event_bus::InProcessEventBus;
use homeguard_app::hub::HomeHub;
use homeguard_app::ports::ActuatorSink;
use homeguard_app::reconciler::{Reconciler, ReconcilerConfig};

use crate::config::Config;

const EVENT_BUS_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .with_context(|| format!("failed to open database {}", config.database_url()))?;
    let alarm_store = db.alarm_event_store();
    let actuator_store = db.actuator_state_store();
    let reading_store = db.sensor_reading_store();

    // Core
    let hub = HomeHub::from_config(config.home_config()).context("invalid home configuration")?;
    let event_bus = InProcessEventBus::new(EVENT_BUS_CAPACITY);

    // Actuators and reconciliation
    let mut tasks = Vec::new();
    if config.mqtt.enabled {
        let (bridge, listener) = MqttBridge::start(&config.mqtt, hub.clone());
        tasks.push(listener);
        tasks.push(start_reconciler(
            bridge,
            &hub,
            &alarm_store,
            &actuator_store,
            &reading_store,
            &event_bus,
            config.reconciler_config(),
        ));
    } else {
        tracing::info!("MQTT disabled, driving virtual actuators");
        tasks.push(start_reconciler(
            VirtualActuators,
            &hub,
            &alarm_store,
            &actuator_store,
            &reading_store,
            &event_bus,
            config.reconciler_config(),
        ));
    }

    // HTTP
    let state = AppState::new(hub, alarm_store, actuator_store, reading_store, event_bus);
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, "homeguardd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    for task in tasks {
        task.abort();
    }
    tracing::info!("homeguardd stopped");
    Ok(())
}

fn start_reconciler<S>(
    sink: S,
    hub: &HomeHub,
    alarm_store: &SqliteAlarmEventStore,
    actuator_store: &SqliteActuatorStateStore,
    reading_store: &SqliteSensorReadingStore,
    event_bus: &InProcessEventBus,
    config: ReconcilerConfig,
) -> JoinHandle<()>
where
    S: ActuatorSink + Send + Sync + 'static,
{
    Reconciler::new(
        hub.clone(),
        sink,
        alarm_store.clone(),
        actuator_store.clone(),
        reading_store.clone(),
        event_bus.clone(),
        config,
    )
    .start()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
