//! Reconciliation loop: keeps the actuators in step with the home state.
//!
//! Every tick evaluates the time rules, forwards drained alarm events and raw
//! sensor telemetry, then compares the alarm flag, the timer and the color
//! light against the values it last sent. Only changed values are sent to the
//! [`ActuatorSink`]. Manual commands queued on the hub go out as they are.
//! The door-light pulse and the text display rotation are driven by their own
//! deadlines on the tokio clock.
//!
//! A send that does not complete within `send_timeout` is abandoned so a
//! stalled device link cannot hold up the time rules.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use homeguard_domain::actuator::{ActuatorCommand, ActuatorRecord};
use homeguard_domain::alarm::AlarmEvent;
use homeguard_domain::error::HomeGuardError;
use homeguard_domain::event::{Event, EventType};
use homeguard_domain::light::ColorLight;
use homeguard_domain::telemetry::SensorReadingRecord;

use crate::hub::HomeHub;
use crate::ports::{
    ActuatorSink, ActuatorStateStore, AlarmEventStore, EventPublisher, SensorReadingStore,
};

/// Timing and identity of the reconciliation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Device id stamped on every actuator record.
    pub device_id: String,
    pub tick: Duration,
    pub display_rotation: Duration,
    /// How long the door light stays on after a pulse request.
    pub light_pulse: Duration,
    /// Upper bound on a single actuator send.
    pub send_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            device_id: "PI1".to_string(),
            tick: Duration::from_millis(250),
            display_rotation: Duration::from_secs(4),
            light_pulse: Duration::from_secs(10),
            send_timeout: Duration::from_secs(1),
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub alarm_events: usize,
    pub readings: usize,
    pub commands: usize,
}

/// Last values sent to each edge-triggered target.
#[derive(Debug, Default)]
struct Synced {
    alarm: Option<bool>,
    timer: Option<(u32, bool, bool)>,
    light: Option<ColorLight>,
}

pub struct Reconciler<S, A, R, T, P> {
    hub: HomeHub,
    sink: S,
    alarm_store: A,
    actuator_store: R,
    reading_store: T,
    publisher: P,
    config: ReconcilerConfig,
    synced: Synced,
    next_rotation: Option<Instant>,
    light_off_at: Option<Instant>,
}

impl<S, A, R, T, P> Reconciler<S, A, R, T, P>
where
    S: ActuatorSink + Send + Sync + 'static,
    A: AlarmEventStore + Send + Sync + 'static,
    R: ActuatorStateStore + Send + Sync + 'static,
    T: SensorReadingStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    pub fn new(
        hub: HomeHub,
        sink: S,
        alarm_store: A,
        actuator_store: R,
        reading_store: T,
        publisher: P,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            hub,
            sink,
            alarm_store,
            actuator_store,
            reading_store,
            publisher,
            config,
            synced: Synced::default(),
            next_rotation: None,
            light_off_at: None,
        }
    }

    /// Spawn the loop on the current runtime.
    pub fn start(self) -> JoinHandle<()> {
        tracing::info!(
            device_id = %self.config.device_id,
            tick_ms = self.config.tick.as_millis(),
            "reconciliation loop started"
        );
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let mut interval = tokio::time::interval(self.config.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(err) = self.tick().await {
                tracing::warn!(%err, "reconciliation tick failed, continuing");
            }
        }
    }

    /// Run one reconciliation pass.
    ///
    /// Actuator, telemetry and publisher failures are logged and do not
    /// abort the pass.
    ///
    /// # Errors
    ///
    /// Returns the [`AlarmEventStore`] error after the rest of the pass ran.
    /// The drained batch is not retried.
    pub async fn tick(&mut self) -> Result<TickReport, HomeGuardError> {
        let mut report = TickReport::default();

        self.hub.evaluate_time_rules();
        let events = self.hub.drain_alarm_events();
        report.alarm_events = events.len();
        let persisted = self.forward_alarm_events(events).await;

        let readings = self.hub.drain_readings();
        report.readings = readings.len();
        self.persist_readings(readings).await;

        let state = self.hub.sync_state();
        if self.synced.alarm != Some(state.alarm_active) {
            self.dispatch(ActuatorCommand::buzzer(state.alarm_active)).await;
            self.synced.alarm = Some(state.alarm_active);
            report.commands += 1;
        }
        let timer = (state.timer.seconds, state.timer.blink, state.timer.running);
        if self.synced.timer != Some(timer) {
            self.dispatch(ActuatorCommand::timer_display(&state.timer)).await;
            self.synced.timer = Some(timer);
            report.commands += 1;
        }
        if self.synced.light.as_ref() != Some(&state.color_light) {
            self.dispatch(ActuatorCommand::color_light(&state.color_light)).await;
            self.synced.light = Some(state.color_light);
            report.commands += 1;
        }

        for command in self.hub.drain_commands() {
            self.dispatch(command).await;
            report.commands += 1;
        }

        let now = Instant::now();
        if self.hub.take_light_pulse() {
            if self.light_off_at.is_none() {
                self.dispatch(ActuatorCommand::door_light(true)).await;
                report.commands += 1;
            }
            self.light_off_at = Some(now + self.config.light_pulse);
        } else if self.light_off_at.is_some_and(|at| now >= at) {
            self.light_off_at = None;
            self.dispatch(ActuatorCommand::door_light(false)).await;
            report.commands += 1;
        }

        if self.next_rotation.is_none_or(|at| now >= at) {
            let text = self.hub.next_display_text();
            self.dispatch(ActuatorCommand::text_display(&text)).await;
            self.next_rotation = Some(now + self.config.display_rotation);
            report.commands += 1;
        }

        persisted.map(|()| report)
    }

    async fn forward_alarm_events(&self, events: Vec<AlarmEvent>) -> Result<(), HomeGuardError> {
        if events.is_empty() {
            return Ok(());
        }
        for event in &events {
            self.publish(Event::at(
                EventType::AlarmChanged,
                serde_json::json!({
                    "event": event.event.as_str(),
                    "reason": event.reason,
                }),
                event.timestamp,
            ))
            .await;
        }
        self.alarm_store.store_batch(events).await
    }

    async fn persist_readings(&self, readings: Vec<SensorReadingRecord>) {
        if readings.is_empty() {
            return;
        }
        let count = readings.len();
        if let Err(err) = self.reading_store.store_batch(readings).await {
            tracing::warn!(%err, count, "failed to persist sensor readings");
        }
    }

    async fn dispatch(&self, command: ActuatorCommand) {
        let target = command.target;
        match tokio::time::timeout(self.config.send_timeout, self.sink.send(&command)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(%err, code = %target, "actuator command failed"),
            Err(_) => tracing::warn!(
                code = %target,
                timeout_ms = self.config.send_timeout.as_millis(),
                "actuator command timed out"
            ),
        }
        let record = ActuatorRecord::from_command(
            &self.config.device_id,
            &command,
            self.sink.is_simulated(),
            self.hub.now(),
        );
        if let Err(err) = self.actuator_store.record(record).await {
            tracing::warn!(%err, code = %target, "failed to record actuator state");
        }
        self.publish(Event::at(
            EventType::ActuatorCommanded,
            serde_json::json!({
                "code": target.code(),
                "name": target.device_name(),
                "value": command.payload,
            }),
            self.hub.now(),
        ))
        .await;
    }

    async fn publish(&self, event: Event) {
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(%err, "failed to publish hub event");
        }
    }
}
