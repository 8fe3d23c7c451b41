//! The home hub: the one object that owns [`HomeState`].
//!
//! Request handlers, the ingestion dispatcher and the reconciliation loop all
//! hold a clone of the same [`HomeHub`]. Every operation takes the lock,
//! applies a pure domain operation stamped with the hub's clock and releases
//! the lock before any await point.
//!
//! Timed behaviour is spawned here: an accepted arm request sleeps for the
//! arm delay and then redeems its ticket; a started countdown ticks once per
//! second until its ticket goes stale or the timer finishes.
//!
//! Two outboxes sit beside the state: raw sensor telemetry waiting to be
//! persisted and manual actuator commands waiting for the next tick. Both
//! are drained by the reconciliation loop, so no caller waits on IO.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use homeguard_domain::actuator::{ActuatorCommand, ActuatorTarget};
use homeguard_domain::alarm::{AlarmEdge, AlarmEvent};
use homeguard_domain::arming::ArmTicket;
use homeguard_domain::config::HomeConfig;
use homeguard_domain::error::HomeGuardError;
use homeguard_domain::home::{HomeSnapshot, HomeState, PinAction, PinOutcome, TimeRuleOutcome};
use homeguard_domain::light::ColorLight;
use homeguard_domain::rules::AlarmRule;
use homeguard_domain::scenario::{Scenario, ScenarioReport};
use homeguard_domain::telemetry::{
    COMMAND_QUEUE_CAPACITY, Outbox, READING_OUTBOX_CAPACITY, SensorReadingRecord,
};
use homeguard_domain::time::Timestamp;
use homeguard_domain::timer::{TimerStatus, TimerTick, TimerTicket};

use crate::clock::Clock;

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// The values the reconciliation loop compares between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub alarm_active: bool,
    pub timer: TimerStatus,
    pub color_light: ColorLight,
}

/// Shared handle on the home state.
#[derive(Debug, Clone)]
pub struct HomeHub {
    state: Arc<Mutex<HomeState>>,
    readings: Arc<Mutex<Outbox<SensorReadingRecord>>>,
    commands: Arc<Mutex<Outbox<ActuatorCommand>>>,
    clock: Clock,
    arm_delay: Duration,
}

impl HomeHub {
    /// Wrap an initial state.
    #[must_use]
    pub fn new(state: HomeState) -> Self {
        let arm_delay =
            Duration::try_from_secs_f64(state.config().arm_delay_secs).unwrap_or_default();
        Self {
            state: Arc::new(Mutex::new(state)),
            readings: Arc::new(Mutex::new(Outbox::with_capacity(READING_OUTBOX_CAPACITY))),
            commands: Arc::new(Mutex::new(Outbox::with_capacity(COMMAND_QUEUE_CAPACITY))),
            clock: Clock::start(),
            arm_delay,
        }
    }

    /// Build a hub from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HomeGuardError::Validation`] when the PIN is malformed.
    pub fn from_config(config: HomeConfig) -> Result<Self, HomeGuardError> {
        Ok(Self::new(HomeState::new(config)?))
    }

    /// Current timestamp on the hub's clock.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn lock(&self) -> MutexGuard<'_, HomeState> {
        lock(&self.state)
    }

    /// Run `f` under the lock with the current timestamp.
    pub(crate) fn with_state<T>(&self, f: impl FnOnce(&mut HomeState, Timestamp) -> T) -> T {
        let now = self.clock.now();
        let mut state = self.lock();
        f(&mut state, now)
    }

    // -- alarm and arming ----------------------------------------------------

    /// Request arming. Returns `false` when already armed or pending.
    pub fn arm(&self) -> bool {
        match self.with_state(|state, _| state.request_arm()) {
            Some(ticket) => {
                tracing::info!(delay_secs = self.arm_delay.as_secs_f64(), "arming scheduled");
                self.schedule_arm(ticket);
                true
            }
            None => {
                tracing::debug!("arm request ignored, already armed or pending");
                false
            }
        }
    }

    /// Clear armed and pending flags; an outstanding arm delay becomes stale.
    pub fn disarm(&self) {
        self.with_state(|state, _| state.disarm());
        tracing::info!("system disarmed");
    }

    /// Add an alarm reason, `"manual"` when none is given.
    pub fn activate_alarm(&self, reason: Option<&str>) {
        let event = self.with_state(|state, now| state.activate_alarm(reason, now));
        log_alarm_edge(event.as_ref());
    }

    /// Clear every alarm reason.
    pub fn deactivate_alarm(&self) {
        let event = self.with_state(|state, now| state.deactivate_alarm(None, now));
        log_alarm_edge(event.as_ref());
    }

    /// Verify a complete PIN.
    pub fn enter_pin(&self, code: &str) -> PinOutcome {
        let outcome = self.with_state(|state, now| state.enter_pin(code, now));
        self.after_pin(&outcome);
        outcome
    }

    pub(crate) fn after_pin(&self, outcome: &PinOutcome) {
        match outcome {
            PinOutcome::Pending(_) => {}
            PinOutcome::Rejected => tracing::warn!("wrong PIN"),
            PinOutcome::Accepted {
                entry_delay_cancelled,
                action,
            } => {
                if *entry_delay_cancelled {
                    tracing::info!("PIN ok, entry delay cancelled");
                }
                match action {
                    PinAction::Disarmed => tracing::info!("PIN ok, alarm cleared and system disarmed"),
                    PinAction::Arming(ticket) => {
                        tracing::info!(
                            delay_secs = self.arm_delay.as_secs_f64(),
                            "PIN ok, arming scheduled"
                        );
                        self.schedule_arm(*ticket);
                    }
                    PinAction::AlreadyArming => tracing::debug!("PIN ok, already armed or arming"),
                }
            }
        }
    }

    fn schedule_arm(&self, ticket: ArmTicket) {
        let hub = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(hub.arm_delay).await;
            if hub.with_state(|state, _| state.complete_arm(ticket)) {
                tracing::info!("system armed");
            } else {
                tracing::debug!("arm request superseded");
            }
        });
    }

    /// Enable or disable an alarm rule by name.
    ///
    /// # Errors
    ///
    /// Returns [`HomeGuardError::Validation`] for an unknown rule name.
    pub fn set_rule_enabled(&self, name: &str, enabled: bool) -> Result<(), HomeGuardError> {
        let rule: AlarmRule = name.parse()?;
        let event = self.with_state(|state, now| state.set_rule(rule, enabled, now));
        tracing::info!(%rule, enabled, "alarm rule updated");
        log_alarm_edge(event.as_ref());
        Ok(())
    }

    /// Run a named scenario.
    ///
    /// # Errors
    ///
    /// Returns [`HomeGuardError::Validation`] for an unknown scenario or a
    /// sensor that does not fit it; nothing is mutated in that case.
    pub fn trigger_scenario(
        &self,
        name: &str,
        params: &serde_json::Value,
    ) -> Result<ScenarioReport, HomeGuardError> {
        let scenario = Scenario::parse(name, params)?;
        let report = self.with_state(|state, now| state.run_scenario(scenario, now));
        tracing::info!(
            scenario = report.scenario,
            sensor = report.sensor,
            alarm_active = report.alarm_active,
            "scenario triggered"
        );
        Ok(report)
    }

    // -- kitchen timer -------------------------------------------------------

    pub fn set_timer(&self, seconds: i64) {
        self.with_state(|state, _| state.set_timer(seconds));
    }

    pub fn add_timer(&self, seconds: i64) {
        self.with_state(|state, _| state.add_timer(seconds));
    }

    pub fn set_timer_step(&self, seconds: i64) {
        self.with_state(|state, _| state.set_timer_step(seconds));
    }

    /// Start the countdown. Returns `false` when running or at zero.
    pub fn start_timer(&self) -> bool {
        let Some(ticket) = self.with_state(|state, _| state.start_timer()) else {
            return false;
        };
        self.spawn_countdown(ticket);
        true
    }

    pub fn stop_timer(&self) {
        self.with_state(|state, _| state.stop_timer());
    }

    pub fn ack_timer_blink(&self) {
        self.with_state(|state, _| state.ack_timer_blink());
    }

    fn spawn_countdown(&self, ticket: TimerTicket) {
        let hub = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(COUNTDOWN_STEP).await;
                match hub.with_state(|state, _| state.timer_tick(ticket)) {
                    TimerTick::Continue => {}
                    TimerTick::Finished => {
                        tracing::info!("kitchen timer finished");
                        break;
                    }
                    TimerTick::Stale => break,
                }
            }
        });
    }

    // -- light ---------------------------------------------------------------

    /// Apply only the provided fields to the color light.
    pub fn set_color_light(&self, on: Option<bool>, color: Option<&str>) {
        self.with_state(|state, _| state.set_color_light(on, color));
    }

    // -- manual actuator commands --------------------------------------------

    /// Queue an operator payload for the actuator named by `code`.
    ///
    /// The command is sent on the next reconciliation tick.
    ///
    /// # Errors
    ///
    /// Returns [`HomeGuardError::Validation`] for an unknown actuator.
    pub fn command_actuator(
        &self,
        code: &str,
        payload: serde_json::Value,
    ) -> Result<ActuatorCommand, HomeGuardError> {
        let target: ActuatorTarget = code.parse()?;
        let command = ActuatorCommand::manual(target, payload);
        if lock(&self.commands).push(command.clone()) {
            tracing::warn!(code = %target, "command queue full, oldest command dropped");
        }
        tracing::info!(code = %target, payload = %command.payload, "manual actuator command queued");
        Ok(command)
    }

    pub fn drain_commands(&self) -> Vec<ActuatorCommand> {
        lock(&self.commands).drain()
    }

    // -- telemetry -----------------------------------------------------------

    pub(crate) fn record_reading(&self, code: &str, value: &serde_json::Value, applied: bool) {
        let record = SensorReadingRecord::new(code, value.clone(), applied, self.clock.now());
        if lock(&self.readings).push(record) {
            tracing::warn!("reading outbox full, oldest reading dropped");
        }
    }

    pub fn drain_readings(&self) -> Vec<SensorReadingRecord> {
        lock(&self.readings).drain()
    }

    // -- queries and reconciliation support ----------------------------------

    #[must_use]
    pub fn snapshot(&self) -> HomeSnapshot {
        self.with_state(|state, now| state.snapshot(now))
    }

    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.with_state(|state, _| SyncState {
            alarm_active: state.is_alarm_active(),
            timer: state.timer_status(),
            color_light: state.color_light().clone(),
        })
    }

    /// Evaluate entry-delay expiry and door timeouts.
    pub fn evaluate_time_rules(&self) -> TimeRuleOutcome {
        let outcome = self.with_state(HomeState::evaluate_time_rules);
        if let Some(sensor) = outcome.entry_delay_expired {
            tracing::warn!(%sensor, "entry delay expired");
        }
        log_alarm_edge(outcome.alarm_event.as_ref());
        outcome
    }

    pub fn drain_alarm_events(&self) -> Vec<AlarmEvent> {
        self.with_state(|state, _| state.drain_alarm_events())
    }

    pub fn take_light_pulse(&self) -> bool {
        self.with_state(|state, _| state.take_light_pulse())
    }

    pub fn next_display_text(&self) -> String {
        self.with_state(|state, _| state.next_display_text())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn log_alarm_edge(event: Option<&AlarmEvent>) {
    match event {
        Some(event) if event.event == AlarmEdge::On => {
            tracing::warn!(reason = %event.reason, "alarm activated");
        }
        Some(event) => tracing::info!(reason = %event.reason, "alarm deactivated"),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use homeguard_domain::error::ValidationError;

    use super::*;

    fn hub() -> HomeHub {
        HomeHub::new(HomeState::default())
    }

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn should_arm_only_after_delay() {
        let hub = hub();
        assert!(hub.arm());
        assert!(!hub.arm());
        advance(9).await;
        let snapshot = hub.snapshot();
        assert!(snapshot.pending_arm);
        assert!(!snapshot.system_armed);
        advance(2).await;
        let snapshot = hub.snapshot();
        assert!(!snapshot.pending_arm);
        assert!(snapshot.system_armed);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_arm_early_when_disarmed_and_rearmed() {
        let hub = hub();
        hub.arm();
        advance(5).await;
        hub.disarm();
        advance(1).await;
        hub.arm();
        advance(5).await;
        assert!(!hub.snapshot().system_armed, "stale wake-up must not arm");
        advance(6).await;
        assert!(hub.snapshot().system_armed);
    }

    #[tokio::test(start_paused = true)]
    async fn should_stay_disarmed_when_disarmed_during_delay() {
        let hub = hub();
        hub.arm();
        advance(3).await;
        hub.disarm();
        advance(20).await;
        let snapshot = hub.snapshot();
        assert!(!snapshot.system_armed);
        assert!(!snapshot.pending_arm);
    }

    #[tokio::test(start_paused = true)]
    async fn should_schedule_arm_when_pin_entered_while_idle() {
        let hub = hub();
        let outcome = hub.enter_pin("1234");
        assert!(matches!(
            outcome,
            PinOutcome::Accepted {
                action: PinAction::Arming(_),
                ..
            }
        ));
        advance(11).await;
        assert!(hub.snapshot().system_armed);
    }

    #[tokio::test(start_paused = true)]
    async fn should_finish_countdown_with_blink() {
        let hub = hub();
        hub.set_timer(90);
        assert!(hub.start_timer());
        tokio::time::sleep(Duration::from_millis(45_500)).await;
        assert_eq!(hub.snapshot().timer_seconds, 45);
        advance(46).await;
        let snapshot = hub.snapshot();
        assert_eq!(snapshot.timer_seconds, 0);
        assert!(!snapshot.timer_running);
        assert!(snapshot.timer_blink);

        hub.ack_timer_blink();
        let snapshot = hub.snapshot();
        assert!(!snapshot.timer_blink);
        assert_eq!(snapshot.timer_seconds, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_freeze_countdown_when_stopped() {
        let hub = hub();
        hub.set_timer(10);
        hub.start_timer();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        hub.stop_timer();
        advance(10).await;
        let snapshot = hub.snapshot();
        assert_eq!(snapshot.timer_seconds, 7);
        assert!(!snapshot.timer_running);
        assert!(!snapshot.timer_blink);
    }

    #[tokio::test(start_paused = true)]
    async fn should_run_single_countdown_when_restarted() {
        let hub = hub();
        hub.set_timer(10);
        hub.start_timer();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        hub.stop_timer();
        hub.start_timer();
        tokio::time::sleep(Duration::from_millis(3200)).await;
        // one tick before the restart, three after
        assert_eq!(hub.snapshot().timer_seconds, 6);
    }

    #[tokio::test]
    async fn should_not_start_timer_at_zero() {
        assert!(!hub().start_timer());
    }

    #[tokio::test]
    async fn should_reject_unknown_rule_name() {
        let err = hub().set_rule_enabled("laser", false).unwrap_err();
        assert!(matches!(
            err,
            HomeGuardError::Validation(ValidationError::UnknownRule(_))
        ));
    }

    #[tokio::test]
    async fn should_reject_unknown_scenario_without_mutation() {
        let hub = hub();
        let before = hub.snapshot();
        let err = hub
            .trigger_scenario("flood", &serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(
            err,
            HomeGuardError::Validation(ValidationError::UnknownScenario(_))
        ));
        let after = hub.snapshot();
        assert_eq!(before.alarm_active, after.alarm_active);
        assert_eq!(before.system_armed, after.system_armed);
    }

    #[tokio::test]
    async fn should_raise_alarm_from_tilt_scenario() {
        let hub = hub();
        let report = hub
            .trigger_scenario("gsg_tilt", &serde_json::Value::Null)
            .unwrap();
        assert!(report.alarm_active);
        assert_eq!(hub.snapshot().alarm_reasons, vec!["gsg_tilt".to_string()]);
    }

    #[tokio::test]
    async fn should_queue_manual_command_for_known_actuator() {
        let hub = hub();
        let command = hub
            .command_actuator("led", serde_json::json!({"state": true}))
            .unwrap();
        assert_eq!(command.target, ActuatorTarget::DoorLight);

        let err = hub
            .command_actuator("fan", serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(
            err,
            HomeGuardError::Validation(ValidationError::UnknownActuator(_))
        ));

        assert_eq!(hub.drain_commands(), vec![command]);
        assert!(hub.drain_commands().is_empty());
    }

    #[tokio::test]
    async fn should_keep_newest_commands_when_queue_overflows() {
        let hub = hub();
        for n in 0..=COMMAND_QUEUE_CAPACITY {
            hub.command_actuator("DB", serde_json::json!({ "n": n })).unwrap();
        }
        let queued = hub.drain_commands();
        assert_eq!(queued.len(), COMMAND_QUEUE_CAPACITY);
        assert_eq!(queued[0].payload, serde_json::json!({ "n": 1 }));
    }

    #[tokio::test]
    async fn should_clear_every_reason_on_deactivate() {
        let hub = hub();
        hub.activate_alarm(Some("gsg_tilt"));
        hub.activate_alarm(None);
        hub.deactivate_alarm();
        let events = hub.drain_alarm_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].reason, "clear_all");
        assert!(!hub.sync_state().alarm_active);
    }
}
