//! The home state aggregate.
//!
//! [`HomeState`] owns every sub-state (alarm reasons, arming, doors, PIN pad,
//! occupancy, climate board, color light, kitchen timer) and exposes pure
//! operations that take the current time as a parameter. Timed behaviour
//! (arm delay, countdown) is expressed through tickets; the caller schedules
//! the wake-ups.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::access::{KeypadInput, PinPad};
use crate::alarm::{AlarmEvent, AlarmRegistry};
use crate::arming::{ArmState, ArmTicket, DoorTracker, EntryDelay};
use crate::climate::{ClimateBoard, ClimateReading};
use crate::config::HomeConfig;
use crate::error::ValidationError;
use crate::light::{ColorLight, RemoteCommand};
use crate::occupancy::{Direction, Occupancy};
use crate::rules::{
    AlarmRule, AlarmRules, GSG_TILT, MOTION_EMPTY_HOUSE, armed_reason, open_too_long_reason,
};
use crate::scenario::{Scenario, ScenarioReport};
use crate::sensor::{ClimateSensor, DistanceSensor, DoorSensor, MotionSensor};
use crate::time::{Timestamp, secs};
use crate::timer::{KitchenTimer, TimerStatus, TimerTick, TimerTicket};

/// Reason recorded when an alarm is raised by hand.
pub const MANUAL_REASON: &str = "manual";
/// Label of the `off` event produced by clearing every reason.
pub const CLEAR_ALL_LABEL: &str = "clear_all";

// Extra backdating applied by scenarios so the rule fires on the same call.
const SCENARIO_MARGIN_SECS: f64 = 0.2;
const SCENARIO_TILT_MARGIN: f64 = 5.0;

/// Effect of a door transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoorOutcome {
    pub entry_delay_started: bool,
    pub entry_delay_cancelled: bool,
    pub alarm_event: Option<AlarmEvent>,
}

/// Effect of a motion reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionOutcome {
    /// `false` when inactive or debounced.
    pub accepted: bool,
    pub direction: Option<Direction>,
    /// The door light should pulse.
    pub pulse_light: bool,
    pub alarm_event: Option<AlarmEvent>,
}

/// What a verified PIN did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinAction {
    /// The alarm was cleared and the system disarmed.
    Disarmed,
    /// Arming started; redeem the ticket after the arm delay.
    Arming(ArmTicket),
    /// Already armed or arming; nothing to schedule.
    AlreadyArming,
}

/// Result of a keypad token or a direct PIN entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinOutcome {
    /// The token only touched the buffer.
    Pending(KeypadInput),
    /// A candidate did not match the secret.
    Rejected,
    Accepted {
        entry_delay_cancelled: bool,
        action: PinAction,
    },
}

/// Effect of evaluating the time-based rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeRuleOutcome {
    /// Door whose entry delay ran out during this evaluation.
    pub entry_delay_expired: Option<DoorSensor>,
    pub alarm_event: Option<AlarmEvent>,
}

/// Read-only projection of the whole state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSnapshot {
    pub alarm_active: bool,
    pub system_armed: bool,
    pub pending_arm: bool,
    pub entry_delay_active: bool,
    pub entry_delay_remaining: f64,
    pub entry_delay_sensor: Option<DoorSensor>,
    pub alarm_rules: BTreeMap<String, bool>,
    pub person_count: u32,
    pub alarm_reasons: Vec<String>,
    pub alarm_events: Vec<AlarmEvent>,
    pub door_open_since: BTreeMap<DoorSensor, Option<Timestamp>>,
    pub timer_seconds: u32,
    pub timer_running: bool,
    pub timer_blink: bool,
    pub timer_add_step: u32,
    pub climate: BTreeMap<ClimateSensor, ClimateReading>,
    pub display_text: String,
    pub color_light: ColorLight,
}

/// The single owner of all home state.
#[derive(Debug, Clone)]
pub struct HomeState {
    config: HomeConfig,
    alarm: AlarmRegistry,
    rules: AlarmRules,
    arm: ArmState,
    entry_delay: Option<EntryDelay>,
    doors: DoorTracker,
    pin_pad: PinPad,
    occupancy: Occupancy,
    climate: ClimateBoard,
    light: ColorLight,
    timer: KitchenTimer,
    light_pulse_requested: bool,
}

impl Default for HomeState {
    fn default() -> Self {
        Self::build(HomeConfig::default(), PinPad::default())
    }
}

impl HomeState {
    /// Build the state from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPin`] when the PIN is malformed.
    pub fn new(config: HomeConfig) -> Result<Self, ValidationError> {
        let pin_pad = PinPad::with_secret(&config.pin)?;
        Ok(Self::build(config, pin_pad))
    }

    fn build(config: HomeConfig, pin_pad: PinPad) -> Self {
        let mut timer = KitchenTimer::default();
        timer.set_step(i64::from(config.timer_step_secs));
        Self {
            occupancy: Occupancy::new(config.motion_debounce_secs, config.direction_threshold_cm),
            config,
            alarm: AlarmRegistry::default(),
            rules: AlarmRules::default(),
            arm: ArmState::default(),
            entry_delay: None,
            doors: DoorTracker::default(),
            pin_pad,
            climate: ClimateBoard::default(),
            light: ColorLight::default(),
            timer,
            light_pulse_requested: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> &HomeConfig {
        &self.config
    }

    #[must_use]
    pub fn is_alarm_active(&self) -> bool {
        self.alarm.is_active()
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.arm.is_armed()
    }

    #[must_use]
    pub fn is_pending_arm(&self) -> bool {
        self.arm.is_pending()
    }

    #[must_use]
    pub fn entry_delay(&self) -> Option<EntryDelay> {
        self.entry_delay
    }

    #[must_use]
    pub fn person_count(&self) -> u32 {
        self.occupancy.person_count()
    }

    #[must_use]
    pub fn alarm_reasons(&self) -> Vec<String> {
        self.alarm.reasons()
    }

    #[must_use]
    pub fn color_light(&self) -> &ColorLight {
        &self.light
    }

    #[must_use]
    pub fn timer_status(&self) -> TimerStatus {
        self.timer.status()
    }

    #[must_use]
    pub fn rules(&self) -> &AlarmRules {
        &self.rules
    }

    // -- alarm ---------------------------------------------------------------

    /// Add a reason, `"manual"` when none is given.
    pub fn activate_alarm(&mut self, reason: Option<&str>, now: Timestamp) -> Option<AlarmEvent> {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(MANUAL_REASON);
        self.alarm.add(reason, now)
    }

    /// Remove one reason, or every reason when none is given.
    pub fn deactivate_alarm(&mut self, reason: Option<&str>, now: Timestamp) -> Option<AlarmEvent> {
        match reason {
            Some(reason) => self.alarm.remove(reason, reason, now),
            None => self.alarm.clear(CLEAR_ALL_LABEL, now),
        }
    }

    /// Take the undelivered alarm events.
    pub fn drain_alarm_events(&mut self) -> Vec<AlarmEvent> {
        self.alarm.drain_events()
    }

    /// Enable or disable a rule category. Disabling drops that category's
    /// held reasons and labels a resulting `off` event `rule_disabled:<name>`.
    pub fn set_rule(&mut self, rule: AlarmRule, enabled: bool, now: Timestamp) -> Option<AlarmEvent> {
        self.rules.set(rule, enabled);
        if enabled {
            return None;
        }
        let label = format!("rule_disabled:{rule}");
        self.alarm.remove_matching(|r| rule.owns(r), &label, now)
    }

    // -- arming --------------------------------------------------------------

    /// Request arming. Returns a ticket to redeem after the arm delay, or
    /// `None` when already armed or pending.
    pub fn request_arm(&mut self) -> Option<ArmTicket> {
        self.arm.request_arm()
    }

    /// Redeem an arm ticket. Returns `true` when the system is now armed.
    pub fn complete_arm(&mut self, ticket: ArmTicket) -> bool {
        self.arm.complete_arm(ticket)
    }

    /// Clear armed and pending flags, dropping any entry delay.
    pub fn disarm(&mut self) {
        self.arm.disarm();
        self.entry_delay = None;
    }

    // -- doors and time rules ------------------------------------------------

    /// Apply a door transition.
    pub fn door_changed(&mut self, sensor: DoorSensor, open: bool, now: Timestamp) -> DoorOutcome {
        let mut outcome = DoorOutcome::default();
        if open {
            self.doors.opened(sensor, now);
            if self.arm.is_armed() && self.entry_delay.is_none() {
                self.entry_delay = Some(EntryDelay {
                    started_at: now,
                    sensor,
                });
                outcome.entry_delay_started = true;
            }
        } else {
            self.doors.closed(sensor);
            if self.entry_delay.is_some_and(|d| d.sensor == sensor) {
                self.entry_delay = None;
                outcome.entry_delay_cancelled = true;
            }
            outcome.alarm_event = self.alarm.remove(
                &open_too_long_reason(sensor),
                &format!("{sensor}_closed"),
                now,
            );
        }
        outcome
    }

    /// Evaluate entry-delay expiry and door-open timeouts.
    pub fn evaluate_time_rules(&mut self, now: Timestamp) -> TimeRuleOutcome {
        let mut outcome = TimeRuleOutcome::default();

        if let Some(delay) = self.entry_delay
            && delay.is_expired(self.config.entry_delay_secs, now)
        {
            self.entry_delay = None;
            outcome.entry_delay_expired = Some(delay.sensor);
            if self.rules.is_enabled(AlarmRule::EntryDelayAlarm) {
                outcome.alarm_event = self.alarm.add(&armed_reason(delay.sensor), now);
            }
        }

        if self.rules.is_enabled(AlarmRule::DoorOpenTooLong) {
            let overdue: Vec<DoorSensor> = self
                .doors
                .overdue(self.config.door_timeout_secs, now)
                .collect();
            for sensor in overdue {
                if let Some(event) = self.alarm.add(&open_too_long_reason(sensor), now) {
                    outcome.alarm_event = Some(event);
                }
            }
        }

        outcome
    }

    // -- access control ------------------------------------------------------

    /// Feed one keypad token.
    pub fn keypad(&mut self, token: &str, now: Timestamp) -> PinOutcome {
        match self.pin_pad.accept(token) {
            KeypadInput::Candidate(code) => self.enter_pin(&code, now),
            other => PinOutcome::Pending(other),
        }
    }

    /// Verify a complete code.
    ///
    /// On success an active entry delay is cancelled; then an active alarm is
    /// cleared and the system disarmed, otherwise arming is requested.
    pub fn enter_pin(&mut self, code: &str, now: Timestamp) -> PinOutcome {
        if !self.pin_pad.verify(code.trim()) {
            return PinOutcome::Rejected;
        }
        let entry_delay_cancelled = self.entry_delay.take().is_some();
        let action = if self.alarm.is_active() {
            self.alarm.clear(CLEAR_ALL_LABEL, now);
            self.disarm();
            PinAction::Disarmed
        } else {
            self.arm
                .request_arm()
                .map_or(PinAction::AlreadyArming, PinAction::Arming)
        };
        PinOutcome::Accepted {
            entry_delay_cancelled,
            action,
        }
    }

    // -- occupancy -----------------------------------------------------------

    pub fn record_distance(&mut self, sensor: DistanceSensor, cm: f64, now: Timestamp) {
        self.occupancy.record_distance(sensor, cm, now);
    }

    /// Apply a motion reading: debounce, infer direction, update the count,
    /// then raise `motion_empty_house` if nobody is home.
    pub fn motion(&mut self, sensor: MotionSensor, active: bool, now: Timestamp) -> MotionOutcome {
        if !active || !self.occupancy.accept_motion(sensor, now) {
            return MotionOutcome::default();
        }
        let direction = self.occupancy.classify(sensor);
        let alarm_event = if self.occupancy.person_count() == 0
            && self.rules.is_enabled(AlarmRule::MotionEmptyHouse)
        {
            self.alarm.add(MOTION_EMPTY_HOUSE, now)
        } else {
            None
        };
        let pulse_light = sensor.pulses_light();
        if pulse_light {
            self.light_pulse_requested = true;
        }
        MotionOutcome {
            accepted: true,
            direction,
            pulse_light,
            alarm_event,
        }
    }

    /// Take and clear the pending door-light pulse request.
    pub fn take_light_pulse(&mut self) -> bool {
        std::mem::take(&mut self.light_pulse_requested)
    }

    // -- environment ---------------------------------------------------------

    /// Apply a tilt reading. Returns `true` when `gsg_tilt` was raised.
    pub fn tilt(&mut self, magnitude: f64, now: Timestamp) -> bool {
        if magnitude >= self.config.tilt_threshold && self.rules.is_enabled(AlarmRule::GsgTilt) {
            self.alarm.add(GSG_TILT, now);
            return true;
        }
        false
    }

    pub fn climate(
        &mut self,
        sensor: ClimateSensor,
        temperature_c: Option<f64>,
        humidity_pct: Option<f64>,
        now: Timestamp,
    ) {
        self.climate.record(sensor, temperature_c, humidity_pct, now);
    }

    /// Advance the display rotation and return the text to show.
    pub fn next_display_text(&mut self) -> String {
        self.climate.rotate()
    }

    pub fn set_color_light(&mut self, on: Option<bool>, color: Option<&str>) {
        self.light.apply(on, color);
    }

    pub fn remote(&mut self, command: &RemoteCommand) {
        self.light.handle(command);
    }

    // -- kitchen timer -------------------------------------------------------

    /// Push-button reading; only presses have an effect.
    pub fn button(&mut self, pressed: bool) {
        if pressed {
            self.timer.press();
        }
    }

    pub fn set_timer(&mut self, seconds: i64) {
        self.timer.set(seconds);
    }

    pub fn add_timer(&mut self, seconds: i64) {
        self.timer.add(seconds);
    }

    pub fn set_timer_step(&mut self, seconds: i64) {
        self.timer.set_step(seconds);
    }

    pub fn start_timer(&mut self) -> Option<TimerTicket> {
        self.timer.start()
    }

    pub fn stop_timer(&mut self) {
        self.timer.stop();
    }

    pub fn ack_timer_blink(&mut self) {
        self.timer.ack_blink();
    }

    pub fn timer_tick(&mut self, ticket: TimerTicket) -> TimerTick {
        self.timer.tick(ticket)
    }

    // -- scenarios -----------------------------------------------------------

    /// Force a time-based rule to fire on this call.
    pub fn run_scenario(&mut self, scenario: Scenario, now: Timestamp) -> ScenarioReport {
        match scenario {
            Scenario::DoorOpenTooLong(sensor) => {
                let aged = now - secs(self.config.door_timeout_secs + SCENARIO_MARGIN_SECS);
                self.doors.set_open_since(sensor, aged);
                self.evaluate_time_rules(now);
            }
            Scenario::EntryDelayExpired(sensor) => {
                self.arm.force_armed();
                self.entry_delay = Some(EntryDelay {
                    started_at: now - secs(self.config.entry_delay_secs + SCENARIO_MARGIN_SECS),
                    sensor,
                });
                self.evaluate_time_rules(now);
            }
            Scenario::MotionEmptyHouse(sensor) => {
                self.occupancy.set_person_count(0);
                self.occupancy.reset_debounce(sensor);
                self.motion(sensor, true, now);
            }
            Scenario::GsgTilt => {
                self.tilt(self.config.tilt_threshold + SCENARIO_TILT_MARGIN, now);
            }
        }
        ScenarioReport {
            ok: true,
            scenario: scenario.name(),
            sensor: scenario.sensor(),
            alarm_active: self.alarm.is_active(),
        }
    }

    // -- projection ----------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self, now: Timestamp) -> HomeSnapshot {
        let timer = self.timer.status();
        HomeSnapshot {
            alarm_active: self.alarm.is_active(),
            system_armed: self.arm.is_armed(),
            pending_arm: self.arm.is_pending(),
            entry_delay_active: self.entry_delay.is_some(),
            entry_delay_remaining: self
                .entry_delay
                .map_or(0.0, |d| d.remaining_secs(self.config.entry_delay_secs, now)),
            entry_delay_sensor: self.entry_delay.map(|d| d.sensor),
            alarm_rules: self.rules.as_map(),
            person_count: self.occupancy.person_count(),
            alarm_reasons: self.alarm.reasons(),
            alarm_events: self.alarm.log().recent(),
            door_open_since: self.doors.as_map(),
            timer_seconds: timer.seconds,
            timer_running: timer.running,
            timer_blink: timer.blink,
            timer_add_step: timer.step,
            climate: self.climate.readings().clone(),
            display_text: self.climate.display_text().to_string(),
            color_light: self.light.clone(),
        }
    }
}
