//! Arm/disarm lifecycle, entry delay and door-open tracking.
//!
//! ```text
//!  Disarmed ──arm──► PendingArm ──delay──► Armed ──door opens──► EntryDelay
//!     ▲                  │                   ▲                    │      │
//!     └──── disarm ──────┘                   └── PIN / door shut ─┘      │
//!     ▲                                                        expiry    ▼
//!     └──────────────────────────── PIN ─────────────────────── AlarmActive
//! ```
//!
//! The arm delay is a scheduled wake-up. Instead of cancelling it, every
//! supersession bumps a generation counter; a stale [`ArmTicket`] observes the
//! mismatch on wake and does nothing.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::sensor::DoorSensor;
use crate::time::{Timestamp, elapsed_secs};

/// Proof that an arm request was accepted, redeemed when the delay elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmTicket {
    generation: u64,
}

/// Armed / pending-arm flags.
#[derive(Debug, Default, Clone)]
pub struct ArmState {
    armed: bool,
    pending_arm: bool,
    generation: u64,
}

impl ArmState {
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending_arm
    }

    /// Begin arming. Returns `None` when already armed or pending.
    pub fn request_arm(&mut self) -> Option<ArmTicket> {
        if self.armed || self.pending_arm {
            return None;
        }
        self.pending_arm = true;
        self.generation += 1;
        Some(ArmTicket {
            generation: self.generation,
        })
    }

    /// Complete a pending arm. Returns `false` if the ticket was superseded.
    pub fn complete_arm(&mut self, ticket: ArmTicket) -> bool {
        if !self.pending_arm || ticket.generation != self.generation {
            return false;
        }
        self.pending_arm = false;
        self.armed = true;
        true
    }

    /// Clear both flags and invalidate any outstanding ticket.
    pub fn disarm(&mut self) {
        self.armed = false;
        self.pending_arm = false;
        self.generation += 1;
    }

    /// Force the armed state without a delay.
    pub fn force_armed(&mut self) {
        self.armed = true;
        self.pending_arm = false;
        self.generation += 1;
    }
}

/// Grace window opened when an armed door opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryDelay {
    pub started_at: Timestamp,
    pub sensor: DoorSensor,
}

impl EntryDelay {
    /// Seconds left in a window of `duration_secs`, never negative.
    #[must_use]
    pub fn remaining_secs(&self, duration_secs: f64, now: Timestamp) -> f64 {
        (duration_secs - elapsed_secs(self.started_at, now)).max(0.0)
    }

    /// Whether the window of `duration_secs` has run out.
    #[must_use]
    pub fn is_expired(&self, duration_secs: f64, now: Timestamp) -> bool {
        elapsed_secs(self.started_at, now) >= duration_secs
    }
}

/// Per-door open-since timestamps.
#[derive(Debug, Clone)]
pub struct DoorTracker(BTreeMap<DoorSensor, Option<Timestamp>>);

impl Default for DoorTracker {
    fn default() -> Self {
        Self(DoorSensor::ALL.iter().map(|s| (*s, None)).collect())
    }
}

impl DoorTracker {
    /// Record an open transition; keeps the earliest open time.
    pub fn opened(&mut self, sensor: DoorSensor, now: Timestamp) {
        let slot = self.0.entry(sensor).or_default();
        if slot.is_none() {
            *slot = Some(now);
        }
    }

    /// Record a close transition.
    pub fn closed(&mut self, sensor: DoorSensor) {
        self.0.insert(sensor, None);
    }

    /// Override the open time, used by scenario hooks.
    pub fn set_open_since(&mut self, sensor: DoorSensor, since: Timestamp) {
        self.0.insert(sensor, Some(since));
    }

    #[must_use]
    pub fn open_since(&self, sensor: DoorSensor) -> Option<Timestamp> {
        self.0.get(&sensor).copied().flatten()
    }

    /// Doors open for at least `timeout_secs`.
    pub fn overdue(
        &self,
        timeout_secs: f64,
        now: Timestamp,
    ) -> impl Iterator<Item = DoorSensor> + '_ {
        self.0.iter().filter_map(move |(sensor, since)| {
            since
                .filter(|since| elapsed_secs(*since, now) >= timeout_secs)
                .map(|_| *sensor)
        })
    }

    /// Snapshot projection.
    #[must_use]
    pub fn as_map(&self) -> BTreeMap<DoorSensor, Option<Timestamp>> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{now, secs};

    #[test]
    fn should_ignore_second_arm_request_while_pending() {
        let mut state = ArmState::default();
        assert!(state.request_arm().is_some());
        assert!(state.request_arm().is_none());
        assert!(state.is_pending());
    }

    #[test]
    fn should_arm_when_ticket_redeemed() {
        let mut state = ArmState::default();
        let ticket = state.request_arm().unwrap();
        assert!(state.complete_arm(ticket));
        assert!(state.is_armed());
        assert!(!state.is_pending());
    }

    #[test]
    fn should_reject_stale_ticket_after_disarm_and_rearm() {
        let mut state = ArmState::default();
        let stale = state.request_arm().unwrap();
        state.disarm();
        let fresh = state.request_arm().unwrap();
        assert!(!state.complete_arm(stale));
        assert!(state.is_pending());
        assert!(state.complete_arm(fresh));
    }

    #[test]
    fn should_ignore_arm_request_when_already_armed() {
        let mut state = ArmState::default();
        state.force_armed();
        assert!(state.request_arm().is_none());
    }

    #[test]
    fn should_expire_entry_delay_at_window_end() {
        let start = now();
        let delay = EntryDelay {
            started_at: start,
            sensor: DoorSensor::Ds1,
        };
        assert!(!delay.is_expired(30.0, start + secs(29.0)));
        assert!(delay.is_expired(30.0, start + secs(30.0)));
        assert!((delay.remaining_secs(30.0, start + secs(10.0)) - 20.0).abs() < 1e-9);
        assert!(delay.remaining_secs(30.0, start + secs(45.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn should_keep_first_open_time_when_reopened() {
        let mut doors = DoorTracker::default();
        let first = now();
        doors.opened(DoorSensor::Ds1, first);
        doors.opened(DoorSensor::Ds1, first + secs(3.0));
        assert_eq!(doors.open_since(DoorSensor::Ds1), Some(first));
        doors.closed(DoorSensor::Ds1);
        assert_eq!(doors.open_since(DoorSensor::Ds1), None);
    }

    #[test]
    fn should_list_overdue_doors() {
        let mut doors = DoorTracker::default();
        let start = now();
        doors.opened(DoorSensor::Ds1, start);
        doors.opened(DoorSensor::Ds2, start + secs(4.0));
        let overdue: Vec<_> = doors.overdue(5.0, start + secs(5.0)).collect();
        assert_eq!(overdue, vec![DoorSensor::Ds1]);
    }
}
