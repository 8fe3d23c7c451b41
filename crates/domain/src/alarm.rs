//! Alarm reason registry and alarm event log.
//!
//! The alarm is active iff at least one reason is held. Every mutation
//! recomputes that flag as its last step and, on an edge, appends an
//! [`AlarmEvent`] to both the query history and the delivery buffer.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::id::AlarmEventId;
use crate::time::Timestamp;

/// Number of events kept for queries.
pub const HISTORY_CAPACITY: usize = 100;
/// Upper bound of undelivered events; the oldest are dropped beyond it.
pub const OUTBOX_CAPACITY: usize = 1000;

/// Direction of an alarm edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmEdge {
    On,
    Off,
}

impl AlarmEdge {
    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl std::fmt::Display for AlarmEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlarmEdge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Err(format!("unknown alarm edge `{other}`")),
        }
    }
}

/// A recorded alarm on/off transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmEvent {
    pub id: AlarmEventId,
    pub timestamp: Timestamp,
    pub event: AlarmEdge,
    pub reason: String,
}

impl AlarmEvent {
    /// Create a new event with a fresh id.
    #[must_use]
    pub fn new(event: AlarmEdge, reason: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            id: AlarmEventId::new(),
            timestamp,
            event,
            reason: reason.into(),
        }
    }
}

/// Bounded history plus a drain-once delivery buffer.
#[derive(Debug, Default, Clone)]
pub struct AlarmEventLog {
    history: VecDeque<AlarmEvent>,
    outbox: VecDeque<AlarmEvent>,
}

impl AlarmEventLog {
    fn record(&mut self, event: AlarmEvent) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        if self.outbox.len() == OUTBOX_CAPACITY {
            self.outbox.pop_front();
        }
        self.history.push_back(event.clone());
        self.outbox.push_back(event);
    }

    /// Most recent events, oldest first.
    #[must_use]
    pub fn recent(&self) -> Vec<AlarmEvent> {
        self.history.iter().cloned().collect()
    }

    /// Take every undelivered event, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<AlarmEvent> {
        self.outbox.drain(..).collect()
    }

    /// Number of undelivered events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }
}

/// The set of active alarm causes.
#[derive(Debug, Default, Clone)]
pub struct AlarmRegistry {
    reasons: BTreeSet<String>,
    active: bool,
    log: AlarmEventLog,
}

impl AlarmRegistry {
    /// Whether the alarm is currently sounding.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Held reasons in sorted order.
    #[must_use]
    pub fn reasons(&self) -> Vec<String> {
        self.reasons.iter().cloned().collect()
    }

    /// Read access to the event log.
    #[must_use]
    pub fn log(&self) -> &AlarmEventLog {
        &self.log
    }

    /// Take every undelivered event.
    pub fn drain_events(&mut self) -> Vec<AlarmEvent> {
        self.log.drain()
    }

    /// Add a cause. Returns the `on` event when this activates the alarm.
    pub fn add(&mut self, reason: &str, now: Timestamp) -> Option<AlarmEvent> {
        self.reasons.insert(reason.to_string());
        self.recompute(reason, now)
    }

    /// Remove a single cause, labelling a resulting `off` event with `label`.
    pub fn remove(&mut self, reason: &str, label: &str, now: Timestamp) -> Option<AlarmEvent> {
        self.reasons.remove(reason);
        self.recompute(label, now)
    }

    /// Remove every cause matching `predicate`.
    pub fn remove_matching<F>(
        &mut self,
        predicate: F,
        label: &str,
        now: Timestamp,
    ) -> Option<AlarmEvent>
    where
        F: Fn(&str) -> bool,
    {
        self.reasons.retain(|r| !predicate(r));
        self.recompute(label, now)
    }

    /// Remove every cause.
    pub fn clear(&mut self, label: &str, now: Timestamp) -> Option<AlarmEvent> {
        self.reasons.clear();
        self.recompute(label, now)
    }

    fn recompute(&mut self, label: &str, now: Timestamp) -> Option<AlarmEvent> {
        let should_be_active = !self.reasons.is_empty();
        if should_be_active == self.active {
            return None;
        }
        self.active = should_be_active;
        let edge = if should_be_active {
            AlarmEdge::On
        } else {
            AlarmEdge::Off
        };
        let event = AlarmEvent::new(edge, label, now);
        self.log.record(event.clone());
        Some(event)
    }
}
