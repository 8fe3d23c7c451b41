//! Raw sensor telemetry and bounded delivery buffers.
//!
//! Every submitted reading is kept as a [`SensorReadingRecord`], whether it
//! was applied or dropped. Records wait in an [`Outbox`] until the
//! reconciliation loop persists them.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::id::SensorReadingId;
use crate::time::Timestamp;

/// Upper bound of unpersisted readings.
pub const READING_OUTBOX_CAPACITY: usize = 1000;
/// Upper bound of manual actuator commands waiting for the next tick.
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// One submitted reading, as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReadingRecord {
    pub id: SensorReadingId,
    /// Upper-cased sensor code.
    pub code: String,
    pub value: serde_json::Value,
    /// Whether the reading decoded and changed the home state.
    pub applied: bool,
    pub timestamp: Timestamp,
}

impl SensorReadingRecord {
    #[must_use]
    pub fn new(code: &str, value: serde_json::Value, applied: bool, timestamp: Timestamp) -> Self {
        Self {
            id: SensorReadingId::new(),
            code: code.trim().to_ascii_uppercase(),
            value,
            applied,
            timestamp,
        }
    }
}

/// FIFO buffer that drops its oldest entry when full.
#[derive(Debug, Clone)]
pub struct Outbox<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> Outbox<T> {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
        }
    }

    /// Append an item. Returns `true` when the oldest item was dropped.
    pub fn push(&mut self, item: T) -> bool {
        let overflowed = self.items.len() == self.capacity;
        if overflowed {
            self.items.pop_front();
        }
        self.items.push_back(item);
        overflowed
    }

    /// Take every buffered item, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
