//! Occupancy inference from debounced motion pulses and distance trends.
//!
//! A passage is watched by a motion sensor and a distance sensor. When the
//! motion sensor fires, the distance history is split in half: a falling
//! mean means someone walked towards the sensor (entering), a rising mean
//! means someone walked away (exiting).

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use crate::sensor::{DistanceSensor, MotionSensor};
use crate::time::{Timestamp, elapsed_secs};

/// Samples kept per distance sensor.
pub const HISTORY_CAPACITY: usize = 8;
/// Fewer samples than this never classify.
pub const MIN_SAMPLES: usize = 4;

/// Inferred walking direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Enter,
    Exit,
}

/// Fixed-capacity ring of `(timestamp, distance)` samples.
#[derive(Debug, Default, Clone)]
pub struct DistanceHistory(VecDeque<(Timestamp, f64)>);

impl DistanceHistory {
    /// Append a sample, evicting the oldest on overflow.
    pub fn push(&mut self, at: Timestamp, cm: f64) {
        if self.0.len() == HISTORY_CAPACITY {
            self.0.pop_front();
        }
        self.0.push_back((at, cm));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compare the mean of the newer half against the older half.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn infer_direction(&self, threshold_cm: f64) -> Option<Direction> {
        if self.0.len() < MIN_SAMPLES {
            return None;
        }
        let values: Vec<f64> = self.0.iter().map(|(_, v)| *v).collect();
        let (older, newer) = values.split_at(values.len() / 2);
        let mean = |half: &[f64]| half.iter().sum::<f64>() / half.len() as f64;
        let (old_avg, new_avg) = (mean(older), mean(newer));

        if new_avg < old_avg - threshold_cm {
            Some(Direction::Enter)
        } else if new_avg > old_avg + threshold_cm {
            Some(Direction::Exit)
        } else {
            None
        }
    }
}

/// Motion debounce, distance histories and the person counter.
#[derive(Debug, Clone)]
pub struct Occupancy {
    person_count: u32,
    last_fire: BTreeMap<MotionSensor, Timestamp>,
    histories: BTreeMap<DistanceSensor, DistanceHistory>,
    debounce_secs: f64,
    threshold_cm: f64,
}

impl Occupancy {
    #[must_use]
    pub fn new(debounce_secs: f64, threshold_cm: f64) -> Self {
        Self {
            person_count: 0,
            last_fire: BTreeMap::new(),
            histories: DistanceSensor::ALL
                .iter()
                .map(|s| (*s, DistanceHistory::default()))
                .collect(),
            debounce_secs,
            threshold_cm,
        }
    }

    #[must_use]
    pub fn person_count(&self) -> u32 {
        self.person_count
    }

    /// Force the count, used by scenario hooks.
    pub fn set_person_count(&mut self, count: u32) {
        self.person_count = count;
    }

    #[must_use]
    pub fn history(&self, sensor: DistanceSensor) -> Option<&DistanceHistory> {
        self.histories.get(&sensor)
    }

    /// Record a distance sample; non-finite values are dropped.
    pub fn record_distance(&mut self, sensor: DistanceSensor, cm: f64, now: Timestamp) {
        if !cm.is_finite() {
            return;
        }
        self.histories.entry(sensor).or_default().push(now, cm);
    }

    /// Accept a motion pulse unless it falls inside the debounce window.
    ///
    /// Returns `true` when the pulse was accepted.
    pub fn accept_motion(&mut self, sensor: MotionSensor, now: Timestamp) -> bool {
        if let Some(last) = self.last_fire.get(&sensor)
            && elapsed_secs(*last, now) < self.debounce_secs
        {
            return false;
        }
        self.last_fire.insert(sensor, now);
        true
    }

    /// Forget the last firing so the next pulse is accepted.
    pub fn reset_debounce(&mut self, sensor: MotionSensor) {
        self.last_fire.remove(&sensor);
    }

    /// Classify an accepted pulse and update the count.
    pub fn classify(&mut self, sensor: MotionSensor) -> Option<Direction> {
        let direction = sensor
            .paired_distance()
            .and_then(|dus| self.histories.get(&dus))
            .and_then(|history| history.infer_direction(self.threshold_cm))?;
        match direction {
            Direction::Enter => self.person_count += 1,
            Direction::Exit => self.person_count = self.person_count.saturating_sub(1),
        }
        Some(direction)
    }
}
