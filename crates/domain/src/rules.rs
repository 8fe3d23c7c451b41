//! Alarm rule categories that can be toggled at runtime.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A category of alarm cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmRule {
    /// A door left open past the timeout.
    DoorOpenTooLong,
    /// The entry delay expired without a valid PIN.
    EntryDelayAlarm,
    /// Motion seen while nobody is home.
    MotionEmptyHouse,
    /// The gyroscope reported a tilt above threshold.
    GsgTilt,
}

impl AlarmRule {
    /// Every rule category.
    pub const ALL: [Self; 4] = [
        Self::DoorOpenTooLong,
        Self::EntryDelayAlarm,
        Self::MotionEmptyHouse,
        Self::GsgTilt,
    ];

    /// Snake-case rule name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DoorOpenTooLong => "door_open_too_long",
            Self::EntryDelayAlarm => "entry_delay_alarm",
            Self::MotionEmptyHouse => "motion_empty_house",
            Self::GsgTilt => "gsg_tilt",
        }
    }

    /// Whether an alarm reason belongs to this category.
    #[must_use]
    pub fn owns(self, reason: &str) -> bool {
        match self {
            Self::DoorOpenTooLong => reason.ends_with(OPEN_TOO_LONG_SUFFIX),
            Self::EntryDelayAlarm => reason.ends_with(ARMED_SUFFIX),
            Self::MotionEmptyHouse => reason == MOTION_EMPTY_HOUSE,
            Self::GsgTilt => reason == GSG_TILT,
        }
    }
}

impl fmt::Display for AlarmRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlarmRule {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rule| rule.as_str() == s.trim())
            .ok_or_else(|| ValidationError::UnknownRule(s.to_string()))
    }
}

const OPEN_TOO_LONG_SUFFIX: &str = "_open_too_long";
const ARMED_SUFFIX: &str = "_armed";

/// Reason held while motion is seen with an empty house.
pub const MOTION_EMPTY_HOUSE: &str = "motion_empty_house";
/// Reason held after a tilt spike.
pub const GSG_TILT: &str = "gsg_tilt";

/// Reason for a door left open past the timeout.
#[must_use]
pub fn open_too_long_reason(sensor: impl fmt::Display) -> String {
    format!("{sensor}{OPEN_TOO_LONG_SUFFIX}")
}

/// Reason for an entry delay that expired on `sensor`.
#[must_use]
pub fn armed_reason(sensor: impl fmt::Display) -> String {
    format!("{sensor}{ARMED_SUFFIX}")
}

/// Enabled flags for every rule; all enabled by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRules(BTreeMap<AlarmRule, bool>);

impl Default for AlarmRules {
    fn default() -> Self {
        Self(AlarmRule::ALL.into_iter().map(|rule| (rule, true)).collect())
    }
}

impl AlarmRules {
    /// Whether `rule` currently raises alarms.
    #[must_use]
    pub fn is_enabled(&self, rule: AlarmRule) -> bool {
        self.0.get(&rule).copied().unwrap_or(true)
    }

    /// Set the enabled flag for `rule`.
    pub fn set(&mut self, rule: AlarmRule, enabled: bool) {
        self.0.insert(rule, enabled);
    }

    /// Name → enabled projection for snapshots.
    #[must_use]
    pub fn as_map(&self) -> BTreeMap<String, bool> {
        self.0
            .iter()
            .map(|(rule, enabled)| (rule.as_str().to_string(), *enabled))
            .collect()
    }
}
