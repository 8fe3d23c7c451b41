//! Time and timestamp helpers.

use chrono::{DateTime, TimeDelta, Utc};

/// UTC timestamp used for observations, alarm events and actuator records.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Convert fractional seconds into a [`TimeDelta`] with millisecond precision.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn secs(seconds: f64) -> TimeDelta {
    TimeDelta::milliseconds((seconds * 1000.0).round() as i64)
}

/// Seconds elapsed from `since` to `now`, negative if `since` is in the future.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn elapsed_secs(since: Timestamp, now: Timestamp) -> f64 {
    (now - since).num_milliseconds() as f64 / 1000.0
}
