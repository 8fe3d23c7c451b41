//! Wall-clock timestamps anchored on the tokio clock.
//!
//! Every timestamp the hub hands to the domain is `origin + elapsed`, where
//! `elapsed` is measured with [`tokio::time::Instant`]. Under a paused tokio
//! runtime the timestamps advance together with the timers.

use chrono::TimeDelta;
use tokio::time::Instant;

use homeguard_domain::time::{Timestamp, now};

#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Timestamp,
    started: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock {
    /// Anchor a clock on the current UTC time.
    #[must_use]
    pub fn start() -> Self {
        Self {
            origin: now(),
            started: Instant::now(),
        }
    }

    /// Current timestamp.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        TimeDelta::from_std(self.started.elapsed())
            .ok()
            .and_then(|elapsed| self.origin.checked_add_signed(elapsed))
            .unwrap_or(self.origin)
    }
}
