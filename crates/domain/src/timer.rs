//! Kitchen countdown timer.
//!
//! The countdown itself runs outside the domain: [`KitchenTimer::start`]
//! hands out a [`TimerTicket`] and the owner of the ticket calls
//! [`KitchenTimer::tick`] once per second until it stops answering
//! [`TimerTick::Continue`]. Stopping or restarting bumps the generation, so a
//! sleeping countdown wakes up to [`TimerTick::Stale`] and exits.

use serde::Serialize;

/// Step added by the push-button when nothing else is configured.
pub const DEFAULT_STEP_SECS: u32 = 30;

/// Proof that a countdown was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTicket {
    generation: u64,
}

/// Result of one countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Time left; sleep and tick again.
    Continue,
    /// Reached zero; the blink flag is now raised.
    Finished,
    /// Stopped or superseded; exit without side effects.
    Stale,
}

/// Observable timer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerStatus {
    pub seconds: u32,
    pub running: bool,
    pub blink: bool,
    pub step: u32,
}

impl TimerStatus {
    /// `MM:SS` rendering of the remaining time.
    #[must_use]
    pub fn display_text(&self) -> String {
        format_mmss(self.seconds)
    }
}

/// Countdown state.
#[derive(Debug, Clone)]
pub struct KitchenTimer {
    seconds_remaining: u32,
    running: bool,
    blink_pending: bool,
    step: u32,
    generation: u64,
}

impl Default for KitchenTimer {
    fn default() -> Self {
        Self {
            seconds_remaining: 0,
            running: false,
            blink_pending: false,
            step: DEFAULT_STEP_SECS,
            generation: 0,
        }
    }
}

impl KitchenTimer {
    #[must_use]
    pub fn status(&self) -> TimerStatus {
        TimerStatus {
            seconds: self.seconds_remaining,
            running: self.running,
            blink: self.blink_pending,
            step: self.step,
        }
    }

    /// Set an absolute value, floored at zero. Clears the blink flag.
    pub fn set(&mut self, seconds: i64) {
        self.seconds_remaining = clamp_secs(seconds);
        self.blink_pending = false;
        self.settle();
    }

    /// Add a signed delta, floored at zero.
    pub fn add(&mut self, delta: i64) {
        self.seconds_remaining = clamp_secs(i64::from(self.seconds_remaining) + delta);
        self.settle();
    }

    /// Push-button press: clears the blink flag and adds one step.
    pub fn press(&mut self) {
        self.blink_pending = false;
        self.add(i64::from(self.step));
    }

    /// Set the push-button step, raised to at least one second.
    pub fn set_step(&mut self, seconds: i64) {
        self.step = clamp_secs(seconds).max(1);
    }

    /// Begin counting down. Returns `None` if already running or at zero.
    pub fn start(&mut self) -> Option<TimerTicket> {
        if self.running || self.seconds_remaining == 0 {
            return None;
        }
        self.running = true;
        self.blink_pending = false;
        self.generation += 1;
        Some(TimerTicket {
            generation: self.generation,
        })
    }

    /// Stop without touching the remaining seconds.
    pub fn stop(&mut self) {
        self.running = false;
        self.generation += 1;
    }

    pub fn ack_blink(&mut self) {
        self.blink_pending = false;
    }

    /// One countdown step for the holder of `ticket`.
    pub fn tick(&mut self, ticket: TimerTicket) -> TimerTick {
        if !self.running || ticket.generation != self.generation {
            return TimerTick::Stale;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.running = false;
            self.blink_pending = true;
            TimerTick::Finished
        } else {
            TimerTick::Continue
        }
    }

    // Keeps `seconds_remaining == 0 => !running`.
    fn settle(&mut self) {
        if self.seconds_remaining == 0 && self.running {
            self.stop();
        }
    }
}

fn clamp_secs(seconds: i64) -> u32 {
    u32::try_from(seconds.max(0)).unwrap_or(u32::MAX)
}

/// Render seconds as `MM:SS`; minutes grow past two digits if needed.
#[must_use]
pub fn format_mmss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
