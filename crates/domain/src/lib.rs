//! # homeguard-domain
//!
//! Pure domain model for the homeguard security and automation core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **sensor vocabulary** and decode raw readings once
//! - Hold the **alarm reason registry** and its event log
//! - Run the **arm / entry-delay** state machine and door tracking
//! - Verify **PIN** entries from the keypad
//! - Infer **occupancy** from motion pulses and distance trends
//! - Keep **climate** readings, the rotating display, the **color light**
//!   and the **kitchen timer**
//! - Describe **actuator** commands and the records mirrored to storage
//! - Buffer raw **sensor telemetry** and queued manual commands for delivery
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod access;
pub mod actuator;
pub mod alarm;
pub mod arming;
pub mod climate;
pub mod config;
pub mod event;
pub mod home;
pub mod light;
pub mod occupancy;
pub mod rules;
pub mod scenario;
pub mod sensor;
pub mod telemetry;
pub mod timer;
