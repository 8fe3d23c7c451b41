//! # homeguard-app
//!
//! Application layer: the home hub, timed tasks and **port definitions**
//! (traits).
//!
//! ## Responsibilities
//! - Own the single [`hub::HomeHub`] that serializes every read and mutation
//!   of the home state, and stamps operations with the [`clock::Clock`].
//! - Route raw sensor readings to the right domain operation
//!   ([`hub::HomeHub::submit_reading`]).
//! - Run the timed tasks: arm delay, kitchen timer countdown and the
//!   [`reconciler::Reconciler`] loop that syncs actuators on state edges.
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ActuatorSink`: deliver commands to output devices
//!   - `AlarmEventStore`: persist alarm telemetry
//!   - `ActuatorStateStore`: mirror issued commands
//!   - `SensorReadingStore`: persist raw sensor telemetry
//!   - `EventPublisher`: fan out hub events
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `homeguard-domain` only (plus `tokio` for timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod clock;
pub mod event_bus;
pub mod hub;
pub mod ingest;
pub mod ports;
pub mod reconciler;
