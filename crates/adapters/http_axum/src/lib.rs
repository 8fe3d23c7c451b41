//! # homeguard-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for commands (`/api/alarm/*`, `/api/pin`,
//!   `/api/timer/*`, `/api/light`, `/api/actuators/{code}`,
//!   `/api/scenarios/{name}`) and queries (`/api/state`, `/api/alarm/events`,
//!   `/api/actuators`, `/api/readings`)
//! - Accept raw sensor readings over HTTP (`POST /api/readings`)
//! - Stream hub events to browsers over SSE (`/api/events/stream`)
//! - Map hub errors into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `homeguard-app` (for the hub and port traits) and
//! `homeguard-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod test_support;
