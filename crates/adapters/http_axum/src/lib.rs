//! # thermoplan-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the scheduler's **operational JSON API**: groups, schedules,
//!   profiles, advances, settings, force-sync
//! - Serve an **SSE stream** of transition events for dashboards
//! - Map HTTP requests into coordinator calls (driving adapter)
//! - Map [`ThermoplanError`](thermoplan_domain::error::ThermoplanError)
//!   values into HTTP responses
//!
//! ## Dependency rule
//! Depends on `thermoplan-app` (for the coordinator and port traits) and
//! `thermoplan-domain` (for types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
