//! # thermoplan-domain
//!
//! Pure domain model for the thermoplan climate scheduling system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Nodes** (one schedule entry: a time of day plus the setpoint
//!   and modes to apply)
//! - Define **Schedules** (day-bucketed node lists) and the pure
//!   **resolver** that picks the active and next node for a wall-clock time
//! - Define **Groups** and **Profiles** (which devices share which schedule)
//! - Define **Advance** records (manual override windows and their history)
//! - Define **Transition events** (one record per real setpoint change)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod advance;
pub mod event;
pub mod group;
pub mod node;
pub mod preview;
pub mod schedule;
pub mod settings;
