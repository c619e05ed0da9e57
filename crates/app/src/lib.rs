//! # thermoplan-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Actuator` — device calls (turn off, set temperature, set modes)
//!   - `ScheduleStore` — persistence for groups, advance history, settings
//!   - `EventPublisher` — transition-event fan-out
//!   - `Clock` — wall-clock source (swappable in tests)
//! - Provide the **Group/Profile Registry** (in-memory model of which
//!   devices share which schedule)
//! - Provide the **Override Ledger** (manual-advance windows + history)
//! - Provide the **Reconciliation Coordinator** (the periodic driver that
//!   keeps every device on its scheduled node)
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `thermoplan-domain` only (plus `tokio::sync`/`time` for
//! channels and timers). Never imports adapter crates. Adapters depend on
//! *this* crate, not the reverse.

pub mod coordinator;
pub mod event_bus;
pub mod ledger;
pub mod ports;
pub mod registry;
