//! Shared application state for axum handlers.

use std::sync::Arc;

use thermoplan_app::coordinator::Coordinator;
use thermoplan_app::event_bus::InProcessEventBus;
use thermoplan_app::ports::{Actuator, Clock, EventPublisher, ScheduleStore};

/// Application state shared across all axum handlers.
///
/// Generic over the actuator, store, publisher, and clock types to avoid
/// dynamic dispatch. `Clone` is implemented manually so the underlying
/// types themselves do not need to be `Clone` — only the `Arc` wrappers
/// are cloned.
pub struct AppState<A, S, P, C> {
    /// The reconciliation coordinator driving all operations.
    pub coordinator: Arc<Coordinator<A, S, P, C>>,
    /// Event bus handle used by the SSE stream.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<A, S, P, C> Clone for AppState<A, S, P, C> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<A, S, P, C> AppState<A, S, P, C>
where
    A: Actuator + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    C: Clock + 'static,
{
    /// Create a new application state.
    pub fn new(coordinator: Arc<Coordinator<A, S, P, C>>, event_bus: Arc<InProcessEventBus>) -> Self {
        Self {
            coordinator,
            event_bus,
        }
    }
}
