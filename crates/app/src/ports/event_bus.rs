//! Event bus port — publish/subscribe for transition events.

use std::future::Future;

use thermoplan_domain::error::ThermoplanError;
use thermoplan_domain::event::TransitionEvent;

/// Publishes transition events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(
        &self,
        event: TransitionEvent,
    ) -> impl Future<Output = Result<(), ThermoplanError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: TransitionEvent,
    ) -> impl Future<Output = Result<(), ThermoplanError>> + Send {
        (**self).publish(event)
    }
}
