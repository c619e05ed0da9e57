//! In-process event bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use thermoplan_domain::error::ThermoplanError;
use thermoplan_domain::event::TransitionEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
pub struct InProcessEventBus {
    sender: broadcast::Sender<TransitionEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(
        &self,
        event: TransitionEvent,
    ) -> impl Future<Output = Result<(), ThermoplanError>> + Send {
        // broadcast::send fails only when there are zero receivers,
        // which is fine — we simply ignore the error.
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermoplan_domain::event::TriggerKind;
    use thermoplan_domain::id::EntityId;
    use thermoplan_domain::node::Node;
    use thermoplan_domain::schedule::DayOfWeek;

    fn sample_event(group: &str) -> TransitionEvent {
        TransitionEvent {
            entity_id: EntityId::new("climate.bedroom").unwrap(),
            group_name: group.to_string(),
            day: DayOfWeek::Wed,
            node: Node::at("07:00".parse().unwrap(), 21.0),
            previous_node: None,
            trigger: TriggerKind::Scheduled,
        }
    }

    #[tokio::test]
    async fn should_deliver_event_to_subscriber() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(sample_event("Bedrooms")).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.group_name, "Bedrooms");
    }

    #[tokio::test]
    async fn should_deliver_event_to_multiple_subscribers() {
        let bus = InProcessEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(sample_event("Bedrooms")).await.unwrap();

        assert_eq!(rx1.recv().await.unwrap().group_name, "Bedrooms");
        assert_eq!(rx2.recv().await.unwrap().group_name, "Bedrooms");
    }

    #[tokio::test]
    async fn should_succeed_when_no_subscribers() {
        let bus = InProcessEventBus::new(16);
        let result = bus.publish(sample_event("Bedrooms")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn should_not_deliver_events_published_before_subscription() {
        let bus = InProcessEventBus::new(16);
        bus.publish(sample_event("Early")).await.unwrap();

        let mut rx = bus.subscribe();
        bus.publish(sample_event("Late")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().group_name, "Late");
    }
}
