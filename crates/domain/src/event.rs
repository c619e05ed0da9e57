//! Transition events — one immutable record per real setpoint change.
//!
//! The coordinator emits exactly one event per node transition; re-observing
//! the same active node produces nothing. Consumers (dashboards,
//! automations) subscribe through the event bus and are never blocked on.

use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::node::Node;
use crate::schedule::DayOfWeek;

/// What caused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// The periodic tick crossed a node boundary.
    Scheduled,
    /// A user advanced the schedule by hand.
    ManualAdvance,
}

/// A real node transition applied to one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub entity_id: EntityId,
    pub group_name: String,
    pub day: DayOfWeek,
    pub node: Node,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_node: Option<Node>,
    pub trigger: TriggerKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_trigger_kind_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&TriggerKind::ManualAdvance).unwrap(),
            "\"manual_advance\""
        );
    }

    #[test]
    fn should_roundtrip_event_through_serde() {
        let event = TransitionEvent {
            entity_id: EntityId::new("climate.bedroom").unwrap(),
            group_name: "Bedrooms".to_string(),
            day: DayOfWeek::Wed,
            node: Node::at("07:00".parse().unwrap(), 21.0),
            previous_node: None,
            trigger: TriggerKind::Scheduled,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: TransitionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
