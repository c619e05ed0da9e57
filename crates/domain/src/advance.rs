//! Advance records — manual override windows and their audit history.
//!
//! An *advance* jumps a device to its next scheduled node early. The
//! device is then left alone until the time that node would have activated
//! naturally; the window and its outcome are recorded per device.

use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::schedule::NodeTime;
use crate::time::Timestamp;

/// One advance activation and its eventual resolution.
///
/// `cancelled_at == None` means the advance is still in effect (or was
/// never resolved); the coordinator stamps it either on explicit cancel
/// or when the override window expires naturally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvanceHistoryEntry {
    pub activated_at: Timestamp,
    /// The wall-clock time the advanced node would have activated itself.
    pub target_time: NodeTime,
    pub target_node: Node,
    #[serde(default)]
    pub cancelled_at: Option<Timestamp>,
}

impl AdvanceHistoryEntry {
    /// Record a fresh activation.
    #[must_use]
    pub fn activated(at: Timestamp, target_node: Node) -> Self {
        Self {
            activated_at: at,
            target_time: target_node.time,
            target_node,
            cancelled_at: None,
        }
    }

    /// Whether this advance has not been cancelled or completed yet.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.cancelled_at.is_none()
    }
}

/// The full advance history as persisted: per-device entries plus the
/// group-level entries recorded by group advances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvanceLedgerSnapshot {
    pub entities: std::collections::BTreeMap<crate::id::EntityId, Vec<AdvanceHistoryEntry>>,
    pub groups: std::collections::BTreeMap<String, Vec<AdvanceHistoryEntry>>,
}

/// Answer to the advance-status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvanceStatus {
    pub has_override: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_until: Option<Timestamp>,
}

impl AdvanceStatus {
    /// No override window is active.
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            has_override: false,
            override_until: None,
        }
    }

    /// An override window is active until `until`.
    #[must_use]
    pub fn active_until(until: Timestamp) -> Self {
        Self {
            has_override: true,
            override_until: Some(until),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn sample_node() -> Node {
        Node::at("21:00".parse().unwrap(), 17.0)
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn should_open_entry_on_activation() {
        let entry = AdvanceHistoryEntry::activated(ts("2024-01-15T18:45:00"), sample_node());
        assert!(entry.is_open());
        assert_eq!(entry.target_time, "21:00".parse().unwrap());
    }

    #[test]
    fn should_close_entry_once_stamped() {
        let mut entry = AdvanceHistoryEntry::activated(ts("2024-01-15T18:45:00"), sample_node());
        entry.cancelled_at = Some(ts("2024-01-15T19:00:00"));
        assert!(!entry.is_open());
    }

    #[test]
    fn should_roundtrip_history_entry_through_serde() {
        let entry = AdvanceHistoryEntry::activated(ts("2024-01-15T18:45:00"), sample_node());
        let json = serde_json::to_string(&entry).unwrap();
        let back: AdvanceHistoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
