//! Override Ledger — manual-advance windows and their audit history.
//!
//! Tracks, per device, the `override_until` window during which the
//! reconciliation tick must leave the device alone, plus an append-only
//! history of advance activations and how each one ended (cancelled by
//! the user or completed by reaching the window's end).
//!
//! Like the registry, this is a synchronous in-memory structure guarded by
//! the coordinator's single serialization point.

use std::collections::BTreeMap;

use thermoplan_domain::advance::{AdvanceHistoryEntry, AdvanceLedgerSnapshot, AdvanceStatus};
use thermoplan_domain::id::EntityId;
use thermoplan_domain::time::Timestamp;

/// Per-device override windows + advance history.
#[derive(Debug, Default)]
pub struct OverrideLedger {
    override_until: BTreeMap<EntityId, Timestamp>,
    entities: BTreeMap<EntityId, Vec<AdvanceHistoryEntry>>,
    groups: BTreeMap<String, Vec<AdvanceHistoryEntry>>,
}

impl OverrideLedger {
    /// An empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the history from a persisted snapshot.
    ///
    /// Override windows are process-local and deliberately *not* restored:
    /// after a restart the next tick simply re-applies the schedule.
    #[must_use]
    pub fn from_snapshot(snapshot: AdvanceLedgerSnapshot) -> Self {
        Self {
            override_until: BTreeMap::new(),
            entities: snapshot.entities,
            groups: snapshot.groups,
        }
    }

    /// Clone the history for persistence.
    #[must_use]
    pub fn snapshot(&self) -> AdvanceLedgerSnapshot {
        AdvanceLedgerSnapshot {
            entities: self.entities.clone(),
            groups: self.groups.clone(),
        }
    }

    /// The device's active override window end, if any is recorded.
    #[must_use]
    pub fn override_until(&self, entity: &EntityId) -> Option<Timestamp> {
        self.override_until.get(entity).copied()
    }

    /// Whether the device is inside an override window at `now`.
    #[must_use]
    pub fn is_overridden(&self, entity: &EntityId, now: Timestamp) -> bool {
        self.override_until(entity).is_some_and(|until| now < until)
    }

    /// The advance-status query answer.
    #[must_use]
    pub fn status(&self, entity: &EntityId, now: Timestamp) -> AdvanceStatus {
        match self.override_until(entity) {
            Some(until) if now < until => AdvanceStatus::active_until(until),
            _ => AdvanceStatus::inactive(),
        }
    }

    /// Open an override window and append the matching history entry.
    pub fn begin(&mut self, entity: EntityId, until: Timestamp, entry: AdvanceHistoryEntry) {
        self.override_until.insert(entity.clone(), until);
        self.entities.entry(entity).or_default().push(entry);
    }

    /// Record a group-level advance entry (mirrors the first per-member
    /// success of a group advance).
    pub fn record_group(&mut self, group_name: &str, entry: AdvanceHistoryEntry) {
        self.groups
            .entry(group_name.to_string())
            .or_default()
            .push(entry);
    }

    /// Cancel an advance: clear the window and stamp the most recent open
    /// history entry.
    ///
    /// Tolerant of being called with no active override — an open entry is
    /// still closed if one exists. Returns whether anything changed.
    pub fn cancel(&mut self, entity: &EntityId, now: Timestamp) -> bool {
        let removed = self.override_until.remove(entity).is_some();
        removed | self.close_open_entry(entity, now)
    }

    /// Expire the window if its end has passed: stamp the open history
    /// entry completed and clear the window. Returns whether it expired.
    pub fn expire_if_due(&mut self, entity: &EntityId, now: Timestamp) -> bool {
        match self.override_until.get(entity) {
            Some(until) if now >= *until => {
                self.override_until.remove(entity);
                self.close_open_entry(entity, now);
                true
            }
            _ => false,
        }
    }

    fn close_open_entry(&mut self, entity: &EntityId, now: Timestamp) -> bool {
        if let Some(entries) = self.entities.get_mut(entity) {
            if let Some(open) = entries.iter_mut().rev().find(|e| e.is_open()) {
                open.cancelled_at = Some(now);
                return true;
            }
        }
        false
    }

    /// History entries activated at or after `since`, oldest first.
    #[must_use]
    pub fn history(&self, entity: &EntityId, since: Timestamp) -> Vec<AdvanceHistoryEntry> {
        self.entities
            .get(entity)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.activated_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop all history for one device.
    pub fn clear_history(&mut self, entity: &EntityId) {
        self.entities.remove(entity);
    }

    /// Drop everything (factory reset).
    pub fn clear(&mut self) {
        self.override_until.clear();
        self.entities.clear();
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermoplan_domain::node::Node;

    fn entity(raw: &str) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn entry(activated: &str) -> AdvanceHistoryEntry {
        AdvanceHistoryEntry::activated(ts(activated), Node::at("21:00".parse().unwrap(), 17.0))
    }

    #[test]
    fn should_report_override_only_inside_window() {
        let mut ledger = OverrideLedger::new();
        let e = entity("climate.a");
        ledger.begin(e.clone(), ts("2024-01-15T21:00:00"), entry("2024-01-15T18:45:00"));

        assert!(ledger.is_overridden(&e, ts("2024-01-15T20:00:00")));
        assert!(!ledger.is_overridden(&e, ts("2024-01-15T21:00:00")));
        assert!(ledger.status(&e, ts("2024-01-15T20:00:00")).has_override);
        assert!(!ledger.status(&e, ts("2024-01-15T22:00:00")).has_override);
    }

    #[test]
    fn should_expire_window_and_stamp_entry_completed() {
        let mut ledger = OverrideLedger::new();
        let e = entity("climate.a");
        ledger.begin(e.clone(), ts("2024-01-15T21:00:00"), entry("2024-01-15T18:45:00"));

        assert!(!ledger.expire_if_due(&e, ts("2024-01-15T20:59:00")));
        assert!(ledger.expire_if_due(&e, ts("2024-01-15T21:00:00")));

        let history = ledger.history(&e, ts("2024-01-01T00:00:00"));
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].cancelled_at, Some(ts("2024-01-15T21:00:00")));
        assert!(ledger.override_until(&e).is_none());
    }

    #[test]
    fn should_cancel_window_and_close_open_entry() {
        let mut ledger = OverrideLedger::new();
        let e = entity("climate.a");
        ledger.begin(e.clone(), ts("2024-01-15T21:00:00"), entry("2024-01-15T18:45:00"));

        assert!(ledger.cancel(&e, ts("2024-01-15T19:00:00")));
        assert!(!ledger.is_overridden(&e, ts("2024-01-15T19:01:00")));

        let history = ledger.history(&e, ts("2024-01-01T00:00:00"));
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_open());
    }

    #[test]
    fn should_tolerate_cancel_without_active_override() {
        let mut ledger = OverrideLedger::new();
        let e = entity("climate.a");
        assert!(!ledger.cancel(&e, ts("2024-01-15T19:00:00")));

        // An expired-but-open entry still gets closed.
        ledger.begin(e.clone(), ts("2024-01-15T10:00:00"), entry("2024-01-15T09:00:00"));
        ledger.override_until.remove(&e);
        assert!(ledger.cancel(&e, ts("2024-01-15T19:00:00")));
    }

    #[test]
    fn should_stamp_only_most_recent_open_entry() {
        let mut ledger = OverrideLedger::new();
        let e = entity("climate.a");
        ledger.begin(e.clone(), ts("2024-01-15T10:00:00"), entry("2024-01-15T09:00:00"));
        ledger.cancel(&e, ts("2024-01-15T09:30:00"));
        ledger.begin(e.clone(), ts("2024-01-15T21:00:00"), entry("2024-01-15T18:45:00"));

        ledger.cancel(&e, ts("2024-01-15T19:00:00"));

        let history = ledger.history(&e, ts("2024-01-01T00:00:00"));
        assert_eq!(history[0].cancelled_at, Some(ts("2024-01-15T09:30:00")));
        assert_eq!(history[1].cancelled_at, Some(ts("2024-01-15T19:00:00")));
    }

    #[test]
    fn should_filter_history_by_activation_time() {
        let mut ledger = OverrideLedger::new();
        let e = entity("climate.a");
        ledger.begin(e.clone(), ts("2024-01-10T10:00:00"), entry("2024-01-10T09:00:00"));
        ledger.begin(e.clone(), ts("2024-01-15T21:00:00"), entry("2024-01-15T18:45:00"));

        let recent = ledger.history(&e, ts("2024-01-15T00:00:00"));
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].activated_at, ts("2024-01-15T18:45:00"));
    }

    #[test]
    fn should_not_restore_override_windows_from_snapshot() {
        let mut ledger = OverrideLedger::new();
        let e = entity("climate.a");
        ledger.begin(e.clone(), ts("2024-01-15T21:00:00"), entry("2024-01-15T18:45:00"));

        let restored = OverrideLedger::from_snapshot(ledger.snapshot());
        assert!(restored.override_until(&e).is_none());
        assert_eq!(restored.history(&e, ts("2024-01-01T00:00:00")).len(), 1);
    }

    #[test]
    fn should_record_group_level_entries_separately() {
        let mut ledger = OverrideLedger::new();
        ledger.record_group("Bedrooms", entry("2024-01-15T18:45:00"));
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.groups["Bedrooms"].len(), 1);
        assert!(snapshot.entities.is_empty());
    }
}
