//! Group/Profile Registry — the in-memory model of which devices share
//! which schedule.
//!
//! The registry enforces the membership invariant itself: every tracked
//! device belongs to exactly one group at all times. Devices without a
//! user-created group live in auto-created single-device groups, and the
//! add/remove operations atomically create and delete those auto groups so
//! no caller ever has to remember to.
//!
//! All methods are synchronous; the coordinator serializes access behind
//! its own lock (ticks and user operations share one serialization point).

use std::collections::BTreeMap;

use thermoplan_domain::error::{
    AlreadyExistsError, InvalidOperationError, NotFoundError, ThermoplanError,
};
use thermoplan_domain::group::Group;
use thermoplan_domain::id::{EntityId, GroupId};
use thermoplan_domain::node::Node;
use thermoplan_domain::schedule::{Bucket, ScheduleMode};

/// In-memory group model keyed by stable [`GroupId`].
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: BTreeMap<GroupId, Group>,
}

impl GroupRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted groups, applying the one-time normalization:
    /// an ignored group can never be enabled.
    #[must_use]
    pub fn from_groups(groups: Vec<Group>) -> Self {
        let groups = groups
            .into_iter()
            .map(|mut g| {
                if g.ignored {
                    g.enabled = false;
                }
                (g.id, g)
            })
            .collect();
        Self { groups }
    }

    /// Clone the full group set for persistence.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Group> {
        self.groups.values().cloned().collect()
    }

    /// Iterate all groups.
    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Display names of all groups; auto single-device groups are skipped
    /// unless requested.
    #[must_use]
    pub fn names(&self, include_auto: bool) -> Vec<String> {
        self.groups
            .values()
            .filter(|g| include_auto || !g.auto)
            .map(|g| g.name.clone())
            .collect()
    }

    /// Look up a group by display name.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for an unknown name.
    pub fn group(&self, name: &str) -> Result<&Group, ThermoplanError> {
        self.groups
            .values()
            .find(|g| g.name == name)
            .ok_or_else(|| not_found(name))
    }

    /// The group a device currently belongs to, if it is tracked at all.
    #[must_use]
    pub fn group_of(&self, entity: &EntityId) -> Option<&Group> {
        self.groups.values().find(|g| g.contains(entity))
    }

    fn id_by_name(&self, name: &str) -> Option<GroupId> {
        self.groups
            .values()
            .find(|g| g.name == name)
            .map(|g| g.id)
    }

    fn group_mut(&mut self, name: &str) -> Result<&mut Group, ThermoplanError> {
        self.groups
            .values_mut()
            .find(|g| g.name == name)
            .ok_or_else(|| not_found(name))
    }

    /// Create a user-named group with the default schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::AlreadyExists`] when any group (auto ones
    /// included) already uses the name, [`ThermoplanError::Validation`] for
    /// an empty name.
    pub fn create_group(&mut self, name: &str) -> Result<GroupId, ThermoplanError> {
        if self.id_by_name(name).is_some() {
            return Err(already_exists(name));
        }
        let group = Group::named(name)?;
        let id = group.id;
        self.groups.insert(id, group);
        Ok(id)
    }

    /// Delete a group, moving every member into its own auto group seeded
    /// from the deleted group's live schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for an unknown name.
    pub fn delete_group(&mut self, name: &str) -> Result<Vec<EntityId>, ThermoplanError> {
        let id = self.id_by_name(name).ok_or_else(|| not_found(name))?;
        let Some(group) = self.groups.remove(&id) else {
            return Err(not_found(name));
        };
        let displaced = group.entities.clone();
        for entity in &displaced {
            let auto = Group::auto_for_with_schedule(
                entity.clone(),
                group.schedule_mode,
                group.schedules.clone(),
            );
            self.groups.insert(auto.id, auto);
        }
        Ok(displaced)
    }

    /// Rename a user group. Auto groups keep their derived name.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for an unknown old name,
    /// [`ThermoplanError::AlreadyExists`] for a taken new name, and
    /// [`ThermoplanError::InvalidOperation`] for auto groups.
    pub fn rename_group(&mut self, old: &str, new: &str) -> Result<(), ThermoplanError> {
        if self.id_by_name(new).is_some() {
            return Err(already_exists(new));
        }
        let group = self.group_mut(old)?;
        if group.auto {
            return Err(InvalidOperationError::RenameAutoGroup(old.to_string()).into());
        }
        if new.is_empty() {
            return Err(thermoplan_domain::error::ValidationError::EmptyName.into());
        }
        group.name = new.to_string();
        Ok(())
    }

    /// Make sure a device is tracked, auto-creating its single-device
    /// group when it is not. Returns the id of the device's group.
    pub fn ensure_tracked(&mut self, entity: &EntityId) -> GroupId {
        if let Some(group) = self.group_of(entity) {
            return group.id;
        }
        let auto = Group::auto_for(entity.clone());
        let id = auto.id;
        self.groups.insert(id, auto);
        id
    }

    /// Move a device into a group.
    ///
    /// The move is atomic: the device leaves its current group (an emptied
    /// auto group is deleted; an emptied named group is retained inert)
    /// and joins the target in one call. Adding a device to the group it
    /// is already in is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for an unknown target group.
    pub fn add_entity(&mut self, group_name: &str, entity: &EntityId) -> Result<(), ThermoplanError> {
        let target_id = self
            .id_by_name(group_name)
            .ok_or_else(|| not_found(group_name))?;

        if let Some(current) = self.group_of(entity) {
            if current.id == target_id {
                return Ok(());
            }
            let current_id = current.id;
            let current_auto = current.auto;
            if current_auto {
                self.groups.remove(&current_id);
            } else if let Some(g) = self.groups.get_mut(&current_id) {
                g.entities.retain(|e| e != entity);
            }
        }

        let Some(target) = self.groups.get_mut(&target_id) else {
            return Err(not_found(group_name));
        };
        target.entities.push(entity.clone());
        Ok(())
    }

    /// Remove a device from a named group.
    ///
    /// The device receives a fresh auto group seeded from the old group's
    /// live schedule, so its setpoints keep evolving as before.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] when the group is unknown or
    /// does not contain the device, and
    /// [`ThermoplanError::InvalidOperation`] when the group is the
    /// device's own auto group.
    pub fn remove_entity(
        &mut self,
        group_name: &str,
        entity: &EntityId,
    ) -> Result<(), ThermoplanError> {
        let group = self.group_mut(group_name)?;
        if !group.contains(entity) {
            return Err(NotFoundError {
                kind: "entity",
                name: entity.to_string(),
            }
            .into());
        }
        if group.auto {
            return Err(InvalidOperationError::RemoveFromAutoGroup(entity.to_string()).into());
        }
        group.entities.retain(|e| e != entity);
        let auto = Group::auto_for_with_schedule(
            entity.clone(),
            group.schedule_mode,
            group.schedules.clone(),
        );
        self.groups.insert(auto.id, auto);
        Ok(())
    }

    /// Enable or disable reconciliation for a group. Enabling clears the
    /// ignored flag (an ignored group can never be enabled).
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for an unknown name.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), ThermoplanError> {
        let group = self.group_mut(name)?;
        group.enabled = enabled;
        if enabled {
            group.ignored = false;
        }
        Ok(())
    }

    /// Mark a group ignored (never reconciled) or lift the mark.
    ///
    /// Ignoring also disables the group; un-ignoring leaves it disabled
    /// until explicitly re-enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for an unknown name.
    pub fn set_ignored(&mut self, name: &str, ignored: bool) -> Result<(), ThermoplanError> {
        let group = self.group_mut(name)?;
        group.ignored = ignored;
        if ignored {
            group.enabled = false;
        }
        Ok(())
    }

    /// Replace one bucket of a group's live schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for an unknown name or
    /// [`ThermoplanError::Validation`] for invalid nodes.
    pub fn set_schedule(
        &mut self,
        name: &str,
        mode: ScheduleMode,
        bucket: Bucket,
        nodes: Vec<Node>,
    ) -> Result<(), ThermoplanError> {
        let group = self.group_mut(name)?;
        group.set_schedule(mode, bucket, nodes)?;
        Ok(())
    }

    /// Drop every node list from a group's live schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for an unknown name.
    pub fn clear_schedule(&mut self, name: &str) -> Result<(), ThermoplanError> {
        self.group_mut(name)?.clear_schedule();
        Ok(())
    }

    /// Create a profile on a group (a copy of its live schedule).
    ///
    /// # Errors
    ///
    /// Propagates group lookup and profile errors.
    pub fn create_profile(&mut self, name: &str, profile: &str) -> Result<(), ThermoplanError> {
        self.group_mut(name)?.create_profile(profile)
    }

    /// Delete a profile from a group.
    ///
    /// # Errors
    ///
    /// Propagates group lookup and profile errors.
    pub fn delete_profile(&mut self, name: &str, profile: &str) -> Result<(), ThermoplanError> {
        self.group_mut(name)?.delete_profile(profile)
    }

    /// Rename a profile on a group.
    ///
    /// # Errors
    ///
    /// Propagates group lookup and profile errors.
    pub fn rename_profile(
        &mut self,
        name: &str,
        old: &str,
        new: &str,
    ) -> Result<(), ThermoplanError> {
        self.group_mut(name)?.rename_profile(old, new)
    }

    /// Switch a group's active profile.
    ///
    /// # Errors
    ///
    /// Propagates group lookup and profile errors.
    pub fn activate_profile(&mut self, name: &str, profile: &str) -> Result<(), ThermoplanError> {
        self.group_mut(name)?.activate_profile(profile)
    }
}

fn not_found(name: &str) -> ThermoplanError {
    NotFoundError {
        kind: "group",
        name: name.to_string(),
    }
    .into()
}

fn already_exists(name: &str) -> ThermoplanError {
    AlreadyExistsError {
        kind: "group",
        name: name.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermoplan_domain::schedule::NodeTime;

    fn entity(raw: &str) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    fn t(s: &str) -> NodeTime {
        s.parse().unwrap()
    }

    #[test]
    fn should_auto_create_single_device_group_for_new_entity() {
        let mut reg = GroupRegistry::new();
        let id = reg.ensure_tracked(&entity("climate.hall"));
        let group = reg.group_of(&entity("climate.hall")).unwrap();
        assert_eq!(group.id, id);
        assert!(group.auto);
        assert_eq!(group.name, "climate.hall");
    }

    #[test]
    fn should_keep_ensure_tracked_idempotent() {
        let mut reg = GroupRegistry::new();
        let first = reg.ensure_tracked(&entity("climate.hall"));
        let second = reg.ensure_tracked(&entity("climate.hall"));
        assert_eq!(first, second);
        assert_eq!(reg.iter().count(), 1);
    }

    #[test]
    fn should_move_entity_atomically_and_delete_emptied_auto_group() {
        let mut reg = GroupRegistry::new();
        reg.ensure_tracked(&entity("climate.hall"));
        reg.create_group("Bedrooms").unwrap();

        reg.add_entity("Bedrooms", &entity("climate.hall")).unwrap();

        let group = reg.group_of(&entity("climate.hall")).unwrap();
        assert_eq!(group.name, "Bedrooms");
        // The emptied auto group is gone.
        assert_eq!(reg.iter().count(), 1);
    }

    #[test]
    fn should_retain_emptied_named_group_after_move() {
        let mut reg = GroupRegistry::new();
        reg.create_group("Bedrooms").unwrap();
        reg.create_group("Upstairs").unwrap();
        reg.add_entity("Bedrooms", &entity("climate.a")).unwrap();

        reg.add_entity("Upstairs", &entity("climate.a")).unwrap();

        let bedrooms = reg.group("Bedrooms").unwrap();
        assert!(bedrooms.entities.is_empty());
        assert!(!bedrooms.is_reconcilable());
    }

    #[test]
    fn should_treat_re_adding_to_same_group_as_noop() {
        let mut reg = GroupRegistry::new();
        reg.create_group("Bedrooms").unwrap();
        reg.add_entity("Bedrooms", &entity("climate.a")).unwrap();
        reg.add_entity("Bedrooms", &entity("climate.a")).unwrap();
        assert_eq!(reg.group("Bedrooms").unwrap().entities.len(), 1);
    }

    #[test]
    fn should_seed_auto_group_from_old_schedule_on_remove() {
        let mut reg = GroupRegistry::new();
        reg.create_group("Bedrooms").unwrap();
        reg.add_entity("Bedrooms", &entity("climate.a")).unwrap();
        reg.set_schedule(
            "Bedrooms",
            ScheduleMode::AllDays,
            Bucket::AllDays,
            vec![Node::at(t("05:30"), 16.5)],
        )
        .unwrap();

        reg.remove_entity("Bedrooms", &entity("climate.a")).unwrap();

        let auto = reg.group_of(&entity("climate.a")).unwrap();
        assert!(auto.auto);
        let nodes = auto.schedules.nodes_for(Bucket::AllDays);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].temp, Some(16.5));
    }

    #[test]
    fn should_refuse_removing_entity_from_its_own_auto_group() {
        let mut reg = GroupRegistry::new();
        reg.ensure_tracked(&entity("climate.a"));
        let result = reg.remove_entity("climate.a", &entity("climate.a"));
        assert!(matches!(
            result,
            Err(ThermoplanError::InvalidOperation(
                InvalidOperationError::RemoveFromAutoGroup(_)
            ))
        ));
    }

    #[test]
    fn should_displace_members_into_auto_groups_on_group_delete() {
        let mut reg = GroupRegistry::new();
        reg.create_group("Bedrooms").unwrap();
        reg.add_entity("Bedrooms", &entity("climate.a")).unwrap();
        reg.add_entity("Bedrooms", &entity("climate.b")).unwrap();

        let displaced = reg.delete_group("Bedrooms").unwrap();
        assert_eq!(displaced.len(), 2);
        assert!(reg.group("Bedrooms").is_err());
        assert!(reg.group_of(&entity("climate.a")).unwrap().auto);
        assert!(reg.group_of(&entity("climate.b")).unwrap().auto);
    }

    #[test]
    fn should_reject_duplicate_group_names_including_auto_ones() {
        let mut reg = GroupRegistry::new();
        reg.ensure_tracked(&entity("climate.hall"));
        assert!(matches!(
            reg.create_group("climate.hall"),
            Err(ThermoplanError::AlreadyExists(_))
        ));
    }

    #[test]
    fn should_rename_group_and_refuse_taken_names() {
        let mut reg = GroupRegistry::new();
        reg.create_group("Bedrooms").unwrap();
        reg.create_group("Kitchen").unwrap();

        reg.rename_group("Bedrooms", "Upstairs").unwrap();
        assert!(reg.group("Upstairs").is_ok());
        assert!(matches!(
            reg.rename_group("Kitchen", "Upstairs"),
            Err(ThermoplanError::AlreadyExists(_))
        ));
    }

    #[test]
    fn should_refuse_renaming_auto_groups() {
        let mut reg = GroupRegistry::new();
        reg.ensure_tracked(&entity("climate.a"));
        assert!(matches!(
            reg.rename_group("climate.a", "Hall"),
            Err(ThermoplanError::InvalidOperation(_))
        ));
    }

    #[test]
    fn should_couple_ignored_and_enabled_flags() {
        let mut reg = GroupRegistry::new();
        reg.create_group("Bedrooms").unwrap();

        reg.set_ignored("Bedrooms", true).unwrap();
        let group = reg.group("Bedrooms").unwrap();
        assert!(group.ignored);
        assert!(!group.enabled);

        // Un-ignoring does not silently re-enable.
        reg.set_ignored("Bedrooms", false).unwrap();
        assert!(!reg.group("Bedrooms").unwrap().enabled);

        // Enabling clears a stale ignored flag.
        reg.set_ignored("Bedrooms", true).unwrap();
        reg.set_enabled("Bedrooms", true).unwrap();
        let group = reg.group("Bedrooms").unwrap();
        assert!(group.enabled);
        assert!(!group.ignored);
    }

    #[test]
    fn should_normalize_ignored_groups_to_disabled_on_load() {
        let mut group = Group::named("Bedrooms").unwrap();
        group.ignored = true;
        group.enabled = true; // inconsistent persisted state

        let reg = GroupRegistry::from_groups(vec![group]);
        let loaded = reg.group("Bedrooms").unwrap();
        assert!(loaded.ignored);
        assert!(!loaded.enabled);
    }

    #[test]
    fn should_skip_auto_groups_in_name_listing() {
        let mut reg = GroupRegistry::new();
        reg.create_group("Bedrooms").unwrap();
        reg.ensure_tracked(&entity("climate.a"));

        assert_eq!(reg.names(false), vec!["Bedrooms".to_string()]);
        assert_eq!(reg.names(true).len(), 2);
    }

    #[test]
    fn should_return_not_found_for_unknown_group() {
        let reg = GroupRegistry::new();
        assert!(matches!(
            reg.group("Nope"),
            Err(ThermoplanError::NotFound(_))
        ));
    }
}
