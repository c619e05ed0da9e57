//! Groups and profiles — which devices share which schedule.
//!
//! Every device belongs to exactly one group at all times. Devices without
//! a user-created group live in an auto-created single-device group, so
//! nothing downstream ever special-cases "ungrouped". Auto groups are
//! keyed by [`GroupId`] like any other group; their display name is
//! derived from the member device and carries no identity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{
    AlreadyExistsError, InvalidOperationError, NotFoundError, ThermoplanError, ValidationError,
};
use crate::id::{EntityId, GroupId};
use crate::node::Node;
use crate::schedule::{Bucket, NodeTime, ScheduleMode, ScheduleSet};

/// Name of the profile every group starts with.
pub const DEFAULT_PROFILE: &str = "Default";

/// The schedule seeded into new groups and profiles.
#[must_use]
pub fn default_schedule() -> ScheduleSet {
    let nodes = vec![
        Node::at(NodeTime::MIDNIGHT, 18.0),
        Node::at(NodeTime::new(7, 0).expect("valid time"), 21.0),
        Node::at(NodeTime::new(23, 0).expect("valid time"), 18.0),
    ];
    ScheduleSet::with_bucket(Bucket::AllDays, nodes).expect("default nodes have unique times")
}

/// A named, switchable schedule variant stored inside a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub schedule_mode: ScheduleMode,
    pub schedules: ScheduleSet,
}

/// A set of devices sharing one live schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Stable internal key; display names can change freely.
    pub id: GroupId,
    pub name: String,
    /// Whether this is an auto-created single-device group.
    #[serde(default)]
    pub auto: bool,
    pub entities: Vec<EntityId>,
    pub enabled: bool,
    #[serde(default)]
    pub ignored: bool,
    /// Live schedule, mirrored into the active profile on every edit.
    pub schedule_mode: ScheduleMode,
    pub schedules: ScheduleSet,
    pub active_profile: String,
    pub profiles: BTreeMap<String, Profile>,
}

impl Group {
    /// Create a user-named multi-device group with the default schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when the name is empty.
    pub fn named(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self::build(name, false, Vec::new(), ScheduleMode::AllDays, default_schedule()))
    }

    /// Create the auto single-device group for `entity`, seeded with the
    /// default schedule.
    #[must_use]
    pub fn auto_for(entity: EntityId) -> Self {
        let name = entity.to_string();
        Self::build(
            name,
            true,
            vec![entity],
            ScheduleMode::AllDays,
            default_schedule(),
        )
    }

    /// Create the auto single-device group for `entity`, seeded with an
    /// existing schedule (used to preserve continuity when a device leaves
    /// a named group).
    #[must_use]
    pub fn auto_for_with_schedule(
        entity: EntityId,
        schedule_mode: ScheduleMode,
        schedules: ScheduleSet,
    ) -> Self {
        let name = entity.to_string();
        Self::build(name, true, vec![entity], schedule_mode, schedules)
    }

    fn build(
        name: String,
        auto: bool,
        entities: Vec<EntityId>,
        schedule_mode: ScheduleMode,
        schedules: ScheduleSet,
    ) -> Self {
        let default_profile = Profile {
            name: DEFAULT_PROFILE.to_string(),
            schedule_mode,
            schedules: schedules.clone(),
        };
        Self {
            id: GroupId::new(),
            name,
            auto,
            entities,
            enabled: true,
            ignored: false,
            schedule_mode,
            schedules,
            active_profile: DEFAULT_PROFILE.to_string(),
            profiles: BTreeMap::from([(DEFAULT_PROFILE.to_string(), default_profile)]),
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when the name is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }

    /// Whether the reconciliation tick should touch this group's devices.
    #[must_use]
    pub fn is_reconcilable(&self) -> bool {
        self.enabled && !self.ignored && !self.entities.is_empty()
    }

    /// Whether `entity` is a member.
    #[must_use]
    pub fn contains(&self, entity: &EntityId) -> bool {
        self.entities.iter().any(|e| e == entity)
    }

    /// Replace one bucket of the live schedule and switch the live mode.
    ///
    /// The edit is mirrored into the active profile so it survives a
    /// profile switch and back.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateTime`] when two nodes share a time.
    pub fn set_schedule(
        &mut self,
        mode: ScheduleMode,
        bucket: Bucket,
        nodes: Vec<Node>,
    ) -> Result<(), ValidationError> {
        self.schedules.set_nodes(bucket, nodes)?;
        self.schedule_mode = mode;
        self.mirror_into_active_profile();
        Ok(())
    }

    /// Drop every node list from the live schedule (and the active profile).
    pub fn clear_schedule(&mut self) {
        self.schedules = ScheduleSet::new();
        self.mirror_into_active_profile();
    }

    fn mirror_into_active_profile(&mut self) {
        let mode = self.schedule_mode;
        let schedules = self.schedules.clone();
        if let Some(profile) = self.profiles.get_mut(&self.active_profile) {
            profile.schedule_mode = mode;
            profile.schedules = schedules;
        }
    }

    /// Create a new profile as a copy of the live schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::Validation`] for an empty name and
    /// [`ThermoplanError::AlreadyExists`] for a duplicate one.
    pub fn create_profile(&mut self, name: impl Into<String>) -> Result<(), ThermoplanError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.profiles.contains_key(&name) {
            return Err(AlreadyExistsError {
                kind: "profile",
                name,
            }
            .into());
        }
        self.profiles.insert(
            name.clone(),
            Profile {
                name,
                schedule_mode: self.schedule_mode,
                schedules: self.schedules.clone(),
            },
        );
        Ok(())
    }

    /// Delete a profile.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for an unknown name, and
    /// [`ThermoplanError::InvalidOperation`] when targeting the active or
    /// last remaining profile.
    pub fn delete_profile(&mut self, name: &str) -> Result<(), ThermoplanError> {
        if !self.profiles.contains_key(name) {
            return Err(NotFoundError {
                kind: "profile",
                name: name.to_string(),
            }
            .into());
        }
        if name == self.active_profile {
            return Err(InvalidOperationError::DeleteActiveProfile(name.to_string()).into());
        }
        if self.profiles.len() == 1 {
            return Err(InvalidOperationError::DeleteLastProfile(name.to_string()).into());
        }
        self.profiles.remove(name);
        Ok(())
    }

    /// Rename a profile, following the active-profile pointer if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for an unknown old name,
    /// [`ThermoplanError::AlreadyExists`] for a taken new name, and
    /// [`ThermoplanError::Validation`] for an empty new name.
    pub fn rename_profile(&mut self, old: &str, new: impl Into<String>) -> Result<(), ThermoplanError> {
        let new = new.into();
        if new.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.profiles.contains_key(&new) {
            return Err(AlreadyExistsError {
                kind: "profile",
                name: new,
            }
            .into());
        }
        let Some(mut profile) = self.profiles.remove(old) else {
            return Err(NotFoundError {
                kind: "profile",
                name: old.to_string(),
            }
            .into());
        };
        profile.name.clone_from(&new);
        if self.active_profile == old {
            self.active_profile.clone_from(&new);
        }
        self.profiles.insert(new, profile);
        Ok(())
    }

    /// Switch the active profile, copying its stored schedule into the
    /// live fields. Live edits always mirror into the active profile, so
    /// nothing needs to be written back at switch time.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for an unknown profile.
    pub fn activate_profile(&mut self, name: &str) -> Result<(), ThermoplanError> {
        let Some(profile) = self.profiles.get(name) else {
            return Err(NotFoundError {
                kind: "profile",
                name: name.to_string(),
            }
            .into());
        };
        self.schedule_mode = profile.schedule_mode;
        self.schedules = profile.schedules.clone();
        self.active_profile = name.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::DayOfWeek;

    fn t(s: &str) -> NodeTime {
        s.parse().unwrap()
    }

    fn entity(raw: &str) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    #[test]
    fn should_seed_new_group_with_default_profile_and_schedule() {
        let group = Group::named("Bedrooms").unwrap();
        assert_eq!(group.active_profile, DEFAULT_PROFILE);
        assert_eq!(group.profiles.len(), 1);
        assert!(!group.schedules.is_empty());
        assert!(group.enabled);
        assert!(!group.auto);
    }

    #[test]
    fn should_reject_empty_group_name() {
        assert!(matches!(Group::named(""), Err(ValidationError::EmptyName)));
    }

    #[test]
    fn should_derive_auto_group_name_from_entity() {
        let group = Group::auto_for(entity("climate.hall"));
        assert!(group.auto);
        assert_eq!(group.name, "climate.hall");
        assert_eq!(group.entities.len(), 1);
    }

    #[test]
    fn should_not_reconcile_ignored_or_empty_groups() {
        let mut group = Group::named("Bedrooms").unwrap();
        assert!(!group.is_reconcilable()); // no entities yet

        group.entities.push(entity("climate.a"));
        assert!(group.is_reconcilable());

        group.ignored = true;
        assert!(!group.is_reconcilable());

        group.ignored = false;
        group.enabled = false;
        assert!(!group.is_reconcilable());
    }

    #[test]
    fn should_mirror_schedule_edit_into_active_profile() {
        let mut group = Group::named("Bedrooms").unwrap();
        group
            .set_schedule(
                ScheduleMode::Individual,
                Bucket::Day(DayOfWeek::Mon),
                vec![Node::at(t("06:00"), 19.0)],
            )
            .unwrap();

        let profile = &group.profiles[DEFAULT_PROFILE];
        assert_eq!(profile.schedule_mode, ScheduleMode::Individual);
        assert_eq!(
            profile.schedules.nodes_for(Bucket::Day(DayOfWeek::Mon)).len(),
            1
        );
    }

    #[test]
    fn should_copy_profile_schedules_not_share_them() {
        let mut group = Group::named("Bedrooms").unwrap();
        group.create_profile("Winter").unwrap();

        // Editing the live schedule (mirrored into "Default") must not
        // leak into the stored "Winter" copy.
        group
            .set_schedule(
                ScheduleMode::AllDays,
                Bucket::AllDays,
                vec![Node::at(t("05:00"), 25.0)],
            )
            .unwrap();

        let winter = &group.profiles["Winter"];
        assert_ne!(
            winter.schedules.nodes_for(Bucket::AllDays),
            group.schedules.nodes_for(Bucket::AllDays)
        );
    }

    #[test]
    fn should_restore_stored_schedule_when_activating_profile() {
        let mut group = Group::named("Bedrooms").unwrap();
        group.create_profile("Winter").unwrap();
        group
            .set_schedule(
                ScheduleMode::AllDays,
                Bucket::AllDays,
                vec![Node::at(t("05:00"), 25.0)],
            )
            .unwrap();

        group.activate_profile("Winter").unwrap();
        // Winter kept the pre-edit default schedule.
        assert_eq!(group.schedules.nodes_for(Bucket::AllDays).len(), 3);
        assert_eq!(group.active_profile, "Winter");

        // Switching back restores the edited Default schedule.
        group.activate_profile(DEFAULT_PROFILE).unwrap();
        assert_eq!(group.schedules.nodes_for(Bucket::AllDays).len(), 1);
    }

    #[test]
    fn should_refuse_deleting_active_profile() {
        let mut group = Group::named("Bedrooms").unwrap();
        group.create_profile("Winter").unwrap();
        let result = group.delete_profile(DEFAULT_PROFILE);
        assert!(matches!(
            result,
            Err(ThermoplanError::InvalidOperation(
                InvalidOperationError::DeleteActiveProfile(_)
            ))
        ));
    }

    #[test]
    fn should_refuse_deleting_last_profile() {
        let mut group = Group::named("Bedrooms").unwrap();
        group.create_profile("Winter").unwrap();
        group.activate_profile("Winter").unwrap();
        group.delete_profile(DEFAULT_PROFILE).unwrap();
        let result = group.delete_profile("Winter");
        assert!(matches!(
            result,
            Err(ThermoplanError::InvalidOperation(_))
        ));
    }

    #[test]
    fn should_reject_duplicate_profile_name() {
        let mut group = Group::named("Bedrooms").unwrap();
        group.create_profile("Winter").unwrap();
        assert!(matches!(
            group.create_profile("Winter"),
            Err(ThermoplanError::AlreadyExists(_))
        ));
    }

    #[test]
    fn should_follow_active_pointer_when_renaming_active_profile() {
        let mut group = Group::named("Bedrooms").unwrap();
        group.rename_profile(DEFAULT_PROFILE, "Everyday").unwrap();
        assert_eq!(group.active_profile, "Everyday");
        assert_eq!(group.profiles["Everyday"].name, "Everyday");
    }

    #[test]
    fn should_roundtrip_group_through_serde() {
        let group = Group::named("Bedrooms").unwrap();
        let json = serde_json::to_string(&group).unwrap();
        let back: Group = serde_json::from_str(&json).unwrap();
        assert_eq!(back, group);
    }
}
