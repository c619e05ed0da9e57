//! Reconciliation Coordinator — keeps every device on its scheduled node.
//!
//! One coordinator instance drives a fixed-interval tick plus on-demand
//! refreshes. Each tick asks the resolver which node should be active
//! *right now* for every enabled, non-ignored device, compares against the
//! last-applied signature, and actuates exactly once per real transition.
//! Manual advances short-circuit the schedule through the override ledger;
//! while a device's override window is open the tick leaves it alone.
//!
//! Ticks, refreshes, and every user-facing mutation share one
//! serialization point (the state mutex): a tick never observes a
//! half-updated registry, and two ticks never run concurrently. Refreshes
//! requested mid-tick coalesce into a single follow-up run.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use serde::Serialize;
use tokio::sync::{Mutex, Notify};

use thermoplan_domain::advance::{AdvanceHistoryEntry, AdvanceStatus};
use thermoplan_domain::error::{
    ActuationError, InvalidOperationError, NoScheduleError, NotFoundError, ThermoplanError,
};
use thermoplan_domain::event::{TransitionEvent, TriggerKind};
use thermoplan_domain::group::Group;
use thermoplan_domain::id::EntityId;
use thermoplan_domain::node::{Node, NodeSignature};
use thermoplan_domain::preview::{self, SchedulePreview};
use thermoplan_domain::schedule::{
    self, Bucket, DayOfWeek, NodeTime, ScheduleMode, ScheduleSet,
};
use thermoplan_domain::settings::Settings;

use crate::ledger::OverrideLedger;
use crate::ports::{Actuator, Clock, EventPublisher, ModeKind, ScheduleStore};
use crate::registry::GroupRegistry;

/// Tunable coordinator timings.
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorConfig {
    /// Fixed interval between reconciliation ticks.
    pub tick_interval: Duration,
    /// Upper bound on each individual device call.
    pub actuation_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            actuation_timeout: Duration::from_secs(10),
        }
    }
}

/// What an operation targets: a single device or a whole group.
///
/// Resolved once at the API boundary; handlers never sniff strings to
/// guess which one they were given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Entity(EntityId),
    Group(String),
}

/// Why the tick left a device alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A manual advance window is open.
    AdvanceOverrideActive,
    /// No node resolves for today (empty bucket, no carryover either).
    NoNodes,
    /// Still on the node that was last applied.
    SameNode,
}

/// Per-device outcome of one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum TickOutcome {
    Applied { node: Node },
    Skipped { reason: SkipReason },
    Failed { error: String },
}

/// Aggregated result of one reconciliation tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub outcomes: BTreeMap<EntityId, TickOutcome>,
}

impl TickReport {
    fn record(&mut self, entity: EntityId, outcome: TickOutcome) {
        self.outcomes.insert(entity, outcome);
    }

    /// Number of devices actuated this tick.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, TickOutcome::Applied { .. }))
            .count()
    }

    /// Number of devices whose actuation failed this tick.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, TickOutcome::Failed { .. }))
            .count()
    }
}

/// Per-member result of a group advance. Partial failure is reported
/// per device, never all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupAdvanceReport {
    pub total: usize,
    pub advanced: BTreeMap<EntityId, Node>,
    pub failed: BTreeMap<EntityId, String>,
}

impl GroupAdvanceReport {
    /// Whether at least one member advanced.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.advanced.is_empty()
    }
}

/// Read view of one group's schedule configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleView {
    pub group: String,
    pub enabled: bool,
    pub ignored: bool,
    pub schedule_mode: ScheduleMode,
    pub schedules: ScheduleSet,
    pub active_profile: String,
    pub profiles: Vec<String>,
}

/// The node most recently applied to a device, with its signature.
#[derive(Debug, Clone)]
struct AppliedNode {
    node: Node,
    signature: NodeSignature,
}

/// Everything behind the single serialization point.
struct CoordinatorState {
    registry: GroupRegistry,
    ledger: OverrideLedger,
    /// Process-local change-detection cache; rebuilt empty on restart.
    last_applied: BTreeMap<EntityId, AppliedNode>,
}

/// The reconciliation driver. See the module docs for the contract.
pub struct Coordinator<A, S, P, C> {
    actuator: A,
    store: S,
    publisher: P,
    clock: C,
    config: CoordinatorConfig,
    state: Mutex<CoordinatorState>,
    refresh: Notify,
}

impl<A, S, P, C> Coordinator<A, S, P, C>
where
    A: Actuator + Send + Sync,
    S: ScheduleStore + Send + Sync,
    P: EventPublisher + Send + Sync,
    C: Clock,
{
    /// Create a coordinator with empty state. Call [`load`](Self::load)
    /// before the first tick.
    pub fn new(actuator: A, store: S, publisher: P, clock: C, config: CoordinatorConfig) -> Self {
        Self {
            actuator,
            store,
            publisher,
            clock,
            config,
            state: Mutex::new(CoordinatorState {
                registry: GroupRegistry::new(),
                ledger: OverrideLedger::new(),
                last_applied: BTreeMap::new(),
            }),
            refresh: Notify::new(),
        }
    }

    /// Load groups and advance history from the store.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::Storage`] when the store fails.
    pub async fn load(&self) -> Result<(), ThermoplanError> {
        let groups = self.store.load_groups().await?;
        let history = self.store.load_advance_history().await?;
        let mut state = self.state.lock().await;
        state.registry = GroupRegistry::from_groups(groups);
        state.ledger = OverrideLedger::from_snapshot(history);
        state.last_applied.clear();
        Ok(())
    }

    /// Drive the periodic tick loop plus on-demand refreshes, forever.
    ///
    /// The first tick fires immediately (startup sync); refreshes
    /// requested while a tick is in flight coalesce into one extra run.
    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                () = self.refresh.notified() => {}
            }
            let report = self.tick().await;
            tracing::debug!(
                applied = report.applied_count(),
                failed = report.failed_count(),
                total = report.outcomes.len(),
                "reconciliation tick finished"
            );
        }
    }

    /// Ask the run loop to tick again as soon as the current tick (if any)
    /// finishes.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Run one reconciliation tick over every enabled, non-ignored device.
    pub async fn tick(&self) -> TickReport {
        let now = self.clock.now();
        let day = DayOfWeek::from(now.weekday());
        let at = NodeTime::from_naive(now.time());
        let settings = self.load_settings_or_default().await;

        let mut state = self.state.lock().await;
        let state = &mut *state;
        let mut report = TickReport::default();
        let mut history_dirty = false;

        let work: Vec<(EntityId, String, ScheduleMode, ScheduleSet)> = state
            .registry
            .iter()
            .filter(|g| g.is_reconcilable())
            .flat_map(|g| {
                g.entities
                    .iter()
                    .map(|e| (e.clone(), g.name.clone(), g.schedule_mode, g.schedules.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();

        for (entity, group_name, mode, schedules) in work {
            if let Some(until) = state.ledger.override_until(&entity) {
                if now < until {
                    report.record(
                        entity,
                        TickOutcome::Skipped {
                            reason: SkipReason::AdvanceOverrideActive,
                        },
                    );
                    continue;
                }
                // Window just closed: complete the history entry and keep
                // going — the device rejoins the schedule this very tick.
                state.ledger.expire_if_due(&entity, now);
                history_dirty = true;
            }

            let Some(active) = schedule::resolve_active(&schedules, mode, day, at) else {
                report.record(
                    entity,
                    TickOutcome::Skipped {
                        reason: SkipReason::NoNodes,
                    },
                );
                continue;
            };

            let signature = active.signature(&settings);
            let unchanged = state.last_applied.get(&entity).is_some_and(|last| {
                last.signature == signature && last.node.time == active.time
            });
            if unchanged {
                report.record(
                    entity,
                    TickOutcome::Skipped {
                        reason: SkipReason::SameNode,
                    },
                );
                continue;
            }

            match self.apply_node(&entity, &active, &settings).await {
                Ok(()) => {
                    let previous = state
                        .last_applied
                        .insert(
                            entity.clone(),
                            AppliedNode {
                                node: active.clone(),
                                signature,
                            },
                        )
                        .map(|a| a.node);
                    let event = TransitionEvent {
                        entity_id: entity.clone(),
                        group_name,
                        day,
                        node: active.clone(),
                        previous_node: previous,
                        trigger: TriggerKind::Scheduled,
                    };
                    let _ = self.publisher.publish(event).await;
                    report.record(entity, TickOutcome::Applied { node: active });
                }
                Err(err) => {
                    // Cache left untouched: the node still counts as "new"
                    // next tick, which retries the transition.
                    tracing::warn!(entity = %entity, error = %err, "actuation failed");
                    report.record(
                        entity,
                        TickOutcome::Failed {
                            error: err.to_string(),
                        },
                    );
                }
            }
        }

        if history_dirty {
            self.persist_history(state).await;
        }
        report
    }

    /// Apply one node to one device.
    ///
    /// An `"off"` node turns the device off (falling back to setting the
    /// hvac mode when the device has no turn-off call). Otherwise the
    /// clamped temperature goes first — its failure aborts the rest —
    /// followed by each supported auxiliary mode, whose failures are
    /// logged but not fatal.
    async fn apply_node(
        &self,
        entity: &EntityId,
        node: &Node,
        settings: &Settings,
    ) -> Result<(), ActuationError> {
        let caps = self.bounded(self.actuator.capabilities(entity)).await?;

        if node.hvac_mode.as_deref() == Some("off") {
            if let Err(err) = self.bounded(self.actuator.turn_off(entity)).await {
                tracing::debug!(entity = %entity, error = %err, "turn_off failed, trying hvac mode");
                if caps.supports(ModeKind::Hvac, "off") {
                    self.bounded(self.actuator.set_mode(entity, ModeKind::Hvac, "off"))
                        .await?;
                }
            }
            return Ok(());
        }

        if let Some(temp) = node.clamped_temp(settings) {
            if caps.has_temperature_sensor {
                self.bounded(self.actuator.set_temperature(entity, temp))
                    .await?;
            }
        }

        let mode_calls = [
            (ModeKind::Hvac, node.hvac_mode.as_deref()),
            (ModeKind::Fan, node.fan_mode.as_deref()),
            (ModeKind::Swing, node.swing_mode.as_deref()),
            (ModeKind::Preset, node.preset_mode.as_deref()),
        ];
        for (kind, value) in mode_calls {
            let Some(value) = value else { continue };
            if !caps.supports(kind, value) {
                tracing::debug!(entity = %entity, kind = %kind, value, "mode not supported, skipping");
                continue;
            }
            if let Err(err) = self.bounded(self.actuator.set_mode(entity, kind, value)).await {
                tracing::warn!(entity = %entity, kind = %kind, error = %err, "mode call failed");
            }
        }
        Ok(())
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, ActuationError>> + Send,
    ) -> Result<T, ActuationError> {
        match tokio::time::timeout(self.config.actuation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ActuationError::Timeout(self.config.actuation_timeout)),
        }
    }

    // ── Advance / override operations ──────────────────────────────

    /// Jump a device to its next scheduled node early and hold it there
    /// until that node would have fired naturally.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for untracked devices,
    /// [`ThermoplanError::NoSchedule`] when the device's group is
    /// disabled/ignored or has no nodes today, and
    /// [`ThermoplanError::Actuation`] when the device call fails.
    pub async fn advance(&self, entity: &EntityId) -> Result<Node, ThermoplanError> {
        let settings = self.load_settings_or_default().await;
        let mut state = self.state.lock().await;
        let node = self.advance_locked(&mut state, entity, &settings).await?;
        self.persist_history(&state).await;
        Ok(node)
    }

    async fn advance_locked(
        &self,
        state: &mut CoordinatorState,
        entity: &EntityId,
        settings: &Settings,
    ) -> Result<Node, ThermoplanError> {
        let now = self.clock.now();
        let day = DayOfWeek::from(now.weekday());
        let at = NodeTime::from_naive(now.time());

        let (group_name, next) = {
            let group = state.registry.group_of(entity).ok_or_else(|| NotFoundError {
                kind: "entity",
                name: entity.to_string(),
            })?;
            if !group.is_reconcilable() {
                return Err(NoScheduleError {
                    target: entity.to_string(),
                    reason: "schedule disabled or ignored",
                }
                .into());
            }
            let Some(next) = schedule::resolve_next(&group.schedules, group.schedule_mode, day, at)
            else {
                return Err(NoScheduleError {
                    target: entity.to_string(),
                    reason: "no nodes for today",
                }
                .into());
            };
            (group.name.clone(), next)
        };

        // The window ends when the advanced node would have activated by
        // itself; a time already past today means tomorrow.
        let mut until = now.date().and_time(next.time.to_naive());
        if until <= now {
            until = until + chrono::Duration::days(1);
        }

        self.apply_node(entity, &next, settings).await?;

        let signature = next.signature(settings);
        let previous = state
            .last_applied
            .insert(
                entity.clone(),
                AppliedNode {
                    node: next.clone(),
                    signature,
                },
            )
            .map(|a| a.node);
        state
            .ledger
            .begin(entity.clone(), until, AdvanceHistoryEntry::activated(now, next.clone()));
        let event = TransitionEvent {
            entity_id: entity.clone(),
            group_name,
            day,
            node: next.clone(),
            previous_node: previous,
            trigger: TriggerKind::ManualAdvance,
        };
        let _ = self.publisher.publish(event).await;
        Ok(next)
    }

    /// Advance every member of a group independently, then record one
    /// group-level history entry mirroring the first success.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for an unknown group and
    /// [`ThermoplanError::NoSchedule`] for a disabled, ignored, or empty
    /// one. Per-member failures land in the report instead.
    pub async fn advance_group(&self, name: &str) -> Result<GroupAdvanceReport, ThermoplanError> {
        let settings = self.load_settings_or_default().await;
        let mut state = self.state.lock().await;

        let (group_name, entities) = {
            let group = state.registry.group(name)?;
            if !group.enabled || group.ignored {
                return Err(NoScheduleError {
                    target: name.to_string(),
                    reason: "group disabled or ignored",
                }
                .into());
            }
            if group.entities.is_empty() {
                return Err(NoScheduleError {
                    target: name.to_string(),
                    reason: "group has no entities",
                }
                .into());
            }
            (group.name.clone(), group.entities.clone())
        };

        let mut report = GroupAdvanceReport {
            total: entities.len(),
            ..GroupAdvanceReport::default()
        };
        for entity in entities {
            match self.advance_locked(&mut state, &entity, &settings).await {
                Ok(node) => {
                    report.advanced.insert(entity, node);
                }
                Err(err) => {
                    report.failed.insert(entity, err.to_string());
                }
            }
        }

        if let Some((_, node)) = report.advanced.first_key_value() {
            let now = self.clock.now();
            state
                .ledger
                .record_group(&group_name, AdvanceHistoryEntry::activated(now, node.clone()));
        }
        self.persist_history(&state).await;
        Ok(report)
    }

    /// Cancel a device's advance: clear the window, close the open history
    /// entry, and drop the applied-node cache so the very next tick
    /// re-applies the currently scheduled node.
    ///
    /// Tolerant of being called with no override active.
    pub async fn cancel_advance(&self, entity: &EntityId) {
        let now = self.clock.now();
        {
            let mut state = self.state.lock().await;
            let changed = state.ledger.cancel(entity, now);
            state.last_applied.remove(entity);
            if changed {
                self.persist_history(&state).await;
            }
        }
        self.request_refresh();
    }

    /// Whether a device currently sits inside an override window.
    pub async fn advance_status(&self, entity: &EntityId) -> AdvanceStatus {
        let state = self.state.lock().await;
        state.ledger.status(entity, self.clock.now())
    }

    /// Advance history for a device within the last `hours` hours.
    pub async fn advance_history(
        &self,
        entity: &EntityId,
        hours: u32,
    ) -> Vec<AdvanceHistoryEntry> {
        let since = self.clock.now() - chrono::Duration::hours(i64::from(hours));
        let state = self.state.lock().await;
        state.ledger.history(entity, since)
    }

    /// Drop all advance history for a device.
    pub async fn clear_advance_history(&self, entity: &EntityId) {
        let mut state = self.state.lock().await;
        state.ledger.clear_history(entity);
        self.persist_history(&state).await;
    }

    /// Forget every applied-node signature (override windows stay) and
    /// tick immediately: "resync everything now".
    pub async fn force_update_all(&self) {
        {
            let mut state = self.state.lock().await;
            state.last_applied.clear();
        }
        self.request_refresh();
    }

    // ── Registry operations ────────────────────────────────────────

    /// Create a user-named group.
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn create_group(&self, name: &str) -> Result<(), ThermoplanError> {
        let mut state = self.state.lock().await;
        state.registry.create_group(name)?;
        self.persist_groups(&state).await
    }

    /// Delete a group; members fall back to auto single-device groups.
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn delete_group(&self, name: &str) -> Result<(), ThermoplanError> {
        {
            let mut state = self.state.lock().await;
            let displaced = state.registry.delete_group(name)?;
            for entity in &displaced {
                state.last_applied.remove(entity);
            }
            self.persist_groups(&state).await?;
        }
        self.request_refresh();
        Ok(())
    }

    /// Rename a user group.
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn rename_group(&self, old: &str, new: &str) -> Result<(), ThermoplanError> {
        let mut state = self.state.lock().await;
        state.registry.rename_group(old, new)?;
        self.persist_groups(&state).await
    }

    /// Start tracking a device (auto-creates its single-device group).
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn track_entity(&self, entity: &EntityId) -> Result<(), ThermoplanError> {
        {
            let mut state = self.state.lock().await;
            state.registry.ensure_tracked(entity);
            self.persist_groups(&state).await?;
        }
        self.request_refresh();
        Ok(())
    }

    /// Move a device into a group.
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn add_to_group(&self, group: &str, entity: &EntityId) -> Result<(), ThermoplanError> {
        {
            let mut state = self.state.lock().await;
            state.registry.add_entity(group, entity)?;
            state.last_applied.remove(entity);
            self.persist_groups(&state).await?;
        }
        self.request_refresh();
        Ok(())
    }

    /// Remove a device from a named group (it gets its own auto group).
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn remove_from_group(
        &self,
        group: &str,
        entity: &EntityId,
    ) -> Result<(), ThermoplanError> {
        {
            let mut state = self.state.lock().await;
            state.registry.remove_entity(group, entity)?;
            state.last_applied.remove(entity);
            self.persist_groups(&state).await?;
        }
        self.request_refresh();
        Ok(())
    }

    /// Replace one bucket of a target's live schedule.
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn set_schedule(
        &self,
        target: Target,
        mode: ScheduleMode,
        bucket: Bucket,
        nodes: Vec<Node>,
    ) -> Result<(), ThermoplanError> {
        {
            let mut state = self.state.lock().await;
            let name = resolve_group_name(&state.registry, &target)?;
            state.registry.set_schedule(&name, mode, bucket, nodes)?;
            self.invalidate_members(&mut *state, &name);
            self.persist_groups(&state).await?;
        }
        self.request_refresh();
        Ok(())
    }

    /// Drop every node list from a target's live schedule.
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn clear_schedule(&self, target: Target) -> Result<(), ThermoplanError> {
        {
            let mut state = self.state.lock().await;
            let name = resolve_group_name(&state.registry, &target)?;
            state.registry.clear_schedule(&name)?;
            self.invalidate_members(&mut *state, &name);
            self.persist_groups(&state).await?;
        }
        self.request_refresh();
        Ok(())
    }

    /// Read a target's schedule configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for unknown targets.
    pub async fn get_schedule(&self, target: Target) -> Result<ScheduleView, ThermoplanError> {
        let state = self.state.lock().await;
        let name = resolve_group_name(&state.registry, &target)?;
        let group = state.registry.group(&name)?;
        Ok(ScheduleView {
            group: group.name.clone(),
            enabled: group.enabled,
            ignored: group.ignored,
            schedule_mode: group.schedule_mode,
            schedules: group.schedules.clone(),
            active_profile: group.active_profile.clone(),
            profiles: group.profiles.keys().cloned().collect(),
        })
    }

    /// Enable or disable reconciliation for a target.
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn set_enabled(&self, target: Target, enabled: bool) -> Result<(), ThermoplanError> {
        {
            let mut state = self.state.lock().await;
            let name = resolve_group_name(&state.registry, &target)?;
            state.registry.set_enabled(&name, enabled)?;
            if enabled {
                self.invalidate_members(&mut *state, &name);
            }
            self.persist_groups(&state).await?;
        }
        self.request_refresh();
        Ok(())
    }

    /// Mark a target ignored (never reconciled) or lift the mark.
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn set_ignored(&self, target: Target, ignored: bool) -> Result<(), ThermoplanError> {
        let mut state = self.state.lock().await;
        let name = resolve_group_name(&state.registry, &target)?;
        state.registry.set_ignored(&name, ignored)?;
        self.persist_groups(&state).await
    }

    /// Snapshot every group.
    pub async fn groups(&self) -> Vec<Group> {
        let state = self.state.lock().await;
        state.registry.snapshot()
    }

    /// Display names of user groups (auto single-device groups excluded).
    pub async fn group_names(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.registry.names(false)
    }

    // ── Profile operations ─────────────────────────────────────────

    /// Create a profile on a target (a copy of its live schedule).
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn create_profile(&self, target: Target, profile: &str) -> Result<(), ThermoplanError> {
        let mut state = self.state.lock().await;
        let name = resolve_group_name(&state.registry, &target)?;
        state.registry.create_profile(&name, profile)?;
        self.persist_groups(&state).await
    }

    /// Delete a profile from a target.
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn delete_profile(&self, target: Target, profile: &str) -> Result<(), ThermoplanError> {
        let mut state = self.state.lock().await;
        let name = resolve_group_name(&state.registry, &target)?;
        state.registry.delete_profile(&name, profile)?;
        self.persist_groups(&state).await
    }

    /// Rename a profile on a target.
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn rename_profile(
        &self,
        target: Target,
        old: &str,
        new: &str,
    ) -> Result<(), ThermoplanError> {
        let mut state = self.state.lock().await;
        let name = resolve_group_name(&state.registry, &target)?;
        state.registry.rename_profile(&name, old, new)?;
        self.persist_groups(&state).await
    }

    /// Switch a target's active profile and resync its members.
    ///
    /// # Errors
    ///
    /// Propagates registry and storage errors.
    pub async fn set_active_profile(
        &self,
        target: Target,
        profile: &str,
    ) -> Result<(), ThermoplanError> {
        {
            let mut state = self.state.lock().await;
            let name = resolve_group_name(&state.registry, &target)?;
            state.registry.activate_profile(&name, profile)?;
            self.invalidate_members(&mut *state, &name);
            self.persist_groups(&state).await?;
        }
        self.request_refresh();
        Ok(())
    }

    // ── Settings / preview / reset ─────────────────────────────────

    /// Read the global settings.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub async fn settings(&self) -> Result<Settings, ThermoplanError> {
        Ok(self.store.load_settings().await?)
    }

    /// Persist new global settings and resync (clamping may change).
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::Validation`] for an inverted range and
    /// propagates storage errors.
    pub async fn save_settings(&self, settings: Settings) -> Result<(), ThermoplanError> {
        settings.validate()?;
        self.store.save_settings(settings).await?;
        self.force_update_all().await;
        Ok(())
    }

    /// Upcoming-schedule preview for a group's live schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::NotFound`] for unknown targets.
    pub async fn preview(&self, target: Target) -> Result<SchedulePreview, ThermoplanError> {
        let state = self.state.lock().await;
        let name = resolve_group_name(&state.registry, &target)?;
        let group = state.registry.group(&name)?;
        Ok(preview::preview(
            &group.schedules,
            group.schedule_mode,
            self.clock.now(),
        ))
    }

    /// Wipe all groups, history, caches, and settings.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoplanError::InvalidOperation`] without `confirm` and
    /// propagates storage errors.
    pub async fn factory_reset(&self, confirm: bool) -> Result<(), ThermoplanError> {
        if !confirm {
            return Err(InvalidOperationError::NotConfirmed.into());
        }
        let mut state = self.state.lock().await;
        state.registry = GroupRegistry::new();
        state.ledger.clear();
        state.last_applied.clear();
        self.store.save_groups(Vec::new()).await?;
        self.store
            .save_advance_history(state.ledger.snapshot())
            .await?;
        self.store.save_settings(Settings::default()).await?;
        Ok(())
    }

    // ── Internals ──────────────────────────────────────────────────

    async fn load_settings_or_default(&self) -> Settings {
        match self.store.load_settings().await {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(error = %err, "settings unavailable, using defaults");
                Settings::default()
            }
        }
    }

    fn invalidate_members(&self, state: &mut CoordinatorState, group_name: &str) {
        let members: Vec<EntityId> = state
            .registry
            .group(group_name)
            .map(|g| g.entities.clone())
            .unwrap_or_default();
        for entity in members {
            state.last_applied.remove(&entity);
        }
    }

    async fn persist_groups(&self, state: &CoordinatorState) -> Result<(), ThermoplanError> {
        self.store.save_groups(state.registry.snapshot()).await?;
        Ok(())
    }

    async fn persist_history(&self, state: &CoordinatorState) {
        if let Err(err) = self.store.save_advance_history(state.ledger.snapshot()).await {
            tracing::warn!(error = %err, "failed to persist advance history");
        }
    }
}

fn resolve_group_name(
    registry: &GroupRegistry,
    target: &Target,
) -> Result<String, ThermoplanError> {
    match target {
        Target::Group(name) => Ok(name.clone()),
        Target::Entity(entity) => registry
            .group_of(entity)
            .map(|g| g.name.clone())
            .ok_or_else(|| {
                NotFoundError {
                    kind: "entity",
                    name: entity.to_string(),
                }
                .into()
            }),
    }
}
