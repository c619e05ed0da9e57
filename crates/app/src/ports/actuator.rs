//! Actuator port — device calls for climate hardware.
//!
//! An actuator bridges an external device layer (a virtual simulator, a
//! hub API, …) into the scheduler. Every call may fail independently;
//! failure is a value ([`ActuationError`]), never a crash, and callers
//! bound each call with a timeout.

use std::future::Future;

use thermoplan_domain::error::ActuationError;
use thermoplan_domain::id::EntityId;

/// Which auxiliary mode a [`Actuator::set_mode`] call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Hvac,
    Fan,
    Swing,
    Preset,
}

impl ModeKind {
    /// Lowercase label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hvac => "hvac",
            Self::Fan => "fan",
            Self::Swing => "swing",
            Self::Preset => "preset",
        }
    }
}

impl std::fmt::Display for ModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one device supports, as advertised by the device layer.
///
/// The coordinator skips any mode call whose value is not in the matching
/// list, and skips temperature calls entirely for devices without a
/// temperature sensor (preset-only hardware).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub hvac_modes: Vec<String>,
    pub fan_modes: Vec<String>,
    pub swing_modes: Vec<String>,
    pub preset_modes: Vec<String>,
    pub has_temperature_sensor: bool,
}

impl Capabilities {
    /// Whether `value` is an advertised option for `kind`.
    #[must_use]
    pub fn supports(&self, kind: ModeKind, value: &str) -> bool {
        let options = match kind {
            ModeKind::Hvac => &self.hvac_modes,
            ModeKind::Fan => &self.fan_modes,
            ModeKind::Swing => &self.swing_modes,
            ModeKind::Preset => &self.preset_modes,
        };
        options.iter().any(|v| v == value)
    }
}

/// Device-call port consumed by the reconciliation coordinator.
pub trait Actuator {
    /// Turn the device off entirely.
    fn turn_off(&self, entity: &EntityId) -> impl Future<Output = Result<(), ActuationError>> + Send;

    /// Set the target temperature.
    fn set_temperature(
        &self,
        entity: &EntityId,
        value: f64,
    ) -> impl Future<Output = Result<(), ActuationError>> + Send;

    /// Set one auxiliary mode.
    fn set_mode(
        &self,
        entity: &EntityId,
        kind: ModeKind,
        value: &str,
    ) -> impl Future<Output = Result<(), ActuationError>> + Send;

    /// Query what the device supports.
    fn capabilities(
        &self,
        entity: &EntityId,
    ) -> impl Future<Output = Result<Capabilities, ActuationError>> + Send;
}

impl<T: Actuator + Send + Sync> Actuator for std::sync::Arc<T> {
    fn turn_off(&self, entity: &EntityId) -> impl Future<Output = Result<(), ActuationError>> + Send {
        (**self).turn_off(entity)
    }

    fn set_temperature(
        &self,
        entity: &EntityId,
        value: f64,
    ) -> impl Future<Output = Result<(), ActuationError>> + Send {
        (**self).set_temperature(entity, value)
    }

    fn set_mode(
        &self,
        entity: &EntityId,
        kind: ModeKind,
        value: &str,
    ) -> impl Future<Output = Result<(), ActuationError>> + Send {
        (**self).set_mode(entity, kind, value)
    }

    fn capabilities(
        &self,
        entity: &EntityId,
    ) -> impl Future<Output = Result<Capabilities, ActuationError>> + Send {
        (**self).capabilities(entity)
    }
}
