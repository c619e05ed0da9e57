//! # thermoplan-adapter-climate-virtual
//!
//! Virtual/demo actuator that provides simulated climate devices for
//! testing and demonstration purposes.
//!
//! Each registered device holds its advertised [`Capabilities`] and a
//! mutable [`DeviceState`] that the actuator calls manipulate, so tests
//! and the demo wiring can observe exactly what the coordinator did.
//!
//! ## Dependency rule
//!
//! Depends on `thermoplan-app` (port traits) and `thermoplan-domain` only.

use std::collections::BTreeMap;
use std::sync::Mutex;

use thermoplan_app::ports::{Actuator, Capabilities, ModeKind};
use thermoplan_domain::error::ActuationError;
use thermoplan_domain::id::EntityId;

/// Observable state of one simulated device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    pub powered_off: bool,
    pub target_temp: Option<f64>,
    pub hvac_mode: Option<String>,
    pub fan_mode: Option<String>,
    pub swing_mode: Option<String>,
    pub preset_mode: Option<String>,
}

struct VirtualDevice {
    capabilities: Capabilities,
    state: DeviceState,
}

/// Simulated climate device fleet implementing the [`Actuator`] port.
#[derive(Default)]
pub struct VirtualClimate {
    devices: Mutex<BTreeMap<EntityId, VirtualDevice>>,
}

impl VirtualClimate {
    /// An empty fleet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A typical heat/cool device with a temperature sensor.
    #[must_use]
    pub fn standard_capabilities() -> Capabilities {
        Capabilities {
            hvac_modes: vec!["heat".to_string(), "cool".to_string(), "off".to_string()],
            fan_modes: vec!["auto".to_string(), "low".to_string(), "high".to_string()],
            swing_modes: vec!["off".to_string(), "vertical".to_string()],
            preset_modes: vec!["eco".to_string(), "comfort".to_string()],
            has_temperature_sensor: true,
        }
    }

    /// Register a simulated device with the given capabilities.
    pub fn register(&self, entity: EntityId, capabilities: Capabilities) {
        self.devices.lock().unwrap().insert(
            entity,
            VirtualDevice {
                capabilities,
                state: DeviceState::default(),
            },
        );
    }

    /// Register a device with [`standard_capabilities`](Self::standard_capabilities).
    pub fn register_standard(&self, entity: EntityId) {
        self.register(entity, Self::standard_capabilities());
    }

    /// All registered device ids.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityId> {
        self.devices.lock().unwrap().keys().cloned().collect()
    }

    /// Snapshot one device's observable state.
    #[must_use]
    pub fn state_of(&self, entity: &EntityId) -> Option<DeviceState> {
        self.devices
            .lock()
            .unwrap()
            .get(entity)
            .map(|d| d.state.clone())
    }

    fn with_device<T>(
        &self,
        entity: &EntityId,
        apply: impl FnOnce(&mut VirtualDevice) -> Result<T, ActuationError>,
    ) -> Result<T, ActuationError> {
        let mut devices = self.devices.lock().unwrap();
        let device = devices
            .get_mut(entity)
            .ok_or_else(|| ActuationError::UnknownDevice(entity.clone()))?;
        apply(device)
    }
}

impl Actuator for VirtualClimate {
    async fn turn_off(&self, entity: &EntityId) -> Result<(), ActuationError> {
        self.with_device(entity, |device| {
            device.state.powered_off = true;
            Ok(())
        })
    }

    async fn set_temperature(&self, entity: &EntityId, value: f64) -> Result<(), ActuationError> {
        self.with_device(entity, |device| {
            if !device.capabilities.has_temperature_sensor {
                return Err(ActuationError::Unsupported);
            }
            device.state.powered_off = false;
            device.state.target_temp = Some(value);
            Ok(())
        })
    }

    async fn set_mode(
        &self,
        entity: &EntityId,
        kind: ModeKind,
        value: &str,
    ) -> Result<(), ActuationError> {
        self.with_device(entity, |device| {
            if !device.capabilities.supports(kind, value) {
                return Err(ActuationError::Unsupported);
            }
            let slot = match kind {
                ModeKind::Hvac => &mut device.state.hvac_mode,
                ModeKind::Fan => &mut device.state.fan_mode,
                ModeKind::Swing => &mut device.state.swing_mode,
                ModeKind::Preset => &mut device.state.preset_mode,
            };
            *slot = Some(value.to_string());
            Ok(())
        })
    }

    async fn capabilities(&self, entity: &EntityId) -> Result<Capabilities, ActuationError> {
        self.with_device(entity, |device| Ok(device.capabilities.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(raw: &str) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn should_track_temperature_and_modes() {
        let fleet = VirtualClimate::new();
        fleet.register_standard(entity("climate.demo"));

        fleet
            .set_temperature(&entity("climate.demo"), 21.0)
            .await
            .unwrap();
        fleet
            .set_mode(&entity("climate.demo"), ModeKind::Hvac, "heat")
            .await
            .unwrap();

        let state = fleet.state_of(&entity("climate.demo")).unwrap();
        assert_eq!(state.target_temp, Some(21.0));
        assert_eq!(state.hvac_mode.as_deref(), Some("heat"));
        assert!(!state.powered_off);
    }

    #[tokio::test]
    async fn should_power_off_and_back_on_via_temperature() {
        let fleet = VirtualClimate::new();
        fleet.register_standard(entity("climate.demo"));

        fleet.turn_off(&entity("climate.demo")).await.unwrap();
        assert!(fleet.state_of(&entity("climate.demo")).unwrap().powered_off);

        fleet
            .set_temperature(&entity("climate.demo"), 19.0)
            .await
            .unwrap();
        assert!(!fleet.state_of(&entity("climate.demo")).unwrap().powered_off);
    }

    #[tokio::test]
    async fn should_reject_unknown_device_and_unsupported_mode() {
        let fleet = VirtualClimate::new();
        fleet.register_standard(entity("climate.demo"));

        let result = fleet.turn_off(&entity("climate.ghost")).await;
        assert!(matches!(result, Err(ActuationError::UnknownDevice(_))));

        let result = fleet
            .set_mode(&entity("climate.demo"), ModeKind::Preset, "party")
            .await;
        assert!(matches!(result, Err(ActuationError::Unsupported)));
    }

    #[tokio::test]
    async fn should_reject_temperature_for_sensorless_device() {
        let fleet = VirtualClimate::new();
        fleet.register(
            entity("climate.presets_only"),
            Capabilities {
                preset_modes: vec!["eco".to_string()],
                has_temperature_sensor: false,
                ..Capabilities::default()
            },
        );

        let result = fleet
            .set_temperature(&entity("climate.presets_only"), 20.0)
            .await;
        assert!(matches!(result, Err(ActuationError::Unsupported)));
    }
}
