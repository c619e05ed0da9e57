//! Node — one schedule entry: a time of day plus the setpoint and modes
//! to apply when it becomes active.

use serde::{Deserialize, Serialize};

use crate::schedule::NodeTime;
use crate::settings::Settings;

/// One schedule entry.
///
/// `temp == None` or `no_change == true` means "leave the device's
/// temperature alone this transition" — useful for preset-only devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Wall-clock activation time.
    pub time: NodeTime,
    /// Target temperature, clamped to the global range at actuation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hvac_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_mode: Option<String>,
    /// Explicit "do not touch the temperature" marker.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_change: bool,
}

impl Node {
    /// A plain temperature node.
    #[must_use]
    pub fn at(time: NodeTime, temp: f64) -> Self {
        Self {
            time,
            temp: Some(temp),
            hvac_mode: None,
            fan_mode: None,
            swing_mode: None,
            preset_mode: None,
            no_change: false,
        }
    }

    /// A node that only switches modes, never the temperature.
    #[must_use]
    pub fn modes_only(time: NodeTime) -> Self {
        Self {
            time,
            temp: None,
            hvac_mode: None,
            fan_mode: None,
            swing_mode: None,
            preset_mode: None,
            no_change: true,
        }
    }

    #[must_use]
    pub fn with_hvac_mode(mut self, mode: impl Into<String>) -> Self {
        self.hvac_mode = Some(mode.into());
        self
    }

    #[must_use]
    pub fn with_fan_mode(mut self, mode: impl Into<String>) -> Self {
        self.fan_mode = Some(mode.into());
        self
    }

    #[must_use]
    pub fn with_swing_mode(mut self, mode: impl Into<String>) -> Self {
        self.swing_mode = Some(mode.into());
        self
    }

    #[must_use]
    pub fn with_preset_mode(mut self, mode: impl Into<String>) -> Self {
        self.preset_mode = Some(mode.into());
        self
    }

    /// Whether this node should touch the device's temperature at all.
    #[must_use]
    pub fn sets_temperature(&self) -> bool {
        self.temp.is_some() && !self.no_change
    }

    /// The temperature to actually apply, clamped to the global range.
    #[must_use]
    pub fn clamped_temp(&self, settings: &Settings) -> Option<f64> {
        if self.no_change {
            return None;
        }
        self.temp.map(|t| settings.clamp(t))
    }

    /// Build the change-detection signature for this node.
    ///
    /// The temperature is clamped *before* it enters the signature;
    /// comparing raw values against applied (clamped) ones would re-fire
    /// the same transition every tick.
    #[must_use]
    pub fn signature(&self, settings: &Settings) -> NodeSignature {
        NodeSignature {
            temp: self.clamped_temp(settings),
            hvac_mode: self.hvac_mode.clone(),
            fan_mode: self.fan_mode.clone(),
            swing_mode: self.swing_mode.clone(),
            preset_mode: self.preset_mode.clone(),
        }
    }
}

/// The clamped-temp + mode tuple used to detect whether the active node
/// has functionally changed since it was last applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSignature {
    pub temp: Option<f64>,
    pub hvac_mode: Option<String>,
    pub fan_mode: Option<String>,
    pub swing_mode: Option<String>,
    pub preset_mode: Option<String>,
}
