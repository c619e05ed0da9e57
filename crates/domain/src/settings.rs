//! Global scheduler settings.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Temperature bounds applied to every setpoint before actuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub min_temp: f64,
    pub max_temp: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_temp: 5.0,
            max_temp: 30.0,
        }
    }
}

impl Settings {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BadTempRange`] when `min_temp >= max_temp`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_temp >= self.max_temp {
            return Err(ValidationError::BadTempRange {
                min: self.min_temp,
                max: self.max_temp,
            });
        }
        Ok(())
    }

    /// Clamp a setpoint into the configured range.
    #[must_use]
    pub fn clamp(&self, temp: f64) -> f64 {
        temp.clamp(self.min_temp, self.max_temp)
    }
}
