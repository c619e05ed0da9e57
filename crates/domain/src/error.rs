//! Common error types used across the workspace.
//!
//! Each failure class has its own typed error; [`ThermoplanError`] is the
//! workspace-wide sum converted into via `#[from]`.

use crate::id::EntityId;
use crate::schedule::NodeTime;

/// Workspace-wide error enum.
#[derive(Debug, thiserror::Error)]
pub enum ThermoplanError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A named group, profile, or entity does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A create or rename collided with an existing name.
    #[error("already exists")]
    AlreadyExists(#[from] AlreadyExistsError),

    /// The operation is not allowed in the current state.
    #[error("invalid operation")]
    InvalidOperation(#[from] InvalidOperationError),

    /// No schedule nodes resolve for the entity right now.
    #[error("no schedule")]
    NoSchedule(#[from] NoScheduleError),

    /// A device call failed or timed out.
    #[error("actuation failure")]
    Actuation(#[from] ActuationError),

    /// The persistence layer failed.
    #[error("storage error")]
    Storage(#[from] StorageError),
}

/// Domain invariant violations.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A group or profile name was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A device reference was empty.
    #[error("entity id must not be empty")]
    EmptyEntityId,

    /// A node time string did not parse as `HH:MM` within `00:00..=23:59`.
    #[error("invalid node time '{0}'")]
    BadTime(String),

    /// A day or bucket key did not parse.
    #[error("invalid day or bucket key '{0}'")]
    BadDayKey(String),

    /// Two nodes in one list share the same time.
    #[error("duplicate node time {0}")]
    DuplicateTime(NodeTime),

    /// Settings with `min_temp >= max_temp`.
    #[error("invalid temperature range {min}..{max}")]
    BadTempRange {
        /// Configured minimum.
        min: f64,
        /// Configured maximum.
        max: f64,
    },
}

/// A named thing was not found.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} '{name}' not found")]
pub struct NotFoundError {
    /// What kind of thing was looked up ("group", "profile", "entity").
    pub kind: &'static str,
    /// The name or id that missed.
    pub name: String,
}

/// A create or rename collided with an existing name.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} '{name}' already exists")]
pub struct AlreadyExistsError {
    /// What kind of thing collided ("group", "profile").
    pub kind: &'static str,
    /// The colliding name.
    pub name: String,
}

/// Operations rejected because of the current state, not bad input.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidOperationError {
    /// Deleting the profile that is currently active.
    #[error("cannot delete active profile '{0}'; switch to another profile first")]
    DeleteActiveProfile(String),

    /// Deleting the only remaining profile.
    #[error("cannot delete the last remaining profile '{0}'")]
    DeleteLastProfile(String),

    /// Removing a device from its own auto-created single-device group.
    #[error("'{0}' cannot be removed from its own single-device group")]
    RemoveFromAutoGroup(String),

    /// Renaming an auto-created single-device group, whose display name is
    /// derived from its member device.
    #[error("'{0}' is a single-device group; its name cannot be changed")]
    RenameAutoGroup(String),

    /// A destructive operation was invoked without its confirmation flag.
    #[error("operation requires confirmation")]
    NotConfirmed,
}

/// No schedule nodes resolve for the target right now.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("no schedule resolves for '{target}': {reason}")]
pub struct NoScheduleError {
    /// The affected device or group.
    pub target: String,
    /// Why resolution came up empty (disabled, ignored, no nodes, …).
    pub reason: &'static str,
}

/// A device call failed. Failure is a value here, never a panic.
#[derive(Debug, thiserror::Error)]
pub enum ActuationError {
    /// The device layer reported an error.
    #[error("device call failed: {0}")]
    Device(String),

    /// The device layer did not answer within the bounded timeout.
    #[error("device call timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The device does not support the requested call.
    #[error("unsupported device operation")]
    Unsupported,

    /// The device is not known to the device layer.
    #[error("unknown device '{0}'")]
    UnknownDevice(EntityId),
}

/// Persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying file IO failed.
    #[error("storage io error")]
    Io(#[from] std::io::Error),

    /// The stored document did not (de)serialize.
    #[error("storage encoding error")]
    Encoding(#[from] serde_json::Error),

    /// The stored document carries a version this build does not understand.
    #[error("unsupported storage document version {0}")]
    UnsupportedVersion(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_not_found_with_kind_and_name() {
        let err = NotFoundError {
            kind: "group",
            name: "Bedrooms".to_string(),
        };
        assert_eq!(err.to_string(), "group 'Bedrooms' not found");
    }

    #[test]
    fn should_convert_sub_errors_into_workspace_error() {
        let err: ThermoplanError = ValidationError::EmptyName.into();
        assert!(matches!(err, ThermoplanError::Validation(_)));

        let err: ThermoplanError = AlreadyExistsError {
            kind: "profile",
            name: "Winter".to_string(),
        }
        .into();
        assert!(matches!(err, ThermoplanError::AlreadyExists(_)));
    }
}
