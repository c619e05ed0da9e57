//! Storage port — persistence for groups, advance history, and settings.
//!
//! The core trusts storage to hand back the current logical shapes; any
//! schema normalization happened once at load inside the adapter.

use std::future::Future;

use thermoplan_domain::advance::AdvanceLedgerSnapshot;
use thermoplan_domain::error::StorageError;
use thermoplan_domain::group::Group;
use thermoplan_domain::settings::Settings;

/// Persistence port consumed by the coordinator.
pub trait ScheduleStore {
    /// Load every group.
    fn load_groups(&self) -> impl Future<Output = Result<Vec<Group>, StorageError>> + Send;

    /// Persist the full group set.
    fn save_groups(&self, groups: Vec<Group>)
    -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Load the advance history ledger.
    fn load_advance_history(
        &self,
    ) -> impl Future<Output = Result<AdvanceLedgerSnapshot, StorageError>> + Send;

    /// Persist the advance history ledger.
    fn save_advance_history(
        &self,
        history: AdvanceLedgerSnapshot,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Load the global settings.
    fn load_settings(&self) -> impl Future<Output = Result<Settings, StorageError>> + Send;

    /// Persist the global settings.
    fn save_settings(
        &self,
        settings: Settings,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<T: ScheduleStore + Send + Sync> ScheduleStore for std::sync::Arc<T> {
    fn load_groups(&self) -> impl Future<Output = Result<Vec<Group>, StorageError>> + Send {
        (**self).load_groups()
    }

    fn save_groups(
        &self,
        groups: Vec<Group>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).save_groups(groups)
    }

    fn load_advance_history(
        &self,
    ) -> impl Future<Output = Result<AdvanceLedgerSnapshot, StorageError>> + Send {
        (**self).load_advance_history()
    }

    fn save_advance_history(
        &self,
        history: AdvanceLedgerSnapshot,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).save_advance_history(history)
    }

    fn load_settings(&self) -> impl Future<Output = Result<Settings, StorageError>> + Send {
        (**self).load_settings()
    }

    fn save_settings(
        &self,
        settings: Settings,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).save_settings(settings)
    }
}
