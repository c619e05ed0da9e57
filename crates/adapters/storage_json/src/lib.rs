//! # thermoplan-adapter-storage-json
//!
//! JSON-document persistence for the scheduler: one versioned document
//! holding groups, advance history, and settings.
//!
//! The document is normalized exactly once, at load — unknown versions are
//! rejected rather than migrated, inconsistent flags are straightened out,
//! and from then on the core only ever sees the current logical shapes.
//! Writes go through a temp file + rename so a crash mid-write never
//! leaves a torn document behind.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use thermoplan_app::ports::ScheduleStore;
use thermoplan_domain::advance::AdvanceLedgerSnapshot;
use thermoplan_domain::error::StorageError;
use thermoplan_domain::group::Group;
use thermoplan_domain::settings::Settings;

/// Current on-disk document version.
const DOCUMENT_VERSION: u32 = 1;

/// The full persisted state.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    groups: Vec<Group>,
    #[serde(default)]
    advance_history: AdvanceLedgerSnapshot,
    #[serde(default)]
    settings: Settings,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            groups: Vec::new(),
            advance_history: AdvanceLedgerSnapshot::default(),
            settings: Settings::default(),
        }
    }
}

impl StoreDocument {
    /// One-time load normalization. Never re-entered at runtime.
    fn normalize(mut self) -> Result<Self, StorageError> {
        if self.version != DOCUMENT_VERSION {
            return Err(StorageError::UnsupportedVersion(self.version));
        }
        for group in &mut self.groups {
            if group.ignored {
                group.enabled = false;
            }
        }
        if self.settings.validate().is_err() {
            tracing::warn!(
                min = self.settings.min_temp,
                max = self.settings.max_temp,
                "stored settings invalid, falling back to defaults"
            );
            self.settings = Settings::default();
        }
        Ok(self)
    }
}

/// File-backed [`ScheduleStore`] implementation.
///
/// A single internal mutex serializes read-modify-write cycles so two
/// concurrent saves cannot interleave their temp files.
pub struct JsonScheduleStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonScheduleStore {
    /// Create a store persisting to `path`. The file is created on the
    /// first write; a missing file reads as an empty document.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<StoreDocument, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoreDocument::default());
            }
            Err(err) => return Err(err.into()),
        };
        let document: StoreDocument = serde_json::from_slice(&bytes)?;
        document.normalize()
    }

    async fn write_document(&self, document: &StoreDocument) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn update<F>(&self, apply: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut StoreDocument),
    {
        let _guard = self.guard.lock().await;
        let mut document = self.read_document().await?;
        apply(&mut document);
        self.write_document(&document).await
    }
}

impl ScheduleStore for JsonScheduleStore {
    async fn load_groups(&self) -> Result<Vec<Group>, StorageError> {
        Ok(self.read_document().await?.groups)
    }

    async fn save_groups(&self, groups: Vec<Group>) -> Result<(), StorageError> {
        self.update(|doc| doc.groups = groups).await
    }

    async fn load_advance_history(&self) -> Result<AdvanceLedgerSnapshot, StorageError> {
        Ok(self.read_document().await?.advance_history)
    }

    async fn save_advance_history(
        &self,
        history: AdvanceLedgerSnapshot,
    ) -> Result<(), StorageError> {
        self.update(|doc| doc.advance_history = history).await
    }

    async fn load_settings(&self) -> Result<Settings, StorageError> {
        Ok(self.read_document().await?.settings)
    }

    async fn save_settings(&self, settings: Settings) -> Result<(), StorageError> {
        self.update(|doc| doc.settings = settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermoplan_domain::advance::AdvanceHistoryEntry;
    use thermoplan_domain::id::EntityId;
    use thermoplan_domain::node::Node;

    fn store_in(dir: &tempfile::TempDir) -> JsonScheduleStore {
        JsonScheduleStore::new(dir.path().join("thermoplan.json"))
    }

    #[tokio::test]
    async fn should_read_empty_document_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.load_groups().await.unwrap().is_empty());
        assert_eq!(store.load_settings().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn should_roundtrip_groups() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut group = Group::named("Bedrooms").unwrap();
        group.entities.push(EntityId::new("climate.a").unwrap());
        store.save_groups(vec![group.clone()]).await.unwrap();

        let loaded = store.load_groups().await.unwrap();
        assert_eq!(loaded, vec![group]);
    }

    #[tokio::test]
    async fn should_roundtrip_advance_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut history = AdvanceLedgerSnapshot::default();
        history.entities.insert(
            EntityId::new("climate.a").unwrap(),
            vec![AdvanceHistoryEntry::activated(
                "2024-01-15T18:45:00".parse().unwrap(),
                Node::at("21:00".parse().unwrap(), 17.0),
            )],
        );
        store.save_advance_history(history.clone()).await.unwrap();

        let loaded = store.load_advance_history().await.unwrap();
        assert_eq!(loaded, history);
    }

    #[tokio::test]
    async fn should_keep_sections_independent_across_saves() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let group = Group::named("Bedrooms").unwrap();
        store.save_groups(vec![group.clone()]).await.unwrap();
        store
            .save_settings(Settings {
                min_temp: 8.0,
                max_temp: 26.0,
            })
            .await
            .unwrap();

        // Saving settings must not clobber the groups section.
        assert_eq!(store.load_groups().await.unwrap(), vec![group]);
        assert_eq!(store.load_settings().await.unwrap().min_temp, 8.0);
    }

    #[tokio::test]
    async fn should_reject_unknown_document_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thermoplan.json");
        std::fs::write(&path, r#"{"version": 99, "groups": []}"#).unwrap();

        let store = JsonScheduleStore::new(path);
        let result = store.load_groups().await;
        assert!(matches!(result, Err(StorageError::UnsupportedVersion(99))));
    }

    #[tokio::test]
    async fn should_normalize_ignored_groups_to_disabled_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut group = Group::named("Bedrooms").unwrap();
        group.ignored = true;
        group.enabled = true;
        store.save_groups(vec![group]).await.unwrap();

        let loaded = store.load_groups().await.unwrap();
        assert!(loaded[0].ignored);
        assert!(!loaded[0].enabled);
    }

    #[tokio::test]
    async fn should_replace_invalid_stored_settings_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thermoplan.json");
        std::fs::write(
            &path,
            r#"{"version": 1, "groups": [], "settings": {"min_temp": 30.0, "max_temp": 5.0}}"#,
        )
        .unwrap();

        let store = JsonScheduleStore::new(path);
        assert_eq!(store.load_settings().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn should_report_malformed_document_as_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thermoplan.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonScheduleStore::new(path);
        assert!(matches!(
            store.load_groups().await,
            Err(StorageError::Encoding(_))
        ));
    }
}
