use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::db::{open_backend, BackendType, KeyValueBackend, MemoryBackend};
use crate::error::{WarningError, WarningResult};
use crate::models::{FormFields, Template, Theme, WarningRecord};

pub const KEY_WARNINGS: &str = "warnings";
pub const KEY_TEMPLATES: &str = "templates";
pub const KEY_NEXT_WARNING_NUMBER: &str = "nextWarningNumber";
pub const KEY_FORM_DRAFT: &str = "formDraft";
pub const KEY_THEME: &str = "theme";

/// Every key the application owns
pub const ALL_KEYS: [&str; 5] = [
    KEY_WARNINGS,
    KEY_TEMPLATES,
    KEY_NEXT_WARNING_NUMBER,
    KEY_FORM_DRAFT,
    KEY_THEME,
];

/// First warning number handed out on a fresh store
pub const INITIAL_WARNING_NUMBER: u64 = 1;

/// Typed access to the persisted collections.
///
/// Reads never fail: a missing or corrupted value comes back as the default
/// and the corruption is logged. Writes replace the whole collection.
pub struct LocalStore {
    backend: Box<dyn KeyValueBackend>,
}

impl LocalStore {
    pub fn new(backend: Box<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    /// A store that lives only as long as the value
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// Opens the backend at `path`, inferring its type when not given
    pub fn open(path: &Path, backend_type: Option<BackendType>) -> Result<Self> {
        let backend = open_backend(path, backend_type)
            .with_context(|| format!("Failed to open store at {:?}", path))?;
        Ok(Self::new(backend))
    }

    pub fn backend(&self) -> &dyn KeyValueBackend {
        self.backend.as_ref()
    }

    /// Reads and parses the JSON value under `key`, reporting corruption
    pub fn try_load<T: DeserializeOwned>(&self, key: &str) -> WarningResult<Option<T>> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| WarningError::StorageParse {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    /// Reads the JSON value under `key`, falling back to the default when the
    /// value is missing, unreadable or corrupted
    pub fn load<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.try_load(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(WarningError::StorageParse { key, message }) => {
                log::warn!("Ignoring corrupted value under '{}': {}", key, message);
                T::default()
            }
            Err(e) => {
                log::error!("Failed to read '{}': {}", key, e);
                T::default()
            }
        }
    }

    /// Serializes `value` as JSON and replaces whatever is stored under `key`
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> WarningResult<()> {
        let json = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize '{}'", key))?;
        self.backend.set(key, &json)?;
        log::debug!("Saved '{}' ({} bytes)", key, json.len());
        Ok(())
    }

    pub fn load_warnings(&self) -> Vec<WarningRecord> {
        self.load(KEY_WARNINGS)
    }

    pub fn save_warnings(&self, warnings: &[WarningRecord]) -> WarningResult<()> {
        self.save(KEY_WARNINGS, warnings)
    }

    pub fn load_templates(&self) -> Vec<Template> {
        self.load(KEY_TEMPLATES)
    }

    pub fn save_templates(&self, templates: &[Template]) -> WarningResult<()> {
        self.save(KEY_TEMPLATES, templates)
    }

    /// The next warning number; stored as a plain decimal string
    pub fn load_counter(&self) -> u64 {
        match self.backend.get(KEY_NEXT_WARNING_NUMBER) {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring corrupted warning counter: {:?}", raw);
                INITIAL_WARNING_NUMBER
            }),
            Ok(None) => INITIAL_WARNING_NUMBER,
            Err(e) => {
                log::error!("Failed to read warning counter: {}", e);
                INITIAL_WARNING_NUMBER
            }
        }
    }

    pub fn save_counter(&self, value: u64) -> WarningResult<()> {
        self.backend
            .set(KEY_NEXT_WARNING_NUMBER, &value.to_string())?;
        Ok(())
    }

    pub fn load_draft(&self) -> Option<FormFields> {
        self.load::<Option<FormFields>>(KEY_FORM_DRAFT)
    }

    pub fn save_draft(&self, draft: &FormFields) -> WarningResult<()> {
        self.save(KEY_FORM_DRAFT, draft)
    }

    pub fn clear_draft(&self) -> WarningResult<()> {
        self.backend.remove(KEY_FORM_DRAFT)?;
        Ok(())
    }

    /// The theme is stored as the bare string `light` or `dark`
    pub fn load_theme(&self) -> Theme {
        match self.backend.get(KEY_THEME) {
            Ok(Some(raw)) => raw.trim_matches('"').parse().unwrap_or_default(),
            _ => Theme::default(),
        }
    }

    pub fn save_theme(&self, theme: Theme) -> WarningResult<()> {
        self.backend.set(KEY_THEME, theme.as_str())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::FileBackend;
    use tempfile::TempDir;

    #[test]
    fn test_empty_store_defaults() {
        let store = LocalStore::in_memory();
        assert!(store.load_warnings().is_empty());
        assert!(store.load_templates().is_empty());
        assert_eq!(store.load_counter(), INITIAL_WARNING_NUMBER);
        assert!(store.load_draft().is_none());
        assert_eq!(store.load_theme(), Theme::Light);
    }

    #[test]
    fn test_malformed_warnings_load_as_empty() {
        let store = LocalStore::in_memory();
        store.backend().set(KEY_WARNINGS, "{not json").unwrap();

        assert!(store.load_warnings().is_empty());
        assert!(matches!(
            store.try_load::<Vec<WarningRecord>>(KEY_WARNINGS),
            Err(WarningError::StorageParse { .. })
        ));
    }

    #[test]
    fn test_malformed_counter_falls_back() {
        let store = LocalStore::in_memory();
        store.backend().set(KEY_NEXT_WARNING_NUMBER, "abc").unwrap();
        assert_eq!(store.load_counter(), INITIAL_WARNING_NUMBER);

        store.save_counter(42).unwrap();
        assert_eq!(store.backend().get(KEY_NEXT_WARNING_NUMBER).unwrap().as_deref(), Some("42"));
        assert_eq!(store.load_counter(), 42);
    }

    #[test]
    fn test_draft_round_trip_and_clear() {
        let store = LocalStore::in_memory();
        let mut draft = FormFields::default();
        draft.employee_name = "Ali".into();

        store.save_draft(&draft).unwrap();
        assert_eq!(store.load_draft(), Some(draft));

        store.clear_draft().unwrap();
        assert!(store.load_draft().is_none());
    }

    #[test]
    fn test_theme_stored_as_plain_string() {
        let store = LocalStore::in_memory();
        store.save_theme(Theme::Dark).unwrap();
        assert_eq!(store.backend().get(KEY_THEME).unwrap().as_deref(), Some("dark"));
        assert_eq!(store.load_theme(), Theme::Dark);

        store.backend().set(KEY_THEME, "purple").unwrap();
        assert_eq!(store.load_theme(), Theme::Light);
    }

    #[test]
    fn test_warnings_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let record = WarningRecord::new(FormFields::default());

        {
            let store = LocalStore::new(Box::new(FileBackend::new(temp_dir.path())));
            store.save_warnings(std::slice::from_ref(&record)).unwrap();
        }

        let store = LocalStore::new(Box::new(FileBackend::new(temp_dir.path())));
        assert_eq!(store.load_warnings(), vec![record]);
    }
}
