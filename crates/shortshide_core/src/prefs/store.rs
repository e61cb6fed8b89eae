//! Preference store contract and implementations.
//!
//! # Responsibility
//! - Define the read side of the external preference store.
//! - Describe change notifications as plain values the engine can queue.
//!
//! # Invariants
//! - Only area `local`, key `settings` carries preferences.
//! - Stores never panic on missing or malformed data; they report errors.

use crate::prefs::model::Preferences;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Storage area holding the settings entry.
pub const LOCAL_AREA: &str = "local";
/// Storage key holding the preferences object.
pub const SETTINGS_KEY: &str = "settings";

/// Preference store access errors.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Malformed(serde_json::Error),
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "preference store io failed: {err}"),
            Self::Malformed(err) => write!(f, "preference store content is malformed: {err}"),
            Self::Unavailable(message) => write!(f, "preference store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Malformed(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value)
    }
}

/// Read side of the external preference store.
pub trait PreferenceStore {
    /// Current snapshot, or `None` when nothing was ever stored.
    fn get(&self) -> Result<Option<Preferences>, StoreError>;
}

/// One storage change notification.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub area: String,
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

impl StorageChange {
    /// Change of the settings entry in the local area.
    pub fn settings(old_value: Option<Value>, new_value: Option<Value>) -> Self {
        Self {
            area: LOCAL_AREA.to_string(),
            key: SETTINGS_KEY.to_string(),
            old_value,
            new_value,
        }
    }

    pub fn is_settings_change(&self) -> bool {
        self.area == LOCAL_AREA && self.key == SETTINGS_KEY
    }

    /// Decoded new snapshot; `None`/`null` decode to defaults.
    pub fn new_preferences(&self) -> Preferences {
        Preferences::from_external(self.new_value.as_ref())
    }
}

/// In-process store, used by hosts that keep preferences in memory and by
/// tests.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    value: Option<Preferences>,
    failure: Option<String>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: Preferences) -> Self {
        Self {
            value: Some(value),
            failure: None,
        }
    }

    /// Replaces the stored snapshot and returns the matching notification.
    pub fn set(&mut self, value: Preferences) -> StorageChange {
        let old_value = self.value.as_ref().map(Preferences::to_external);
        let new_value = Some(value.to_external());
        self.value = Some(value);
        StorageChange::settings(old_value, new_value)
    }

    /// Makes subsequent `get` calls fail with `message`.
    pub fn fail_with(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self) -> Result<Option<Preferences>, StoreError> {
        if let Some(message) = &self.failure {
            return Err(StoreError::Unavailable(message.clone()));
        }
        Ok(self.value.clone())
    }
}

/// JSON file store. Accepts either the bare preferences object or an
/// envelope `{ "settings": {...} }`; a missing file means "never stored".
#[derive(Debug, Clone)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
}

impl JsonFilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn get(&self) -> Result<Option<Preferences>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let document: Value = serde_json::from_str(&raw)?;
        let settings = match document.get(SETTINGS_KEY) {
            Some(envelope) => envelope,
            None => &document,
        };
        if settings.is_null() {
            return Ok(None);
        }
        Ok(Some(Preferences::from_external(Some(settings))))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        JsonFilePreferenceStore, MemoryPreferenceStore, PreferenceStore, StorageChange, StoreError,
    };
    use crate::prefs::model::Preferences;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn memory_store_set_reports_old_and_new_values() {
        let mut store = MemoryPreferenceStore::new();
        assert!(store.get().expect("get").is_none());

        let first = store.set(Preferences::default());
        assert!(first.is_settings_change());
        assert_eq!(first.old_value, None);

        let second = store.set(Preferences::default().with_enabled(false));
        assert_eq!(second.old_value, Some(json!({ "enabled": true, "perHost": {} })));
        assert!(!second.new_preferences().enabled);
    }

    #[test]
    fn memory_store_can_simulate_failures() {
        let mut store = MemoryPreferenceStore::with_value(Preferences::default());
        store.fail_with("quota exceeded");
        assert!(matches!(store.get(), Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn file_store_reads_bare_and_enveloped_documents() {
        let mut bare = tempfile::NamedTempFile::new().expect("temp file");
        write!(bare, r#"{{"enabled": false}}"#).expect("write");
        let prefs = JsonFilePreferenceStore::new(bare.path())
            .get()
            .expect("read")
            .expect("value");
        assert!(!prefs.enabled);

        let mut envelope = tempfile::NamedTempFile::new().expect("temp file");
        write!(envelope, r#"{{"settings": {{"perHost": {{"youtube.com": false}}}}}}"#)
            .expect("write");
        let prefs = JsonFilePreferenceStore::new(envelope.path())
            .get()
            .expect("read")
            .expect("value");
        assert!(prefs.enabled);
        assert_eq!(prefs.per_host.get("youtube.com"), Some(&false));
    }

    #[test]
    fn file_store_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = JsonFilePreferenceStore::new(dir.path().join("absent.json"));
        assert!(missing.get().expect("missing is not an error").is_none());

        let mut broken = tempfile::NamedTempFile::new().expect("temp file");
        write!(broken, "{{ not json").expect("write");
        let err = JsonFilePreferenceStore::new(broken.path())
            .get()
            .expect_err("malformed json must fail");
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[test]
    fn foreign_changes_are_not_settings_changes() {
        let change = StorageChange {
            area: "sync".to_string(),
            key: "settings".to_string(),
            old_value: None,
            new_value: None,
        };
        assert!(!change.is_settings_change());
    }
}
