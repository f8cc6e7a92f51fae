//! Dark/light theme preference.
//!
//! The browser globals (`localStorage`, `document.documentElement`) are
//! reached through two ports, [`PreferenceStore`] and [`DocumentRoot`], so the
//! same toggle logic runs against a real page or in-memory fakes.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// Root element attribute the page styles key off.
pub const THEME_ATTRIBUTE: &str = "data-theme";
/// Storage key holding `"light"` or `"dark"`.
pub const THEME_KEY: &str = "current_theme";
/// Older storage key: present means dark, absent means light.
pub const LEGACY_DARK_FLAG_KEY: &str = "dark_theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    /// Anything other than `"dark"`, including nothing, is light.
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Self::Dark,
            _ => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Value written to [`THEME_ATTRIBUTE`]. Light clears it.
    pub fn attribute_value(self) -> &'static str {
        match self {
            Self::Light => "",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }
}

/// Origin-scoped key/value storage (`localStorage`).
pub trait PreferenceStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove_item(&mut self, key: &str) -> anyhow::Result<()>;
}

/// The document root element plus the checkbox that flips the theme.
pub trait DocumentRoot {
    fn attribute(&self, name: &str) -> anyhow::Result<Option<String>>;
    fn set_attribute(&mut self, name: &str, value: &str) -> anyhow::Result<()>;
    fn set_toggle_checked(&mut self, checked: bool) -> anyhow::Result<()>;
}

/// How the preference is encoded in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageFormat {
    /// `key = "light" | "dark"`; light is written explicitly.
    Named { key: String },
    /// `key` present and non-empty means dark; light removes the key.
    Flag { key: String },
}

impl Default for StorageFormat {
    fn default() -> Self {
        Self::Named {
            key: THEME_KEY.to_string(),
        }
    }
}

impl StorageFormat {
    pub fn legacy_flag() -> Self {
        Self::Flag {
            key: LEGACY_DARK_FLAG_KEY.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Named { key } | Self::Flag { key } => key,
        }
    }

    fn decode(&self, raw: Option<&str>) -> ThemePreference {
        match self {
            Self::Named { .. } => ThemePreference::from_value(raw),
            Self::Flag { .. } if raw.is_some_and(|v| !v.is_empty()) => ThemePreference::Dark,
            Self::Flag { .. } => ThemePreference::Light,
        }
    }

    fn store<S: PreferenceStore>(&self, storage: &mut S, theme: ThemePreference) -> anyhow::Result<()> {
        match (self, theme) {
            (Self::Named { key }, theme) => storage.set_item(key, theme.as_str()),
            (Self::Flag { key }, ThemePreference::Dark) => storage.set_item(key, "true"),
            (Self::Flag { key }, ThemePreference::Light) => storage.remove_item(key),
        }
    }
}

/// Keeps the document theme attribute, the toggle control and the stored
/// preference in agreement.
pub struct ThemeService<S, D> {
    storage: S,
    document: D,
    format: StorageFormat,
}

impl<S: PreferenceStore, D: DocumentRoot> ThemeService<S, D> {
    pub fn new(storage: S, document: D) -> Self {
        Self::with_format(storage, document, StorageFormat::default())
    }

    pub fn with_format(storage: S, document: D, format: StorageFormat) -> Self {
        Self {
            storage,
            document,
            format,
        }
    }

    /// Page load: apply the stored preference to the document and control.
    pub fn initialize(&mut self) -> anyhow::Result<ThemePreference> {
        let raw = self
            .storage
            .get_item(self.format.key())
            .with_context(|| format!("read theme preference {}", self.format.key()))?;
        let theme = self.format.decode(raw.as_deref());
        self.apply(theme)?;
        tracing::debug!(theme = theme.as_str(), "theme initialized");
        Ok(theme)
    }

    /// Control flipped: invert the document's current theme, persist it, then
    /// apply it. The document attribute is the source of truth here, not
    /// storage.
    pub fn on_toggle(&mut self) -> anyhow::Result<ThemePreference> {
        let next = self.current()?.toggled();
        self.format
            .store(&mut self.storage, next)
            .with_context(|| format!("write theme preference {}", self.format.key()))?;
        self.apply(next)?;
        tracing::debug!(theme = next.as_str(), "theme toggled");
        Ok(next)
    }

    /// Theme currently shown by the document.
    pub fn current(&self) -> anyhow::Result<ThemePreference> {
        let value = self.document.attribute(THEME_ATTRIBUTE)?;
        Ok(ThemePreference::from_value(value.as_deref()))
    }

    pub fn format(&self) -> &StorageFormat {
        &self.format
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn into_parts(self) -> (S, D) {
        (self.storage, self.document)
    }

    fn apply(&mut self, theme: ThemePreference) -> anyhow::Result<()> {
        self.document
            .set_attribute(THEME_ATTRIBUTE, theme.attribute_value())?;
        self.document.set_toggle_checked(theme.is_dark())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn with_item(key: &str, value: &str) -> Self {
        let mut items = HashMap::new();
        items.insert(key.to_string(), value.to_string());
        Self { items }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }
}

impl PreferenceStore for MemoryStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> anyhow::Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryDocument {
    attributes: BTreeMap<String, String>,
    toggle_checked: bool,
}

impl MemoryDocument {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn toggle_checked(&self) -> bool {
        self.toggle_checked
    }
}

impl DocumentRoot for MemoryDocument {
    fn attribute(&self, name: &str) -> anyhow::Result<Option<String>> {
        Ok(self.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        self.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn set_toggle_checked(&mut self, checked: bool) -> anyhow::Result<()> {
        self.toggle_checked = checked;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageFile {
    #[serde(default)]
    items: BTreeMap<String, String>,
}

/// A [`PreferenceStore`] persisted as a JSON file, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    file: StorageFile,
}

impl JsonFileStore {
    /// Loads `path`, or starts empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let file = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StorageFile::default(),
            Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
        };
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
        }
        let bytes = serde_json::to_vec_pretty(&self.file).context("encode preferences")?;
        std::fs::write(&self.path, bytes).with_context(|| format!("write {}", self.path.display()))
    }
}

impl PreferenceStore for JsonFileStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.file.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.file.items.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove_item(&mut self, key: &str) -> anyhow::Result<()> {
        if self.file.items.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(stored: Option<&str>) -> ThemeService<MemoryStore, MemoryDocument> {
        let storage = match stored {
            Some(v) => MemoryStore::with_item(THEME_KEY, v),
            None => MemoryStore::default(),
        };
        ThemeService::new(storage, MemoryDocument::default())
    }

    #[test]
    fn initialize_reflects_stored_value() {
        for (stored, expected) in [
            ("light", ThemePreference::Light),
            ("dark", ThemePreference::Dark),
        ] {
            let mut svc = service(Some(stored));
            assert_eq!(svc.initialize().unwrap(), expected);
            assert_eq!(
                svc.document().get(THEME_ATTRIBUTE),
                Some(expected.attribute_value())
            );
            assert_eq!(svc.document().toggle_checked(), stored == "dark");
        }
    }

    #[test]
    fn missing_or_unknown_value_is_light() {
        for stored in [None, Some("purple"), Some("")] {
            let mut svc = service(stored);
            assert_eq!(svc.initialize().unwrap(), ThemePreference::Light);
            assert_eq!(svc.document().get(THEME_ATTRIBUTE), Some(""));
            assert!(!svc.document().toggle_checked());
        }
    }

    #[test]
    fn toggle_flips_document_and_storage_together() {
        for start in ["light", "dark"] {
            let mut svc = service(Some(start));
            let initial = svc.initialize().unwrap();
            let next = svc.on_toggle().unwrap();
            assert_eq!(next, initial.toggled());
            assert_eq!(svc.current().unwrap(), next);
            assert_eq!(svc.storage().get(THEME_KEY), Some(next.as_str()));
            assert_eq!(svc.document().toggle_checked(), next.is_dark());
        }
    }

    #[test]
    fn toggling_twice_restores_state() {
        for start in ["light", "dark"] {
            let mut svc = service(Some(start));
            svc.initialize().unwrap();
            let attr_before = svc.document().get(THEME_ATTRIBUTE).map(str::to_string);
            svc.on_toggle().unwrap();
            svc.on_toggle().unwrap();
            assert_eq!(
                svc.document().get(THEME_ATTRIBUTE).map(str::to_string),
                attr_before
            );
            assert_eq!(svc.storage().get(THEME_KEY), Some(start));
        }
    }

    #[test]
    fn toggle_follows_document_when_storage_drifts() {
        let mut svc = service(Some("dark"));
        svc.initialize().unwrap();
        let (mut storage, document) = svc.into_parts();
        // Another tab wrote light; this page still shows dark.
        storage.set_item(THEME_KEY, "light").unwrap();
        let mut svc = ThemeService::new(storage, document);
        assert_eq!(svc.on_toggle().unwrap(), ThemePreference::Light);
        assert_eq!(svc.storage().get(THEME_KEY), Some("light"));
    }

    #[test]
    fn flag_format_sets_and_removes_key() {
        let mut svc = ThemeService::with_format(
            MemoryStore::default(),
            MemoryDocument::default(),
            StorageFormat::legacy_flag(),
        );
        assert_eq!(svc.initialize().unwrap(), ThemePreference::Light);
        assert_eq!(svc.on_toggle().unwrap(), ThemePreference::Dark);
        assert_eq!(svc.storage().get(LEGACY_DARK_FLAG_KEY), Some("true"));
        assert_eq!(svc.on_toggle().unwrap(), ThemePreference::Light);
        assert_eq!(svc.storage().get(LEGACY_DARK_FLAG_KEY), None);
    }

    #[test]
    fn flag_format_reads_any_non_empty_value_as_dark() {
        let mut svc = ThemeService::with_format(
            MemoryStore::with_item(LEGACY_DARK_FLAG_KEY, "1"),
            MemoryDocument::default(),
            StorageFormat::legacy_flag(),
        );
        assert_eq!(svc.initialize().unwrap(), ThemePreference::Dark);
        assert!(svc.document().toggle_checked());
    }

    struct FailingStore;

    impl PreferenceStore for FailingStore {
        fn get_item(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("quota exceeded")
        }

        fn remove_item(&mut self, _key: &str) -> anyhow::Result<()> {
            anyhow::bail!("quota exceeded")
        }
    }

    #[test]
    fn storage_failure_propagates_and_leaves_document_untouched() {
        let mut svc = ThemeService::new(FailingStore, MemoryDocument::default());
        svc.initialize().unwrap();
        let err = svc.on_toggle().unwrap_err();
        assert!(format!("{err:#}").contains("quota exceeded"));
        assert_eq!(svc.current().unwrap(), ThemePreference::Light);
    }

    #[test]
    fn json_file_store_persists_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("origin/storage.json");

        let mut svc = ThemeService::new(JsonFileStore::open(&path).unwrap(), MemoryDocument::default());
        svc.initialize().unwrap();
        svc.on_toggle().unwrap();
        assert!(path.exists());

        let mut reloaded =
            ThemeService::new(JsonFileStore::open(&path).unwrap(), MemoryDocument::default());
        assert_eq!(reloaded.initialize().unwrap(), ThemePreference::Dark);
        assert_eq!(
            reloaded.storage().get_item(THEME_KEY).unwrap().as_deref(),
            Some("dark")
        );
    }

    #[test]
    fn json_file_store_rejects_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(err.to_string().starts_with("parse "));
    }
}
