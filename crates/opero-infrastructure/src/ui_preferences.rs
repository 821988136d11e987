//! Persisted UI preferences (sidebar state and theme).
//!
//! Stored as a single namespaced table in `ui.toml`:
//!
//! ```toml
//! [opero-ui-storage]
//! sidebar_open = true
//! sidebar_collapsed = false
//! theme = "dark"
//! ```
//!
//! A missing or unreadable file yields defaults; preferences never block the
//! application from starting.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use opero_core::error::Result;
use opero_core::ui::{Theme, UiPreferences};
use serde::{Deserialize, Serialize};

use crate::storage::AtomicTomlFile;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UiStorageFile {
    #[serde(rename = "opero-ui-storage", default)]
    state: UiPreferences,
}

pub struct UiPreferenceStore {
    file: AtomicTomlFile<UiStorageFile>,
    current: Mutex<UiPreferences>,
}

impl UiPreferenceStore {
    /// Opens the store, reading the file once.
    pub fn open(path: PathBuf) -> Self {
        let file = AtomicTomlFile::<UiStorageFile>::new(path);
        let current = match file.load() {
            Ok(Some(stored)) => stored.state,
            Ok(None) => UiPreferences::default(),
            Err(e) => {
                tracing::warn!(path = %file.path().display(), "Ignoring unreadable UI preferences: {}", e);
                UiPreferences::default()
            }
        };

        Self {
            file,
            current: Mutex::new(current),
        }
    }

    pub fn get(&self) -> UiPreferences {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_sidebar_open(&self, open: bool) -> Result<UiPreferences> {
        self.modify(|prefs| prefs.sidebar_open = open)
    }

    pub fn toggle_sidebar(&self) -> Result<UiPreferences> {
        self.modify(UiPreferences::toggle_sidebar)
    }

    pub fn toggle_sidebar_collapsed(&self) -> Result<UiPreferences> {
        self.modify(UiPreferences::toggle_sidebar_collapsed)
    }

    pub fn set_theme(&self, theme: Theme) -> Result<UiPreferences> {
        self.modify(|prefs| prefs.theme = theme)
    }

    fn modify<F>(&self, f: F) -> Result<UiPreferences>
    where
        F: FnOnce(&mut UiPreferences),
    {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = *current;
        f(&mut next);
        self.file.save(&UiStorageFile { state: next })?;
        *current = next;
        tracing::debug!(?next, "Saved UI preferences");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opero_core::ui::UI_STORAGE_KEY;
    use tempfile::TempDir;

    #[test]
    fn test_preferences_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ui.toml");

        let store = UiPreferenceStore::open(path.clone());
        assert_eq!(store.get(), UiPreferences::default());
        store.toggle_sidebar().unwrap();
        store.toggle_sidebar_collapsed().unwrap();
        store.set_theme(Theme::Dark).unwrap();

        let reopened = UiPreferenceStore::open(path);
        let prefs = reopened.get();
        assert!(!prefs.sidebar_open);
        assert!(prefs.sidebar_collapsed);
        assert_eq!(prefs.theme, Theme::Dark);
    }

    #[test]
    fn test_file_uses_namespaced_key() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ui.toml");

        UiPreferenceStore::open(path.clone())
            .set_sidebar_open(false)
            .unwrap();

        let raw: toml::Table = toml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        let section = raw.get(UI_STORAGE_KEY).and_then(|v| v.as_table()).unwrap();
        assert_eq!(section.get("sidebar_open").and_then(|v| v.as_bool()), Some(false));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ui.toml");
        std::fs::write(&path, "[opero-ui-storage\nsidebar_open = ").unwrap();

        let store = UiPreferenceStore::open(path);
        assert_eq!(store.get(), UiPreferences::default());
        assert!(store.set_theme(Theme::Light).is_ok());
    }
}
