//! UI preference model.
//!
//! Preferences persist across reloads but never influence data access.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Key under which preferences are persisted.
pub const UI_STORAGE_KEY: &str = "opero-ui-storage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPreferences {
    pub sidebar_open: bool,
    pub sidebar_collapsed: bool,
    pub theme: Theme,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            sidebar_collapsed: false,
            theme: Theme::System,
        }
    }
}

impl UiPreferences {
    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub fn toggle_sidebar_collapsed(&mut self) {
        self.sidebar_collapsed = !self.sidebar_collapsed;
    }
}
