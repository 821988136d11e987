use anyhow::Result;
use opero_core::ui::Theme;
use opero_infrastructure::{OperoPaths, UiPreferenceStore};

use super::utils::print_json;

fn open(paths: &OperoPaths) -> Result<UiPreferenceStore> {
    Ok(UiPreferenceStore::open(paths.ui_preferences_file()?))
}

pub fn show(paths: &OperoPaths) -> Result<()> {
    print_json(&open(paths)?.get())
}

pub fn toggle_sidebar(paths: &OperoPaths) -> Result<()> {
    print_json(&open(paths)?.toggle_sidebar()?)
}

pub fn toggle_collapsed(paths: &OperoPaths) -> Result<()> {
    print_json(&open(paths)?.toggle_sidebar_collapsed()?)
}

pub fn set_theme(paths: &OperoPaths, theme: Theme) -> Result<()> {
    print_json(&open(paths)?.set_theme(theme)?)
}
