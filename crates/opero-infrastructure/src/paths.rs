//! Unified path management for OPERO's local files.
//!
//! ```text
//! ~/.config/opero/             # Config directory
//! ├── config.toml              # Application configuration
//! ├── ui.toml                  # Persisted UI preferences
//! └── logs/                    # Application logs
//!     └── opero.log.YYYY-MM-DD
//!
//! ~/.local/share/opero/        # Data directory (local backend)
//! ├── tables/                  # One TOML file per table
//! └── storage/                 # Object storage buckets
//! ```
//!
//! Setting `OPERO_HOME` (or passing a base directory) puts both trees under a
//! single root: `<home>/config` and `<home>/data`.

use std::path::{Path, PathBuf};

use opero_core::error::{OperoError, Result};

/// Environment variable overriding the default directories.
pub const HOME_ENV: &str = "OPERO_HOME";

const APP_NAME: &str = "opero";

/// Resolves every path OPERO reads or writes.
#[derive(Debug, Clone)]
pub struct OperoPaths {
    base_dir: Option<PathBuf>,
}

impl OperoPaths {
    /// Creates a resolver. `base_dir` wins over `OPERO_HOME`, which wins over
    /// the platform directories.
    pub fn new(base_dir: Option<&Path>) -> Self {
        let base_dir = base_dir
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(HOME_ENV).map(PathBuf::from));
        Self { base_dir }
    }

    pub fn config_dir(&self) -> Result<PathBuf> {
        match &self.base_dir {
            Some(base) => Ok(base.join("config")),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_NAME))
                .ok_or_else(|| OperoError::config("Cannot find config directory")),
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.base_dir {
            Some(base) => Ok(base.join("data")),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_NAME))
                .ok_or_else(|| OperoError::config("Cannot find data directory")),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn ui_preferences_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("ui.toml"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("logs"))
    }

    pub fn tables_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("tables"))
    }

    pub fn storage_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("storage"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_dir_layout() {
        let paths = OperoPaths::new(Some(Path::new("/tmp/opero-test")));
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/opero-test/config/config.toml")
        );
        assert_eq!(
            paths.ui_preferences_file().unwrap(),
            PathBuf::from("/tmp/opero-test/config/ui.toml")
        );
        assert_eq!(
            paths.tables_dir().unwrap(),
            PathBuf::from("/tmp/opero-test/data/tables")
        );
        assert!(paths.logs_dir().unwrap().starts_with(paths.config_dir().unwrap()));
        assert!(paths.storage_dir().unwrap().starts_with(paths.data_dir().unwrap()));
    }
}
