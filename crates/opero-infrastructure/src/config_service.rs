//! Configuration service.
//!
//! Loads the root configuration from `config.toml`, creating the file with
//! defaults on first run.

use crate::paths::OperoPaths;
use crate::storage::AtomicTomlFile;
use opero_core::config::OperoConfig;
use opero_core::error::Result;

/// Holds the loaded configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    file: AtomicTomlFile<OperoConfig>,
    config: OperoConfig,
}

impl ConfigService {
    /// Loads `config.toml` from the resolved config directory.
    pub fn load(paths: &OperoPaths) -> Result<Self> {
        let file = AtomicTomlFile::new(paths.config_file()?);

        let config = match file.load()? {
            Some(config) => config,
            None => {
                let config = OperoConfig::default();
                file.save(&config)?;
                tracing::info!(path = %file.path().display(), "Created default config");
                config
            }
        };

        Ok(Self { file, config })
    }

    pub fn config(&self) -> &OperoConfig {
        &self.config
    }

    /// Applies `f` to the configuration and persists the result.
    pub fn update<F>(&mut self, f: F) -> Result<&OperoConfig>
    where
        F: FnOnce(&mut OperoConfig),
    {
        self.config = self.file.update(self.config.clone(), f)?;
        Ok(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_load_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = OperoPaths::new(Some(temp_dir.path()));

        let service = ConfigService::load(&paths).unwrap();
        assert_eq!(service.config(), &OperoConfig::default());
        assert!(paths.config_file().unwrap().exists());
    }

    #[test]
    fn test_update_is_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let paths = OperoPaths::new(Some(temp_dir.path()));

        let mut service = ConfigService::load(&paths).unwrap();
        service.update(|c| c.query.stale_time_secs = 30).unwrap();

        let reloaded = ConfigService::load(&paths).unwrap();
        assert_eq!(reloaded.config().query.stale_time_secs, 30);
    }
}
