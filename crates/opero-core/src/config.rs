//! Application configuration (`config.toml`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root of `config.toml`. Every section falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperoConfig {
    pub query: QuerySettings,
    pub session: SessionSettings,
    pub email: EmailSettings,
    pub storage: StorageSettings,
    pub scheduler: SchedulerSettings,
}

/// Cache behaviour of read queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub stale_time_secs: u64,
    /// Extra attempts after a failed read
    pub read_retries: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            stale_time_secs: 300,
            read_retries: 1,
        }
    }
}

impl QuerySettings {
    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// After this long a loading session shows a "still loading" notice
    pub loading_timeout_secs: u64,
    /// Base URL used to build invitation links
    pub app_url: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            loading_timeout_secs: 10,
            app_url: "https://app.opero.io".to_string(),
        }
    }
}

impl SessionSettings {
    pub fn loading_timeout(&self) -> Duration {
        Duration::from_secs(self.loading_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub from_address: String,
    pub simulated_delay_ms: u64,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            from_address: "no-reply@opero.io".to_string(),
            simulated_delay_ms: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub max_logo_bytes: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            max_logo_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub interval_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
        }
    }
}

impl SchedulerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: OperoConfig = toml::from_str(
            r#"
            [query]
            stale_time_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.query.stale_time(), Duration::from_secs(60));
        assert_eq!(config.query.read_retries, 1);
        assert_eq!(config.session.loading_timeout_secs, 10);
        assert_eq!(config.storage.max_logo_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = OperoConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: OperoConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
