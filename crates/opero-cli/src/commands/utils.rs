use anyhow::{Context, Result};
use opero_core::backend::Backend;
use opero_core::config::OperoConfig;
use opero_infrastructure::{ConfigService, LocalBackend, OperoPaths};
use serde::Serialize;
use std::sync::Arc;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn load_config(paths: &OperoPaths) -> Result<OperoConfig> {
    let service = ConfigService::load(paths).context("Failed to load config.toml")?;
    Ok(service.config().clone())
}

/// Opens the on-disk local backend with service-role access.
pub fn service_backend(paths: &OperoPaths) -> Result<Backend> {
    let local = LocalBackend::persistent(paths)
        .context("Failed to open local backend")?
        .with_service_role();
    Ok(Backend::from_shared(Arc::new(local)))
}
