use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const DEFAULT_FILTER: &str =
    "opero=info,opero_infrastructure=info,opero_application=info,daily_tasks=info";

/// Installs stderr logging, plus a daily rolling file when `log_dir` is set.
///
/// The returned guard flushes the file writer on drop and must outlive `main`'s work.
pub fn init(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = || {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let stderr = fmt::layer().with_writer(std::io::stderr).with_filter(filter());

    let Some(dir) = log_dir else {
        let _ = tracing_subscriber::registry().with(stderr).try_init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let appender = tracing_appender::rolling::daily(dir, "opero.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter());

    let _ = tracing_subscriber::registry().with(stderr).with(file).try_init();
    Ok(Some(guard))
}
