use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use opero_application::DailyTaskScheduler;
use opero_infrastructure::OperoPaths;

use super::utils::{load_config, print_json, service_backend};

pub async fn run_once(paths: &OperoPaths, date: Option<NaiveDate>) -> Result<()> {
    let config = load_config(paths)?;
    let scheduler = DailyTaskScheduler::new(service_backend(paths)?, config.scheduler.interval());
    let report = scheduler
        .run_once(date.unwrap_or_else(|| Utc::now().date_naive()))
        .await?;
    print_json(&report)
}

pub async fn run(paths: &OperoPaths) -> Result<()> {
    let config = load_config(paths)?;
    let scheduler = DailyTaskScheduler::new(service_backend(paths)?, config.scheduler.interval());
    scheduler.start();
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    scheduler.stop().await;
    Ok(())
}
