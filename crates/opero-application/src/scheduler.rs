//! Background job creating each user's daily task set.
//!
//! Needs a backend allowed to list every profile (the service role).

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use opero_core::backend::Backend;
use opero_core::error::ServiceResult;
use opero_infrastructure::GamificationService;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Outcome of one scheduler pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerReport {
    pub date: Option<NaiveDate>,
    pub users: usize,
    /// Users whose task set was created or completed by this pass
    pub initialized: usize,
    pub failed: usize,
}

pub struct DailyTaskScheduler {
    backend: Backend,
    gamification: GamificationService,
    interval: Duration,
    running: Mutex<Option<(watch::Sender<bool>, JoinHandle<()>)>>,
}

impl DailyTaskScheduler {
    pub fn new(backend: Backend, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            gamification: GamificationService::new(backend.clone()),
            backend,
            interval,
            running: Mutex::new(None),
        })
    }

    /// Initializes `date` for every profile. One user's failure does not stop the pass.
    pub async fn run_once(&self, date: NaiveDate) -> ServiceResult<SchedulerReport> {
        let profiles = self.backend.profiles.list_all().await?;
        let mut report = SchedulerReport {
            date: Some(date),
            users: profiles.len(),
            ..Default::default()
        };

        for profile in &profiles {
            let before = match self.gamification.get_daily_tasks(&profile.id, date).await {
                Ok(tasks) => tasks.len(),
                Err(err) => {
                    tracing::warn!(target: "daily_tasks", user_id = %profile.id, "Failed to read tasks: {}", err);
                    report.failed += 1;
                    continue;
                }
            };
            match self.gamification.initialize_daily_tasks(&profile.id, date).await {
                Ok(tasks) if tasks.len() > before => report.initialized += 1,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(target: "daily_tasks", user_id = %profile.id, "Failed to initialize tasks: {}", err);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            target: "daily_tasks",
            %date,
            users = report.users,
            initialized = report.initialized,
            failed = report.failed,
            "Daily task pass finished"
        );
        Ok(report)
    }

    /// Runs a pass for the current UTC day on every tick until [`Self::stop`].
    /// The first tick fires immediately. Calling `start` twice is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            tracing::warn!(target: "daily_tasks", "Scheduler already running, skipping");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(scheduler.interval);
            tracing::info!(target: "daily_tasks", "Scheduler started ({:?} interval)", scheduler.interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = scheduler.run_once(Utc::now().date_naive()).await {
                            tracing::error!(target: "daily_tasks", "Daily task pass failed: {}", err);
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            tracing::info!(target: "daily_tasks", "Scheduler stopped");
        });
        *running = Some((shutdown_tx, handle));
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }

    /// Signals the loop to stop and waits for the in-flight pass to finish.
    pub async fn stop(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((shutdown, handle)) = running {
            let _ = shutdown.send(true);
            if let Err(err) = handle.await {
                tracing::warn!(target: "daily_tasks", "Scheduler task ended abnormally: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opero_core::auth::AuthBackend;
    use opero_core::error::{BackendError, ErrorKind};
    use opero_core::profile::{NewProfile, Profile, ProfileRepository, Role};
    use opero_infrastructure::LocalBackend;

    async fn register(local: &LocalBackend, email: &str) -> String {
        let user = local.sign_up(email, "secret1").await.unwrap();
        ProfileRepository::insert(
            local,
            Profile::new(NewProfile {
                id: user.id.clone(),
                email: email.to_string(),
                full_name: email.to_string(),
                role: Role::Agent,
                workspace_id: None,
            }),
        )
        .await
        .unwrap();
        user.id
    }

    async fn service_backend(emails: &[&str]) -> (Arc<LocalBackend>, Vec<String>) {
        let local = Arc::new(LocalBackend::in_memory().with_service_role());
        let mut ids = Vec::new();
        for email in emails {
            ids.push(register(&local, email).await);
        }
        (local, ids)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[tokio::test]
    async fn test_run_once_is_idempotent() {
        let (local, ids) = service_backend(&["ali@ofis.com", "veli@ofis.com"]).await;
        let scheduler = DailyTaskScheduler::new(Backend::from_shared(local.clone()), Duration::from_secs(60));

        let first = scheduler.run_once(date()).await.unwrap();
        assert_eq!(first.users, 2);
        assert_eq!(first.initialized, 2);

        let second = scheduler.run_once(date()).await.unwrap();
        assert_eq!(second.initialized, 0);
        assert_eq!(second.failed, 0);

        let tasks = GamificationService::new(Backend::from_shared(local))
            .get_daily_tasks(&ids[0], date())
            .await
            .unwrap();
        assert_eq!(tasks.len(), 5);
    }

    #[tokio::test]
    async fn test_requires_service_role() {
        let local = Arc::new(LocalBackend::in_memory());
        register(&local, "ali@ofis.com").await;
        let scheduler = DailyTaskScheduler::new(Backend::from_shared(local), Duration::from_secs(60));

        let err = scheduler.run_once(date()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Permission);
    }

    #[tokio::test]
    async fn test_failed_pass_is_retried_by_the_next_one() {
        let (local, _) = service_backend(&["ali@ofis.com"]).await;
        let scheduler = DailyTaskScheduler::new(Backend::from_shared(local.clone()), Duration::from_secs(60));

        local.inject_failure(BackendError::exception("Failed to fetch"));
        let err = scheduler.run_once(date()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Connectivity);

        let report = scheduler.run_once(date()).await.unwrap();
        assert_eq!(report.initialized, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_runs_until_stopped() {
        let (local, ids) = service_backend(&["ali@ofis.com"]).await;
        let scheduler = DailyTaskScheduler::new(Backend::from_shared(local.clone()), Duration::from_secs(3600));

        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_running());

        let gamification = GamificationService::new(Backend::from_shared(local));
        let today = Utc::now().date_naive();
        for _ in 0..50 {
            if !gamification.get_daily_tasks(&ids[0], today).await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(gamification.get_daily_tasks(&ids[0], today).await.unwrap().len(), 5);

        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }
}
