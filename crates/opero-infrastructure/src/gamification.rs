//! Daily tasks and experience points.

use chrono::{NaiveDate, Utc};
use opero_core::backend::Backend;
use opero_core::error::{ErrorKind, ServiceError, ServiceResult, codes};
use opero_core::gamification::{
    DAILY_TASK_TEMPLATES, DailyTask, TaskProgressOutcome, TaskType, UserStats, calculate_level,
};
use uuid::Uuid;

const MAX_PROGRESS_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct GamificationService {
    backend: Backend,
}

impl GamificationService {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Tasks of `user_id` for `date`. Never creates them.
    pub async fn get_daily_tasks(&self, user_id: &str, date: NaiveDate) -> ServiceResult<Vec<DailyTask>> {
        Ok(self.backend.daily_tasks.list_for_day(user_id, date).await?)
    }

    /// Creates the default task set for the day if it is missing.
    ///
    /// Running it twice, or concurrently with another initializer, leaves
    /// exactly one set.
    pub async fn initialize_daily_tasks(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> ServiceResult<Vec<DailyTask>> {
        let existing = self.backend.daily_tasks.list_for_day(user_id, date).await?;
        let missing: Vec<DailyTask> = DAILY_TASK_TEMPLATES
            .iter()
            .filter(|template| !existing.iter().any(|t| t.task_type == template.task_type))
            .map(|template| DailyTask::from_template(Uuid::new_v4().to_string(), user_id, date, template))
            .collect();
        if missing.is_empty() {
            return Ok(existing);
        }

        match self.backend.daily_tasks.insert_many(missing).await {
            Ok(created) => {
                tracing::info!(user_id, %date, created = created.len(), "Initialized daily tasks");
            }
            Err(err) if err.code.as_deref() == Some(codes::UNIQUE_VIOLATION) => {
                tracing::debug!(user_id, %date, "Daily tasks initialized concurrently");
            }
            Err(err) => return Err(err.into()),
        }
        Ok(self.backend.daily_tasks.list_for_day(user_id, date).await?)
    }

    /// Advances one task by a step. XP is awarded once, on the completing step.
    ///
    /// The step is written only if no other writer advanced the task since it
    /// was read; a lost race re-reads and tries again.
    pub async fn increment_task_progress(
        &self,
        user_id: &str,
        task_type: TaskType,
        date: NaiveDate,
    ) -> ServiceResult<TaskProgressOutcome> {
        let mut attempts = 0;
        let (task, completed_now, before) = loop {
            let mut task = self.find_task(user_id, task_type, date).await?;
            let before = self.backend.profiles.get(user_id).await?.xp;
            if task.completed {
                return Ok(TaskProgressOutcome {
                    task,
                    completed_now: false,
                    xp_awarded: 0,
                    total_xp: before,
                    level_up: None,
                });
            }

            let expected = task.progress;
            let completed_now = task.record_progress(Utc::now());
            let written = self.backend.daily_tasks.update_if_progress(task, expected).await?;
            if let Some(task) = written {
                break (task, completed_now, before);
            }
            attempts += 1;
            if attempts >= MAX_PROGRESS_ATTEMPTS {
                return Err(ServiceError::new(
                    ErrorKind::Unclassified,
                    "Görev ilerlemesi kaydedilemedi, lütfen tekrar deneyin.",
                ));
            }
            tracing::debug!(user_id, %task_type, attempts, "Task advanced concurrently, retrying");
        };

        let (xp_awarded, total_xp) = if completed_now {
            let total = self.backend.profiles.add_xp(user_id, task.xp_reward).await?;
            (task.xp_reward, total)
        } else {
            (0, before)
        };

        let level_before = calculate_level(total_xp.saturating_sub(xp_awarded));
        let level_after = calculate_level(total_xp);
        let level_up = (level_after.level > level_before.level).then_some(level_after);
        if let Some(level) = &level_up {
            tracing::info!(user_id, level = level.level, title = %level.title, "Level up");
        }

        tracing::debug!(user_id, %task_type, progress = task.progress, target = task.target, "Recorded task progress");
        Ok(TaskProgressOutcome {
            task,
            completed_now,
            xp_awarded,
            total_xp,
            level_up,
        })
    }

    async fn find_task(
        &self,
        user_id: &str,
        task_type: TaskType,
        date: NaiveDate,
    ) -> ServiceResult<DailyTask> {
        self.backend
            .daily_tasks
            .list_for_day(user_id, date)
            .await?
            .into_iter()
            .find(|t| t.task_type == task_type)
            .ok_or_else(|| ServiceError::validation("Bu görev bugün için tanımlı değil."))
    }

    pub async fn get_user_stats(&self, user_id: &str, date: NaiveDate) -> ServiceResult<UserStats> {
        let profile = self.backend.profiles.get(user_id).await?;
        let tasks = self.backend.daily_tasks.list_for_day(user_id, date).await?;
        Ok(UserStats {
            user_id: profile.id,
            level: calculate_level(profile.xp),
            tasks_completed_today: tasks.iter().filter(|t| t.completed).count(),
            tasks_total_today: tasks.len(),
        })
    }
}
