//! Daily task repository trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::task::DailyTask;
use crate::error::BackendResult;

/// Access to the `daily_tasks` table.
#[async_trait]
pub trait DailyTaskRepository: Send + Sync {
    async fn list_for_day(&self, user_id: &str, date: NaiveDate) -> BackendResult<Vec<DailyTask>>;

    /// Inserts rows; a duplicate `(user_id, task_date, task_type)` yields `23505`.
    async fn insert_many(&self, tasks: Vec<DailyTask>) -> BackendResult<Vec<DailyTask>>;

    /// Writes `task` only while the stored row still has `expected_progress`
    /// and is not completed. `None` means another writer got there first.
    async fn update_if_progress(
        &self,
        task: DailyTask,
        expected_progress: u32,
    ) -> BackendResult<Option<DailyTask>>;
}
