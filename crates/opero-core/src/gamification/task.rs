use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::level::LevelInfo;

/// Kinds of daily activity that earn experience.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskType {
    AddProperty,
    AddCustomer,
    ScheduleAppointment,
    UpdateDeal,
    FollowUpCall,
}

/// Blueprint for the task set created each day.
#[derive(Debug, Clone, Copy)]
pub struct DailyTaskTemplate {
    pub task_type: TaskType,
    pub title: &'static str,
    pub target: u32,
    pub xp_reward: u32,
}

pub const DAILY_TASK_TEMPLATES: &[DailyTaskTemplate] = &[
    DailyTaskTemplate {
        task_type: TaskType::AddProperty,
        title: "Yeni bir ilan ekle",
        target: 1,
        xp_reward: 20,
    },
    DailyTaskTemplate {
        task_type: TaskType::AddCustomer,
        title: "2 yeni müşteri kaydet",
        target: 2,
        xp_reward: 15,
    },
    DailyTaskTemplate {
        task_type: TaskType::ScheduleAppointment,
        title: "Bir randevu planla",
        target: 1,
        xp_reward: 15,
    },
    DailyTaskTemplate {
        task_type: TaskType::UpdateDeal,
        title: "3 satış fırsatını güncelle",
        target: 3,
        xp_reward: 10,
    },
    DailyTaskTemplate {
        task_type: TaskType::FollowUpCall,
        title: "5 takip araması yap",
        target: 5,
        xp_reward: 10,
    },
];

/// Row of the `daily_tasks` table. Unique on `(user_id, task_date, task_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTask {
    pub id: String,
    pub user_id: String,
    pub task_date: NaiveDate,
    pub task_type: TaskType,
    pub title: String,
    pub target: u32,
    pub progress: u32,
    pub xp_reward: u32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DailyTask {
    pub fn from_template(
        id: String,
        user_id: &str,
        task_date: NaiveDate,
        template: &DailyTaskTemplate,
    ) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            task_date,
            task_type: template.task_type,
            title: template.title.to_string(),
            target: template.target,
            progress: 0,
            xp_reward: template.xp_reward,
            completed: false,
            completed_at: None,
        }
    }

    /// Advances progress by one step, capped at `target`.
    ///
    /// Returns `true` only on the step that completes the task.
    pub fn record_progress(&mut self, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        self.progress = (self.progress + 1).min(self.target);
        if self.progress >= self.target {
            self.completed = true;
            self.completed_at = Some(now);
            return true;
        }
        false
    }
}

/// Result of advancing a daily task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProgressOutcome {
    pub task: DailyTask,
    pub completed_now: bool,
    pub xp_awarded: u32,
    pub total_xp: u32,
    /// Set when the award crossed a level boundary
    pub level_up: Option<LevelInfo>,
}

/// Gamification summary for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: String,
    pub level: LevelInfo,
    pub tasks_completed_today: usize,
    pub tasks_total_today: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_caps_at_target_and_completes_once() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let template = DAILY_TASK_TEMPLATES
            .iter()
            .find(|t| t.task_type == TaskType::AddCustomer)
            .unwrap();
        let mut task = DailyTask::from_template("t-1".into(), "u-1", date, template);
        let now = Utc::now();

        assert!(!task.record_progress(now));
        assert!(task.record_progress(now));
        assert!(task.completed);
        assert!(!task.record_progress(now));
        assert_eq!(task.progress, 2);
    }

    #[test]
    fn test_templates_cover_each_task_type_once() {
        use strum::IntoEnumIterator;
        for task_type in TaskType::iter() {
            let count = DAILY_TASK_TEMPLATES
                .iter()
                .filter(|t| t.task_type == task_type)
                .count();
            assert_eq!(count, 1, "{task_type}");
        }
    }
}
