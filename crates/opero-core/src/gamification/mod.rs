//! Gamification: experience levels and daily tasks.

mod level;
mod repository;
mod task;

pub use level::{LEVELS, LevelInfo, LevelRange, calculate_level};
pub use repository::DailyTaskRepository;
pub use task::{DAILY_TASK_TEMPLATES, DailyTask, DailyTaskTemplate, TaskProgressOutcome, TaskType, UserStats};
