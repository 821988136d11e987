use anyhow::Result;
use chrono::{NaiveDate, Utc};
use opero_core::gamification::TaskType;
use opero_infrastructure::{GamificationService, OperoPaths};

use super::utils::{print_json, service_backend};

fn day(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Utc::now().date_naive())
}

pub async fn init(paths: &OperoPaths, user: &str, date: Option<NaiveDate>) -> Result<()> {
    let service = GamificationService::new(service_backend(paths)?);
    let tasks = service.initialize_daily_tasks(user, day(date)).await?;
    print_json(&tasks)
}

pub async fn progress(
    paths: &OperoPaths,
    user: &str,
    task: TaskType,
    date: Option<NaiveDate>,
) -> Result<()> {
    let service = GamificationService::new(service_backend(paths)?);
    let outcome = service.increment_task_progress(user, task, day(date)).await?;
    print_json(&outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opero_core::profile::{NewProfile, Profile, Role};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_progress_persists() {
        let dir = TempDir::new().unwrap();
        let paths = OperoPaths::new(Some(dir.path()));
        let date = NaiveDate::from_ymd_opt(2026, 10, 19);

        service_backend(&paths)
            .unwrap()
            .profiles
            .insert(Profile::new(NewProfile {
                id: "u-1".to_string(),
                email: "ali@ofis.com".to_string(),
                full_name: "Ali Demir".to_string(),
                role: Role::Agent,
                workspace_id: None,
            }))
            .await
            .unwrap();

        init(&paths, "u-1", date).await.unwrap();
        progress(&paths, "u-1", TaskType::AddProperty, date).await.unwrap();

        let backend = service_backend(&paths).unwrap();
        assert_eq!(backend.profiles.get("u-1").await.unwrap().xp, 20);
        let tasks = GamificationService::new(backend)
            .get_daily_tasks("u-1", day(date))
            .await
            .unwrap();
        assert_eq!(tasks.len(), 5);
        assert!(tasks.iter().any(|t| t.task_type == TaskType::AddProperty && t.completed));
    }
}
