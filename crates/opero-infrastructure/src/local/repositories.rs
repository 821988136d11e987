//! Table access with the constraints and row-level policies of the hosted schema.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use opero_core::error::{BackendError, BackendResult};
use opero_core::gamification::{DAILY_TASK_TEMPLATES, DailyTask, DailyTaskRepository, TaskType};
use opero_core::profile::{Profile, ProfileRepository, Role};
use opero_core::property::{Property, PropertyRepository};
use opero_core::storage::workspace_prefix;
use opero_core::team::{Invitation, InvitationRepository};
use opero_core::workspace::{Workspace, WorkspaceRepository};

use super::{Actor, LocalBackend, LocalState};

impl LocalBackend {
    /// Whether the actor manages `workspace_id` (owner, broker or admin member).
    pub(super) fn manages_workspace(&self, state: &LocalState, workspace_id: &str) -> bool {
        match self.actor(state) {
            Actor::Service => true,
            Actor::User(user) => {
                let owns = state
                    .workspaces
                    .get(workspace_id)
                    .is_some_and(|ws| ws.owner_id == user.id);
                let manages = state.profiles.get(&user.id).is_some_and(|profile| {
                    profile.workspace_id.as_deref() == Some(workspace_id)
                        && profile.role.can_manage_team()
                });
                owns || manages
            }
            Actor::Anonymous => false,
        }
    }

    /// Invitations are visible to the inviting workspace and to the invitee.
    fn can_access_invitation(&self, state: &LocalState, invitation: &Invitation) -> bool {
        if self.can_access_workspace(state, &invitation.workspace_id) {
            return true;
        }
        match self.actor(state) {
            Actor::User(user) => user.email.eq_ignore_ascii_case(&invitation.email),
            _ => false,
        }
    }

    fn can_read_profile(&self, state: &LocalState, profile: &Profile) -> bool {
        self.can_access_user(state, &profile.id)
            || profile
                .workspace_id
                .as_deref()
                .is_some_and(|ws| self.can_access_workspace(state, ws))
    }
}

fn template_rank(task_type: TaskType) -> usize {
    DAILY_TASK_TEMPLATES
        .iter()
        .position(|template| template.task_type == task_type)
        .unwrap_or(usize::MAX)
}

#[async_trait]
impl ProfileRepository for LocalBackend {
    async fn get(&self, user_id: &str) -> BackendResult<Profile> {
        self.begin_read().await?;
        let state = self.state.read().await;
        match state.profiles.get(user_id) {
            Some(profile) if self.can_read_profile(&state, profile) => Ok(profile.clone()),
            _ => Err(BackendError::no_rows()),
        }
    }

    async fn insert(&self, profile: Profile) -> BackendResult<Profile> {
        self.enter().await?;
        let mut state = self.state.write().await;
        self.require_user_access(&state, &profile.id, "profiles")?;
        if let Some(ws) = profile.workspace_id.as_deref() {
            if !state.workspaces.contains(ws) {
                return Err(BackendError::foreign_key_violation("profiles_workspace_id_fkey"));
            }
        }
        state.profiles.insert(profile)
    }

    async fn update(&self, profile: Profile) -> BackendResult<Profile> {
        self.enter().await?;
        let mut state = self.state.write().await;
        if !self.can_access_user(&state, &profile.id) {
            return Err(BackendError::no_rows());
        }
        state.profiles.replace(profile)
    }

    async fn list_by_workspace(&self, workspace_id: &str) -> BackendResult<Vec<Profile>> {
        self.begin_read().await?;
        let state = self.state.read().await;
        if !self.can_access_workspace(&state, workspace_id) {
            return Ok(Vec::new());
        }
        let mut members: Vec<Profile> = state
            .profiles
            .values()
            .filter(|profile| profile.workspace_id.as_deref() == Some(workspace_id))
            .cloned()
            .collect();
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(members)
    }

    async fn list_all(&self) -> BackendResult<Vec<Profile>> {
        self.begin_read().await?;
        let state = self.state.read().await;
        match self.actor(&state) {
            Actor::Service => Ok(state.profiles.values().cloned().collect()),
            _ => Err(BackendError::permission_denied("profiles")),
        }
    }

    async fn add_xp(&self, user_id: &str, amount: u32) -> BackendResult<u32> {
        self.enter().await?;
        let mut state = self.state.write().await;
        self.require_user_access(&state, user_id, "profiles")?;
        let mut profile = state
            .profiles
            .get(user_id)
            .cloned()
            .ok_or_else(BackendError::no_rows)?;
        profile.xp = profile.xp.saturating_add(amount);
        let total = profile.xp;
        state.profiles.replace(profile)?;
        Ok(total)
    }

    async fn set_membership(
        &self,
        user_id: &str,
        workspace_id: Option<String>,
        role: Role,
    ) -> BackendResult<Profile> {
        self.enter().await?;
        let mut state = self.state.write().await;
        let mut profile = state
            .profiles
            .get(user_id)
            .cloned()
            .ok_or_else(BackendError::no_rows)?;

        let allowed = self.can_access_user(&state, user_id)
            || profile
                .workspace_id
                .as_deref()
                .is_some_and(|ws| self.manages_workspace(&state, ws));
        if !allowed {
            return Err(BackendError::permission_denied("profiles"));
        }
        if let Some(ws) = workspace_id.as_deref() {
            if !state.workspaces.contains(ws) {
                return Err(BackendError::foreign_key_violation("profiles_workspace_id_fkey"));
            }
        }

        profile.workspace_id = workspace_id;
        profile.role = role;
        state.profiles.replace(profile)
    }
}

#[async_trait]
impl WorkspaceRepository for LocalBackend {
    async fn get(&self, workspace_id: &str) -> BackendResult<Workspace> {
        self.begin_read().await?;
        let state = self.state.read().await;
        match state.workspaces.get(workspace_id) {
            Some(ws) if self.can_access_workspace(&state, &ws.id) || self.manages_workspace(&state, &ws.id) => {
                Ok(ws.clone())
            }
            _ => Err(BackendError::no_rows()),
        }
    }

    async fn find_by_slug(&self, slug: &str) -> BackendResult<Option<Workspace>> {
        self.begin_read().await?;
        let state = self.state.read().await;
        self.require_authenticated(&state, "workspaces")?;
        Ok(state.workspaces.values().find(|ws| ws.slug == slug).cloned())
    }

    async fn insert(&self, workspace: Workspace) -> BackendResult<Workspace> {
        self.enter().await?;
        let mut state = self.state.write().await;
        self.require_user_access(&state, &workspace.owner_id, "workspaces")?;
        if !state.profiles.contains(&workspace.owner_id) {
            return Err(BackendError::foreign_key_violation("workspaces_owner_id_fkey"));
        }
        if state.workspaces.values().any(|ws| ws.slug == workspace.slug) {
            return Err(BackendError::unique_violation("workspaces_slug_key"));
        }
        state.workspaces.insert(workspace)
    }

    async fn update(&self, workspace: Workspace) -> BackendResult<Workspace> {
        self.enter().await?;
        let mut state = self.state.write().await;
        if !state.workspaces.contains(&workspace.id) {
            return Err(BackendError::no_rows());
        }
        if !self.manages_workspace(&state, &workspace.id) {
            return Err(BackendError::permission_denied("workspaces"));
        }
        let slug_taken = state
            .workspaces
            .values()
            .any(|ws| ws.slug == workspace.slug && ws.id != workspace.id);
        if slug_taken {
            return Err(BackendError::unique_violation("workspaces_slug_key"));
        }
        state.workspaces.replace(workspace)
    }

    async fn delete(&self, workspace_id: &str) -> BackendResult<()> {
        self.enter().await?;
        let mut state = self.state.write().await;
        let Some(owner_id) = state.workspaces.get(workspace_id).map(|ws| ws.owner_id.clone()) else {
            return Ok(());
        };
        if !self.can_access_user(&state, &owner_id) {
            return Err(BackendError::permission_denied("workspaces"));
        }

        state.workspaces.remove(workspace_id)?;
        let properties = state.properties.remove_where(|p| p.workspace_id == workspace_id)?;
        let invitations = state.invitations.remove_where(|i| i.workspace_id == workspace_id)?;
        state.profiles.update_where(|profile| {
            if profile.workspace_id.as_deref() == Some(workspace_id) {
                profile.workspace_id = None;
                true
            } else {
                false
            }
        })?;
        let prefix = workspace_prefix(workspace_id);
        state.objects.retain(|(_, key), _| !key.starts_with(&prefix));

        tracing::info!(workspace_id, properties, invitations, "Deleted workspace");
        Ok(())
    }
}

#[async_trait]
impl PropertyRepository for LocalBackend {
    async fn list_by_workspace(&self, workspace_id: &str) -> BackendResult<Vec<Property>> {
        self.begin_read().await?;
        let state = self.state.read().await;
        if !self.can_access_workspace(&state, workspace_id) {
            return Ok(Vec::new());
        }
        Ok(state
            .properties
            .values()
            .filter(|p| p.workspace_id == workspace_id)
            .cloned()
            .collect())
    }

    async fn get(&self, property_id: &str) -> BackendResult<Property> {
        self.begin_read().await?;
        let state = self.state.read().await;
        match state.properties.get(property_id) {
            Some(p) if self.can_access_workspace(&state, &p.workspace_id) => Ok(p.clone()),
            _ => Err(BackendError::no_rows()),
        }
    }

    async fn insert(&self, property: Property) -> BackendResult<Property> {
        self.enter().await?;
        let mut state = self.state.write().await;
        if !state.workspaces.contains(&property.workspace_id) {
            return Err(BackendError::foreign_key_violation("properties_workspace_id_fkey"));
        }
        self.require_workspace_access(&state, &property.workspace_id, "properties")?;
        if !state.profiles.contains(&property.agent_id) {
            return Err(BackendError::foreign_key_violation("properties_agent_id_fkey"));
        }
        state.properties.insert(property)
    }

    async fn update(&self, property: Property) -> BackendResult<Property> {
        self.enter().await?;
        let mut state = self.state.write().await;
        let visible = state
            .properties
            .get(&property.id)
            .is_some_and(|existing| self.can_access_workspace(&state, &existing.workspace_id));
        if !visible {
            return Err(BackendError::no_rows());
        }
        self.require_workspace_access(&state, &property.workspace_id, "properties")?;
        if !state.profiles.contains(&property.agent_id) {
            return Err(BackendError::foreign_key_violation("properties_agent_id_fkey"));
        }
        state.properties.replace(property)
    }

    async fn delete(&self, property_id: &str) -> BackendResult<()> {
        self.enter().await?;
        let mut state = self.state.write().await;
        let Some(workspace_id) = state.properties.get(property_id).map(|p| p.workspace_id.clone()) else {
            return Ok(());
        };
        self.require_workspace_access(&state, &workspace_id, "properties")?;
        state.properties.remove(property_id)?;
        Ok(())
    }
}

#[async_trait]
impl InvitationRepository for LocalBackend {
    async fn list_by_workspace(&self, workspace_id: &str) -> BackendResult<Vec<Invitation>> {
        self.begin_read().await?;
        let state = self.state.read().await;
        if !self.can_access_workspace(&state, workspace_id) {
            return Ok(Vec::new());
        }
        let mut invitations: Vec<Invitation> = state
            .invitations
            .values()
            .filter(|i| i.workspace_id == workspace_id)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invitations)
    }

    async fn get(&self, invitation_id: &str) -> BackendResult<Invitation> {
        self.begin_read().await?;
        let state = self.state.read().await;
        match state.invitations.get(invitation_id) {
            Some(i) if self.can_access_invitation(&state, i) => Ok(i.clone()),
            _ => Err(BackendError::no_rows()),
        }
    }

    async fn find_by_token(&self, token: &str) -> BackendResult<Option<Invitation>> {
        self.begin_read().await?;
        let state = self.state.read().await;
        Ok(state.invitations.values().find(|i| i.token == token).cloned())
    }

    async fn insert(&self, invitation: Invitation) -> BackendResult<Invitation> {
        self.enter().await?;
        let mut state = self.state.write().await;
        if !state.workspaces.contains(&invitation.workspace_id) {
            return Err(BackendError::foreign_key_violation("invitations_workspace_id_fkey"));
        }
        self.require_workspace_access(&state, &invitation.workspace_id, "invitations")?;
        let duplicate = state.invitations.values().any(|i| {
            i.is_pending() && i.workspace_id == invitation.workspace_id && i.email == invitation.email
        });
        if duplicate {
            return Err(BackendError::unique_violation("invitations_workspace_email_pending_key"));
        }
        state.invitations.insert(invitation)
    }

    async fn update(&self, invitation: Invitation) -> BackendResult<Invitation> {
        self.enter().await?;
        let mut state = self.state.write().await;
        let visible = state
            .invitations
            .get(&invitation.id)
            .is_some_and(|existing| self.can_access_invitation(&state, existing));
        if !visible {
            return Err(BackendError::no_rows());
        }
        state.invitations.replace(invitation)
    }
}

#[async_trait]
impl DailyTaskRepository for LocalBackend {
    async fn list_for_day(&self, user_id: &str, date: NaiveDate) -> BackendResult<Vec<DailyTask>> {
        self.begin_read().await?;
        let state = self.state.read().await;
        if !self.can_access_user(&state, user_id) {
            return Ok(Vec::new());
        }
        let mut tasks: Vec<DailyTask> = state
            .daily_tasks
            .values()
            .filter(|t| t.user_id == user_id && t.task_date == date)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| template_rank(t.task_type));
        Ok(tasks)
    }

    async fn insert_many(&self, tasks: Vec<DailyTask>) -> BackendResult<Vec<DailyTask>> {
        self.enter().await?;
        let mut state = self.state.write().await;

        let mut seen: HashSet<(String, NaiveDate, TaskType)> = state
            .daily_tasks
            .values()
            .map(|t| (t.user_id.clone(), t.task_date, t.task_type))
            .collect();
        for task in &tasks {
            self.require_user_access(&state, &task.user_id, "daily_tasks")?;
            if !state.profiles.contains(&task.user_id) {
                return Err(BackendError::foreign_key_violation("daily_tasks_user_id_fkey"));
            }
            if !seen.insert((task.user_id.clone(), task.task_date, task.task_type)) {
                return Err(BackendError::unique_violation("daily_tasks_user_date_type_key"));
            }
        }

        state.daily_tasks.insert_all(tasks)
    }

    async fn update_if_progress(
        &self,
        task: DailyTask,
        expected_progress: u32,
    ) -> BackendResult<Option<DailyTask>> {
        self.enter().await?;
        let mut state = self.state.write().await;
        let current = match state.daily_tasks.get(&task.id) {
            Some(existing) if self.can_access_user(&state, &existing.user_id) => existing,
            _ => return Err(BackendError::no_rows()),
        };
        if current.completed || current.progress != expected_progress {
            return Ok(None);
        }
        state.daily_tasks.replace(task).map(Some)
    }
}
