//! Cached reads and invalidating writes, one wrapper per entity.
//!
//! Every wrapper resolves the active workspace from [`WorkspaceStore`]. In demo
//! mode reads are answered from the sample dataset and permitted writes are
//! simulated without reaching the backend.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use opero_core::demo::{self, DEMO_USER_ID, DEMO_WORKSPACE_ID, DemoAction};
use opero_core::error::{ServiceError, ServiceResult};
use opero_core::gamification::{DailyTask, TaskProgressOutcome, TaskType, UserStats, calculate_level};
use opero_core::profile::Role;
use opero_core::property::{NewProperty, PortfolioStats, Property, PropertyFilter, PropertyUpdate};
use opero_core::team::{Invitation, TeamMember};
use opero_core::workspace::{BillingMode, NewWorkspace, PlanType, Workspace, WorkspaceUpdate};
use opero_infrastructure::{GamificationService, PropertyService, TeamService, WorkspaceService};
use uuid::Uuid;

use crate::query::{EntityKind, QueryClient, QueryKey};
use crate::session::SessionStore;
use crate::workspace_context::WorkspaceStore;

const PROPERTY_KINDS: &[EntityKind] = &[EntityKind::Properties, EntityKind::PortfolioStats];
const INVITATION_KINDS: &[EntityKind] = &[EntityKind::Invitations, EntityKind::Team];
const MEMBER_KINDS: &[EntityKind] = &[EntityKind::Team];
const WORKSPACE_KINDS: &[EntityKind] = &[EntityKind::Workspace];
const PROGRESS_KINDS: &[EntityKind] = &[
    EntityKind::DailyTasks,
    EntityKind::UserStats,
    EntityKind::Profile,
];

fn demo_listings(filter: &PropertyFilter) -> Vec<Property> {
    let mut properties: Vec<Property> = demo::sample_properties()
        .into_iter()
        .filter(|p| filter.matches(p))
        .collect();
    properties.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    properties
}

#[derive(Clone)]
pub struct PropertyQueries {
    cache: Arc<QueryClient>,
    context: Arc<WorkspaceStore>,
    service: PropertyService,
}

impl PropertyQueries {
    pub fn new(cache: Arc<QueryClient>, context: Arc<WorkspaceStore>, service: PropertyService) -> Self {
        Self {
            cache,
            context,
            service,
        }
    }

    pub async fn list(&self, filter: &PropertyFilter) -> ServiceResult<Vec<Property>> {
        if self.context.is_demo() {
            return Ok(demo_listings(filter));
        }
        let workspace_id = self.context.require_workspace_id()?;
        let key = QueryKey::new(EntityKind::Properties)
            .param("workspace", &workspace_id)
            .params(filter.cache_params());
        self.cache
            .fetch(key, || self.service.list_properties(&workspace_id, filter))
            .await
    }

    pub async fn get(&self, property_id: &str) -> ServiceResult<Property> {
        if self.context.is_demo() {
            return demo::sample_properties()
                .into_iter()
                .find(|p| p.id == property_id)
                .ok_or_else(ServiceError::not_found);
        }
        let key = QueryKey::new(EntityKind::Properties).param("id", property_id);
        self.cache
            .fetch(key, || self.service.get_property(property_id))
            .await
    }

    pub async fn stats(&self) -> ServiceResult<PortfolioStats> {
        if self.context.is_demo() {
            return Ok(PortfolioStats::from_properties(&demo::sample_properties()));
        }
        let workspace_id = self.context.require_workspace_id()?;
        let key = QueryKey::new(EntityKind::PortfolioStats).param("workspace", &workspace_id);
        self.cache
            .fetch(key, || self.service.portfolio_stats(&workspace_id))
            .await
    }

    pub async fn create(&self, new: NewProperty) -> ServiceResult<Property> {
        self.context.ensure(DemoAction::CreateRecord)?;
        if self.context.is_demo() {
            new.validate()?;
            let property = NewProperty {
                workspace_id: DEMO_WORKSPACE_ID.to_string(),
                agent_id: DEMO_USER_ID.to_string(),
                ..new
            }
            .into_property(format!("demo-{}", Uuid::new_v4().simple()), Utc::now());
            tracing::debug!(property_id = %property.id, "Simulated demo listing");
            return Ok(property);
        }
        self.cache
            .mutate(PROPERTY_KINDS, self.service.create_property(new))
            .await
    }

    pub async fn update(&self, property_id: &str, update: PropertyUpdate) -> ServiceResult<Property> {
        self.context.ensure(DemoAction::EditRecord)?;
        if self.context.is_demo() {
            update.validate()?;
            let mut property = self.get(property_id).await?;
            update.apply(&mut property, Utc::now());
            return Ok(property);
        }
        self.cache
            .mutate(PROPERTY_KINDS, self.service.update_property(property_id, update))
            .await
    }

    pub async fn delete(&self, property_id: &str) -> ServiceResult<()> {
        self.context.ensure(DemoAction::DeleteRecord)?;
        self.cache
            .mutate(PROPERTY_KINDS, self.service.delete_property(property_id))
            .await
    }
}

#[derive(Clone)]
pub struct TeamQueries {
    cache: Arc<QueryClient>,
    context: Arc<WorkspaceStore>,
    service: TeamService,
}

impl TeamQueries {
    pub fn new(cache: Arc<QueryClient>, context: Arc<WorkspaceStore>, service: TeamService) -> Self {
        Self {
            cache,
            context,
            service,
        }
    }

    fn session(&self) -> &Arc<SessionStore> {
        self.context.session()
    }

    pub async fn members(&self) -> ServiceResult<Vec<TeamMember>> {
        if self.context.is_demo() {
            return Ok(vec![TeamMember {
                id: DEMO_USER_ID.to_string(),
                full_name: "Demo Kullanıcı".to_string(),
                email: "demo@opero.io".to_string(),
                role: Role::Broker,
                xp: 0,
                is_owner: true,
            }]);
        }
        let workspace_id = self.context.require_workspace_id()?;
        let key = QueryKey::new(EntityKind::Team).param("workspace", &workspace_id);
        self.cache
            .fetch(key, || self.service.list_members(&workspace_id))
            .await
    }

    pub async fn invitations(&self) -> ServiceResult<Vec<Invitation>> {
        if self.context.is_demo() {
            return Ok(Vec::new());
        }
        let workspace_id = self.context.require_workspace_id()?;
        let key = QueryKey::new(EntityKind::Invitations).param("workspace", &workspace_id);
        self.cache
            .fetch(key, || self.service.list_invitations(&workspace_id))
            .await
    }

    pub async fn invite(&self, email: &str, role: Role) -> ServiceResult<Invitation> {
        self.context.ensure(DemoAction::InviteMember)?;
        let workspace_id = self.context.require_workspace_id()?;
        let inviter = self.session().require_user()?;
        self.cache
            .mutate(
                INVITATION_KINDS,
                self.service.invite_member(&workspace_id, &inviter.id, email, role),
            )
            .await
    }

    pub async fn revoke(&self, invitation_id: &str) -> ServiceResult<Invitation> {
        self.context.ensure(DemoAction::InviteMember)?;
        self.cache
            .mutate(INVITATION_KINDS, self.service.revoke_invitation(invitation_id))
            .await
    }

    /// Joins the signed-in user to the inviting workspace and switches to it.
    pub async fn accept(&self, token: &str) -> ServiceResult<TeamMember> {
        let user = self.session().require_user()?;
        let member = self
            .cache
            .mutate(
                &[EntityKind::Invitations, EntityKind::Team, EntityKind::Profile],
                self.service.accept_invitation(token, &user.id),
            )
            .await?;
        self.session().refresh_profile().await?;
        self.context.sync().await?;
        Ok(member)
    }

    pub async fn update_role(&self, member_id: &str, role: Role) -> ServiceResult<TeamMember> {
        self.context.ensure(DemoAction::ChangeSettings)?;
        self.cache
            .mutate(MEMBER_KINDS, self.service.update_member_role(member_id, role))
            .await
    }

    pub async fn remove(&self, member_id: &str) -> ServiceResult<()> {
        self.context.ensure(DemoAction::DeleteRecord)?;
        let workspace_id = self.context.require_workspace_id()?;
        self.cache
            .mutate(MEMBER_KINDS, self.service.remove_member(&workspace_id, member_id))
            .await
    }
}

#[derive(Clone)]
pub struct WorkspaceQueries {
    cache: Arc<QueryClient>,
    context: Arc<WorkspaceStore>,
    service: WorkspaceService,
}

impl WorkspaceQueries {
    pub fn new(cache: Arc<QueryClient>, context: Arc<WorkspaceStore>, service: WorkspaceService) -> Self {
        Self {
            cache,
            context,
            service,
        }
    }

    pub async fn current(&self) -> ServiceResult<Workspace> {
        if self.context.is_demo() {
            return Ok(demo::demo_workspace());
        }
        let workspace_id = self.context.require_workspace_id()?;
        let key = QueryKey::new(EntityKind::Workspace).param("id", &workspace_id);
        self.cache
            .fetch(key, || self.service.get_workspace(&workspace_id))
            .await
    }

    /// Creates a workspace owned by the signed-in user and makes it active.
    pub async fn create(
        &self,
        name: &str,
        plan_type: PlanType,
        billing_mode: BillingMode,
    ) -> ServiceResult<Workspace> {
        let session = self.context.session();
        let owner = session.require_user()?;
        let workspace = self
            .cache
            .mutate(
                &[EntityKind::Workspace, EntityKind::Team, EntityKind::Profile],
                self.service.create_workspace(NewWorkspace {
                    name: name.to_string(),
                    owner_id: owner.id,
                    plan_type,
                    billing_mode,
                }),
            )
            .await?;
        session.refresh_profile().await?;
        self.context.sync().await?;
        Ok(workspace)
    }

    pub async fn update(&self, update: WorkspaceUpdate) -> ServiceResult<Workspace> {
        self.context.ensure(DemoAction::ChangeSettings)?;
        let workspace_id = self.context.require_workspace_id()?;
        let workspace = self
            .cache
            .mutate(WORKSPACE_KINDS, self.service.update_workspace(&workspace_id, update))
            .await?;
        self.context.sync().await?;
        Ok(workspace)
    }

    pub async fn upload_logo(&self, file_name: &str, bytes: Vec<u8>) -> ServiceResult<Workspace> {
        self.context.ensure(DemoAction::UploadFile)?;
        let workspace_id = self.context.require_workspace_id()?;
        let workspace = self
            .cache
            .mutate(
                WORKSPACE_KINDS,
                self.service.upload_logo(&workspace_id, file_name, bytes),
            )
            .await?;
        self.context.sync().await?;
        Ok(workspace)
    }

    pub async fn delete_logo(&self) -> ServiceResult<Workspace> {
        self.context.ensure(DemoAction::UploadFile)?;
        let workspace_id = self.context.require_workspace_id()?;
        let workspace = self
            .cache
            .mutate(WORKSPACE_KINDS, self.service.delete_logo(&workspace_id))
            .await?;
        self.context.sync().await?;
        Ok(workspace)
    }
}

#[derive(Clone)]
pub struct GamificationQueries {
    cache: Arc<QueryClient>,
    context: Arc<WorkspaceStore>,
    service: GamificationService,
}

impl GamificationQueries {
    pub fn new(cache: Arc<QueryClient>, context: Arc<WorkspaceStore>, service: GamificationService) -> Self {
        Self {
            cache,
            context,
            service,
        }
    }

    /// Today's tasks. Empty until the scheduler has initialized the day.
    pub async fn tasks(&self, date: NaiveDate) -> ServiceResult<Vec<DailyTask>> {
        if self.context.is_demo() {
            return Ok(Vec::new());
        }
        let user = self.context.session().require_user()?;
        let key = QueryKey::new(EntityKind::DailyTasks)
            .param("user", &user.id)
            .param("date", date);
        self.cache
            .fetch(key, || self.service.get_daily_tasks(&user.id, date))
            .await
    }

    pub async fn stats(&self, date: NaiveDate) -> ServiceResult<UserStats> {
        if self.context.is_demo() {
            return Ok(UserStats {
                user_id: DEMO_USER_ID.to_string(),
                level: calculate_level(0),
                tasks_completed_today: 0,
                tasks_total_today: 0,
            });
        }
        let user = self.context.session().require_user()?;
        let key = QueryKey::new(EntityKind::UserStats)
            .param("user", &user.id)
            .param("date", date);
        self.cache
            .fetch(key, || self.service.get_user_stats(&user.id, date))
            .await
    }

    /// Records one step of a task and refreshes the session profile's XP.
    pub async fn record_progress(
        &self,
        task_type: TaskType,
        date: NaiveDate,
    ) -> ServiceResult<TaskProgressOutcome> {
        self.context.ensure(DemoAction::EditRecord)?;
        let session = self.context.session();
        let user = session.require_user()?;
        let outcome = self
            .cache
            .mutate(
                PROGRESS_KINDS,
                self.service.increment_task_progress(&user.id, task_type, date),
            )
            .await?;
        if outcome.xp_awarded > 0 {
            if let Err(err) = session.refresh_profile().await {
                tracing::warn!(user_id = %user.id, "Failed to refresh profile after XP award: {}", err);
            }
        }
        Ok(outcome)
    }
}
