//! Client composition root.
//!
//! `OperoClient` wires the session, workspace context, query cache and the
//! per-entity query wrappers over one [`Backend`].

use std::sync::Arc;

use opero_core::backend::Backend;
use opero_core::config::OperoConfig;
use opero_core::email::EmailSender;
use opero_core::error::ServiceResult;
use opero_infrastructure::{
    GamificationService, PropertyService, SimulatedEmailSender, TeamService, WorkspaceService,
};

use crate::queries::{GamificationQueries, PropertyQueries, TeamQueries, WorkspaceQueries};
use crate::query::QueryClient;
use crate::routing::{RouteDecision, resolve_route};
use crate::session::{SessionState, SessionStore};
use crate::workspace_context::WorkspaceStore;

/// Everything a signed-in (or demo) client needs.
///
/// # Responsibilities
///
/// - Owning the shared [`QueryClient`] so every wrapper invalidates the same cache
/// - Following auth events once [`OperoClient::start`] has run
/// - Dropping cached data when the user signs out
///
/// All members are `Arc`-shared or cheap clones.
pub struct OperoClient {
    pub session: Arc<SessionStore>,
    pub workspace: Arc<WorkspaceStore>,
    pub cache: Arc<QueryClient>,
    pub properties: PropertyQueries,
    pub team: TeamQueries,
    pub workspaces: WorkspaceQueries,
    pub gamification: GamificationQueries,
}

impl OperoClient {
    /// Builds a client that delivers mail through [`SimulatedEmailSender`].
    pub fn new(backend: Backend, config: &OperoConfig) -> Self {
        let email: Arc<dyn EmailSender> = Arc::new(SimulatedEmailSender::new(&config.email));
        Self::with_email(backend, config, email)
    }

    /// # Arguments
    ///
    /// * `backend` - Data backend shared by every service
    /// * `config` - Cache, session and storage settings
    /// * `email` - Transport for invitation and welcome mail
    pub fn with_email(backend: Backend, config: &OperoConfig, email: Arc<dyn EmailSender>) -> Self {
        let session = SessionStore::new(
            backend.clone(),
            email.clone(),
            config.session.loading_timeout(),
        );
        let workspace_service = WorkspaceService::new(backend.clone(), &config.storage);
        let workspace = WorkspaceStore::new(session.clone(), workspace_service.clone());
        let cache = Arc::new(QueryClient::new(&config.query));

        Self {
            properties: PropertyQueries::new(
                cache.clone(),
                workspace.clone(),
                PropertyService::new(backend.clone()),
            ),
            team: TeamQueries::new(
                cache.clone(),
                workspace.clone(),
                TeamService::new(backend.clone(), email, config.session.app_url.clone()),
            ),
            workspaces: WorkspaceQueries::new(cache.clone(), workspace.clone(), workspace_service),
            gamification: GamificationQueries::new(
                cache.clone(),
                workspace.clone(),
                GamificationService::new(backend),
            ),
            session,
            workspace,
            cache,
        }
    }

    /// Restores the persisted session and starts following auth events.
    pub async fn start(&self) -> ServiceResult<SessionState> {
        let state = self.session.mount().await?;
        self.workspace.sync().await?;
        self.workspace.watch();
        Ok(state)
    }

    pub fn stop(&self) {
        self.workspace.unwatch();
        self.session.unmount();
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<SessionState> {
        let state = self.session.sign_in(email, password).await?;
        self.workspace.exit_demo();
        self.workspace.sync().await?;
        Ok(state)
    }

    pub async fn sign_out(&self) -> ServiceResult<()> {
        self.session.sign_out().await?;
        self.cache.clear().await;
        self.workspace.sync().await?;
        Ok(())
    }

    pub fn route(&self, path: &str) -> RouteDecision {
        resolve_route(path, &self.session.state(), self.workspace.is_demo())
    }
}
