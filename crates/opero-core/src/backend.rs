//! Bundle of every backend collaborator.

use std::sync::Arc;

use crate::auth::AuthBackend;
use crate::gamification::DailyTaskRepository;
use crate::profile::ProfileRepository;
use crate::property::PropertyRepository;
use crate::storage::ObjectStorage;
use crate::team::InvitationRepository;
use crate::workspace::WorkspaceRepository;

/// Handles to the hosted backend, cloned into every service that needs them.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthBackend>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub workspaces: Arc<dyn WorkspaceRepository>,
    pub properties: Arc<dyn PropertyRepository>,
    pub invitations: Arc<dyn InvitationRepository>,
    pub daily_tasks: Arc<dyn DailyTaskRepository>,
    pub storage: Arc<dyn ObjectStorage>,
}

impl Backend {
    /// Builds a bundle from a single type implementing every contract.
    pub fn from_shared<B>(backend: Arc<B>) -> Self
    where
        B: AuthBackend
            + ProfileRepository
            + WorkspaceRepository
            + PropertyRepository
            + InvitationRepository
            + DailyTaskRepository
            + ObjectStorage
            + 'static,
    {
        Self {
            auth: backend.clone(),
            profiles: backend.clone(),
            workspaces: backend.clone(),
            properties: backend.clone(),
            invitations: backend.clone(),
            daily_tasks: backend.clone(),
            storage: backend,
        }
    }
}
