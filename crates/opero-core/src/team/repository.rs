//! Invitation repository trait.

use async_trait::async_trait;

use super::model::Invitation;
use crate::error::BackendResult;

/// Access to the `invitations` table.
///
/// A workspace holds at most one pending invitation per e-mail address;
/// violating that yields `23505`.
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn list_by_workspace(&self, workspace_id: &str) -> BackendResult<Vec<Invitation>>;

    async fn get(&self, invitation_id: &str) -> BackendResult<Invitation>;

    async fn find_by_token(&self, token: &str) -> BackendResult<Option<Invitation>>;

    async fn insert(&self, invitation: Invitation) -> BackendResult<Invitation>;

    async fn update(&self, invitation: Invitation) -> BackendResult<Invitation>;
}
