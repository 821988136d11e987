//! Workspace repository trait.

use super::model::Workspace;
use crate::error::BackendResult;
use async_trait::async_trait;

/// Access to the `workspaces` table.
///
/// `slug` is unique; inserting a duplicate yields a `23505` error.
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Finds a workspace by its ID, failing with `PGRST116` when absent.
    async fn get(&self, workspace_id: &str) -> BackendResult<Workspace>;

    async fn find_by_slug(&self, slug: &str) -> BackendResult<Option<Workspace>>;

    async fn insert(&self, workspace: Workspace) -> BackendResult<Workspace>;

    async fn update(&self, workspace: Workspace) -> BackendResult<Workspace>;

    async fn delete(&self, workspace_id: &str) -> BackendResult<()>;

    /// Checks if a slug is already taken.
    async fn slug_exists(&self, slug: &str) -> BackendResult<bool> {
        Ok(self.find_by_slug(slug).await?.is_some())
    }
}
