//! Profile repository trait.

use async_trait::async_trait;

use super::model::{Profile, Role};
use crate::error::BackendResult;

/// Access to the `profiles` table.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Returns the profile, or a `PGRST116` error when no row matches.
    async fn get(&self, user_id: &str) -> BackendResult<Profile>;

    async fn insert(&self, profile: Profile) -> BackendResult<Profile>;

    /// Replaces the stored row with `profile`.
    async fn update(&self, profile: Profile) -> BackendResult<Profile>;

    /// Lists the profiles linked to a workspace.
    async fn list_by_workspace(&self, workspace_id: &str) -> BackendResult<Vec<Profile>>;

    /// Lists every profile. Used by scheduled jobs only.
    async fn list_all(&self) -> BackendResult<Vec<Profile>>;

    /// Adds `amount` experience points and returns the new total.
    async fn add_xp(&self, user_id: &str, amount: u32) -> BackendResult<u32>;

    async fn set_membership(
        &self,
        user_id: &str,
        workspace_id: Option<String>,
        role: Role,
    ) -> BackendResult<Profile>;
}
