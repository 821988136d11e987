//! Property repository trait.

use async_trait::async_trait;

use super::model::Property;
use crate::error::BackendResult;

/// Access to the `properties` table.
///
/// `workspace_id` and `agent_id` are foreign keys; rows outside the caller's
/// workspace are rejected with `42501`.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn list_by_workspace(&self, workspace_id: &str) -> BackendResult<Vec<Property>>;

    /// Returns the listing, or a `PGRST116` error when no row matches.
    async fn get(&self, property_id: &str) -> BackendResult<Property>;

    async fn insert(&self, property: Property) -> BackendResult<Property>;

    async fn update(&self, property: Property) -> BackendResult<Property>;

    async fn delete(&self, property_id: &str) -> BackendResult<()>;
}
