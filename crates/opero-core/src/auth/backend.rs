use async_trait::async_trait;
use tokio::sync::broadcast;

use super::model::{AuthEvent, AuthUser};
use crate::error::BackendResult;

/// Authentication half of the hosted backend.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// The user of the persisted session, if any.
    async fn current_user(&self) -> BackendResult<Option<AuthUser>>;

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthUser>;

    /// Registers a new identity and signs it in.
    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<AuthUser>;

    async fn sign_out(&self) -> BackendResult<()>;

    /// Subscribes to auth state changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
