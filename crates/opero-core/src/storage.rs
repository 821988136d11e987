//! Object storage contract (workspace logos and other uploads).

use async_trait::async_trait;

use crate::error::BackendResult;

/// Bucket holding workspace logos.
pub const LOGO_BUCKET: &str = "workspace-logos";

/// Key of a workspace logo inside [`LOGO_BUCKET`].
pub fn logo_key(workspace_id: &str, extension: &str) -> String {
    format!("{workspace_id}/logo.{extension}")
}

/// Prefix under which every object of a workspace lives.
pub fn workspace_prefix(workspace_id: &str) -> String {
    format!("{workspace_id}/")
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` at `key`. Without `upsert`, an existing object yields `23505`.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> BackendResult<String>;

    /// Removes objects; missing keys are ignored.
    async fn remove(&self, bucket: &str, keys: &[String]) -> BackendResult<()>;

    /// Lists keys starting with `prefix`.
    async fn list(&self, bucket: &str, prefix: &str) -> BackendResult<Vec<String>>;

    fn public_url(&self, bucket: &str, key: &str) -> String;
}
