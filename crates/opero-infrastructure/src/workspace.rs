//! Workspace records and their logos.

use chrono::Utc;
use opero_core::backend::Backend;
use opero_core::config::StorageSettings;
use opero_core::error::{ServiceError, ServiceResult};
use opero_core::profile::Role;
use opero_core::storage::{LOGO_BUCKET, logo_key, workspace_prefix};
use opero_core::workspace::{NewWorkspace, Workspace, WorkspaceUpdate, slugify};
use uuid::Uuid;

const MAX_SLUG_ATTEMPTS: u32 = 20;

#[derive(Clone)]
pub struct WorkspaceService {
    backend: Backend,
    max_logo_bytes: u64,
}

impl WorkspaceService {
    pub fn new(backend: Backend, storage: &StorageSettings) -> Self {
        Self {
            backend,
            max_logo_bytes: storage.max_logo_bytes,
        }
    }

    pub async fn get_workspace(&self, workspace_id: &str) -> ServiceResult<Workspace> {
        Ok(self.backend.workspaces.get(workspace_id).await?)
    }

    pub async fn get_workspace_by_slug(&self, slug: &str) -> ServiceResult<Workspace> {
        self.backend
            .workspaces
            .find_by_slug(slug)
            .await?
            .ok_or_else(ServiceError::not_found)
    }

    /// Creates a workspace and makes its owner the broker of it.
    pub async fn create_workspace(&self, new: NewWorkspace) -> ServiceResult<Workspace> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("Ofis adı zorunludur."));
        }

        let slug = self.unique_slug(name).await?;
        let workspace = Workspace {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug,
            plan_type: new.plan_type,
            billing_mode: new.billing_mode,
            owner_id: new.owner_id.clone(),
            max_members: new.plan_type.default_member_cap(),
            logo_url: None,
            created_at: Utc::now(),
        };
        let workspace = self.backend.workspaces.insert(workspace).await?;
        self.backend
            .profiles
            .set_membership(&new.owner_id, Some(workspace.id.clone()), Role::Broker)
            .await?;

        tracing::info!(workspace_id = %workspace.id, slug = %workspace.slug, plan = %workspace.plan_type, "Created workspace");
        Ok(workspace)
    }

    async fn unique_slug(&self, name: &str) -> ServiceResult<String> {
        let mut base = slugify(name);
        if base.is_empty() {
            base = "ofis".to_string();
        }
        if !self.backend.workspaces.slug_exists(&base).await? {
            return Ok(base);
        }
        for suffix in 2..=MAX_SLUG_ATTEMPTS {
            let candidate = format!("{base}-{suffix}");
            if !self.backend.workspaces.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        let short = Uuid::new_v4().simple().to_string();
        Ok(format!("{base}-{}", &short[..8]))
    }

    pub async fn update_workspace(
        &self,
        workspace_id: &str,
        update: WorkspaceUpdate,
    ) -> ServiceResult<Workspace> {
        let mut workspace = self.backend.workspaces.get(workspace_id).await?;
        if update.is_empty() {
            return Ok(workspace);
        }
        if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ServiceError::validation("Ofis adı zorunludur."));
        }
        if let Some(max_members) = update.max_members {
            let members = self.backend.profiles.list_by_workspace(workspace_id).await?;
            if (max_members as usize) < members.len() {
                return Err(ServiceError::validation(
                    "Üye sınırı mevcut üye sayısının altında olamaz.",
                ));
            }
        }

        update.apply(&mut workspace);
        let workspace = self.backend.workspaces.update(workspace).await?;
        tracing::info!(workspace_id, "Updated workspace");
        Ok(workspace)
    }

    /// Stores `bytes` as the workspace logo, replacing any earlier one.
    pub async fn upload_logo(
        &self,
        workspace_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ServiceResult<Workspace> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(ServiceError::validation("Logo bir görsel dosyası olmalıdır."));
        }
        if bytes.is_empty() {
            return Err(ServiceError::validation("Logo dosyası boş."));
        }
        if bytes.len() as u64 > self.max_logo_bytes {
            return Err(ServiceError::validation(format!(
                "Logo en fazla {} KB olabilir.",
                self.max_logo_bytes / 1024
            )));
        }
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_else(|| mime.subtype().to_string());

        let mut workspace = self.backend.workspaces.get(workspace_id).await?;
        let size = bytes.len();
        let key = self
            .backend
            .storage
            .upload(
                LOGO_BUCKET,
                &logo_key(workspace_id, &extension),
                bytes,
                mime.essence_str(),
                true,
            )
            .await?;
        workspace.logo_url = Some(self.backend.storage.public_url(LOGO_BUCKET, &key));
        let workspace = self.backend.workspaces.update(workspace).await?;
        tracing::info!(workspace_id, %key, size, "Uploaded workspace logo");

        self.remove_stale_logos(workspace_id, &key).await;
        Ok(workspace)
    }

    /// Deletes every logo object of the workspace except `current`.
    /// A failure leaves orphaned objects behind and is only logged.
    async fn remove_stale_logos(&self, workspace_id: &str, current: &str) {
        let storage = &self.backend.storage;
        let stale = match storage.list(LOGO_BUCKET, &workspace_prefix(workspace_id)).await {
            Ok(keys) => keys.into_iter().filter(|k| k != current).collect::<Vec<_>>(),
            Err(err) => {
                tracing::warn!(workspace_id, "Failed to list previous logos: {}", err.message);
                return;
            }
        };
        if stale.is_empty() {
            return;
        }
        if let Err(err) = storage.remove(LOGO_BUCKET, &stale).await {
            tracing::warn!(
                workspace_id,
                stale = stale.len(),
                "Failed to remove previous logos: {}",
                err.message
            );
        }
    }

    pub async fn delete_logo(&self, workspace_id: &str) -> ServiceResult<Workspace> {
        let mut workspace = self.backend.workspaces.get(workspace_id).await?;
        let keys = self
            .backend
            .storage
            .list(LOGO_BUCKET, &workspace_prefix(workspace_id))
            .await?;
        if !keys.is_empty() {
            self.backend.storage.remove(LOGO_BUCKET, &keys).await?;
        }
        if workspace.logo_url.take().is_none() && keys.is_empty() {
            return Ok(workspace);
        }
        let workspace = self.backend.workspaces.update(workspace).await?;
        tracing::info!(workspace_id, removed = keys.len(), "Deleted workspace logo");
        Ok(workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{broker_fixture, sign_up};
    use opero_core::auth::AuthBackend;
    use opero_core::error::{BackendError, ErrorKind};
    use opero_core::profile::ProfileRepository;
    use opero_core::storage::ObjectStorage;
    use opero_core::workspace::{BillingMode, PlanType};

    fn service(fixture: &crate::testing::Fixture) -> WorkspaceService {
        WorkspaceService::new(fixture.backend.clone(), &StorageSettings::default())
    }

    #[tokio::test]
    async fn test_create_links_owner_and_deduplicates_slug() {
        let fixture = broker_fixture().await;
        fixture.local.sign_out().await.unwrap();
        let owner = sign_up(&fixture.local, "mehmet@ofis.com", "Mehmet Öz", Role::Agent).await;
        let workspaces = service(&fixture);

        let workspace = workspaces
            .create_workspace(NewWorkspace {
                name: "Güneş Emlak".to_string(),
                owner_id: owner.id.clone(),
                plan_type: PlanType::Pro,
                billing_mode: BillingMode::Yearly,
            })
            .await
            .unwrap();
        assert_eq!(workspace.slug, "gunes-emlak-2");
        assert_eq!(workspace.max_members, 10);

        let profile = ProfileRepository::get(fixture.local.as_ref(), &owner.id).await.unwrap();
        assert_eq!(profile.workspace_id.as_deref(), Some(workspace.id.as_str()));
        assert_eq!(profile.role, Role::Broker);

        let by_slug = workspaces.get_workspace_by_slug("gunes-emlak-2").await.unwrap();
        assert_eq!(by_slug.id, workspace.id);
        assert!(workspaces.get_workspace_by_slug("yok").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_rejects_cap_below_member_count() {
        let fixture = broker_fixture().await;
        let workspaces = service(&fixture);

        let err = workspaces
            .update_workspace(
                &fixture.workspace_id,
                WorkspaceUpdate {
                    max_members: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let renamed = workspaces
            .update_workspace(
                &fixture.workspace_id,
                WorkspaceUpdate {
                    name: Some("Güneş Gayrimenkul".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Güneş Gayrimenkul");
        assert_eq!(renamed.slug, "gunes-emlak");
    }

    #[tokio::test]
    async fn test_logo_upload_replaces_previous_logo() {
        let fixture = broker_fixture().await;
        let workspaces = service(&fixture);

        workspaces
            .upload_logo(&fixture.workspace_id, "logo.PNG", vec![1, 2, 3])
            .await
            .unwrap();
        let workspace = workspaces
            .upload_logo(&fixture.workspace_id, "yeni-logo.jpg", vec![4, 5])
            .await
            .unwrap();

        let url = workspace.logo_url.unwrap();
        assert!(url.ends_with("/workspace-logos/ws-gunes/logo.jpg"));
        let keys = fixture.local.list(LOGO_BUCKET, "ws-gunes/").await.unwrap();
        assert_eq!(keys, vec!["ws-gunes/logo.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_logo_upload_keeps_previous_logo() {
        let fixture = broker_fixture().await;
        let workspaces = service(&fixture);
        let before = workspaces
            .upload_logo(&fixture.workspace_id, "logo.png", vec![1, 2, 3])
            .await
            .unwrap();

        fixture.local.pass_requests(1);
        fixture.local.inject_failure(BackendError::exception("Failed to fetch"));
        let err = workspaces
            .upload_logo(&fixture.workspace_id, "logo.jpg", vec![4, 5])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Connectivity);

        let workspace = workspaces.get_workspace(&fixture.workspace_id).await.unwrap();
        assert_eq!(workspace.logo_url, before.logo_url);
        let keys = fixture.local.list(LOGO_BUCKET, "ws-gunes/").await.unwrap();
        assert_eq!(keys, vec!["ws-gunes/logo.png".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_cleanup_still_switches_logo() {
        let fixture = broker_fixture().await;
        let workspaces = service(&fixture);
        workspaces
            .upload_logo(&fixture.workspace_id, "logo.png", vec![1, 2, 3])
            .await
            .unwrap();

        // get, upload and update succeed; listing the old logos fails.
        fixture.local.pass_requests(3);
        fixture.local.inject_failure(BackendError::exception("Failed to fetch"));
        let workspace = workspaces
            .upload_logo(&fixture.workspace_id, "logo.jpg", vec![4, 5])
            .await
            .unwrap();

        assert!(workspace.logo_url.unwrap().ends_with("/ws-gunes/logo.jpg"));
        let keys = fixture.local.list(LOGO_BUCKET, "ws-gunes/").await.unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn test_logo_must_be_a_small_image() {
        let fixture = broker_fixture().await;
        let workspaces = WorkspaceService::new(
            fixture.backend.clone(),
            &StorageSettings { max_logo_bytes: 4 },
        );

        let err = workspaces
            .upload_logo(&fixture.workspace_id, "brosur.pdf", vec![1])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = workspaces
            .upload_logo(&fixture.workspace_id, "logo.png", vec![0; 5])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_delete_logo_clears_url_and_objects() {
        let fixture = broker_fixture().await;
        let workspaces = service(&fixture);
        workspaces
            .upload_logo(&fixture.workspace_id, "logo.webp", vec![1])
            .await
            .unwrap();

        let workspace = workspaces.delete_logo(&fixture.workspace_id).await.unwrap();
        assert!(workspace.logo_url.is_none());
        assert!(fixture.local.list(LOGO_BUCKET, "ws-gunes/").await.unwrap().is_empty());
    }
}
