use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use opero_core::error::{BackendError, BackendResult};
use opero_core::storage::{LOGO_BUCKET, ObjectStorage};

use super::{LocalBackend, LocalState, StoredObject};

/// Objects keyed by `(bucket, key)`.
pub(super) type ObjectMap = BTreeMap<(String, String), StoredObject>;

/// Reads every object mirrored under `dir` (`<dir>/<bucket>/<key>`).
pub(super) fn load_objects(dir: &Path) -> std::io::Result<ObjectMap> {
    let mut objects = ObjectMap::new();
    if !dir.exists() {
        return Ok(objects);
    }

    for bucket in fs::read_dir(dir)? {
        let bucket = bucket?;
        if !bucket.file_type()?.is_dir() {
            continue;
        }
        let bucket_name = bucket.file_name().to_string_lossy().into_owned();
        let mut files = Vec::new();
        collect_files(&bucket.path(), &mut files)?;

        for path in files {
            let Ok(relative) = path.strip_prefix(bucket.path()) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let content_type = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .essence_str()
                .to_string();
            objects.insert(
                (bucket_name.clone(), key),
                StoredObject {
                    bytes: fs::read(&path)?,
                    content_type,
                },
            );
        }
    }

    Ok(objects)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            collect_files(&entry.path(), out)?;
        } else {
            out.push(entry.path());
        }
    }
    Ok(())
}

impl LocalBackend {
    /// Keys are scoped by their first segment, the owning workspace id.
    fn require_object_access(&self, state: &LocalState, bucket: &str, key: &str) -> BackendResult<()> {
        self.require_authenticated(state, "objects")?;
        if bucket != LOGO_BUCKET {
            return Ok(());
        }
        let workspace_id = key.split('/').next().unwrap_or_default();
        if self.can_access_workspace(state, workspace_id) || self.manages_workspace(state, workspace_id)
        {
            Ok(())
        } else {
            Err(BackendError::permission_denied("objects"))
        }
    }

    /// Fetches an object with its content type.
    pub async fn download(&self, bucket: &str, key: &str) -> BackendResult<(Vec<u8>, String)> {
        self.begin_read().await?;
        let state = self.state.read().await;
        self.require_object_access(&state, bucket, key)?;
        state
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|object| (object.bytes.clone(), object.content_type.clone()))
            .ok_or_else(BackendError::no_rows)
    }

    fn mirror_path(&self, bucket: &str, key: &str) -> Option<PathBuf> {
        self.storage_dir
            .as_ref()
            .map(|dir| key.split('/').fold(dir.join(bucket), |path, segment| path.join(segment)))
    }
}

fn storage_failure(err: std::io::Error) -> BackendError {
    tracing::error!("Object storage write failed: {}", err);
    BackendError::exception(format!("storage write failed: {err}"))
}

#[async_trait]
impl ObjectStorage for LocalBackend {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> BackendResult<String> {
        self.enter().await?;
        let mut state = self.state.write().await;
        self.require_object_access(&state, bucket, key)?;

        let id = (bucket.to_string(), key.to_string());
        if !upsert && state.objects.contains_key(&id) {
            return Err(BackendError::unique_violation("objects_bucketid_name_key"));
        }

        if let Some(path) = self.mirror_path(bucket, key) {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(storage_failure)?;
            }
            tokio::fs::write(&path, &bytes).await.map_err(storage_failure)?;
        }

        tracing::debug!(bucket, key, size = bytes.len(), "Stored object");
        state.objects.insert(
            id,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(key.to_string())
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> BackendResult<()> {
        self.enter().await?;
        let mut state = self.state.write().await;
        for key in keys {
            self.require_object_access(&state, bucket, key)?;
        }
        for key in keys {
            if state.objects.remove(&(bucket.to_string(), key.clone())).is_none() {
                continue;
            }
            if let Some(path) = self.mirror_path(bucket, key) {
                if let Err(err) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(bucket, key = %key, "Failed to remove mirrored object: {}", err);
                }
            }
        }
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> BackendResult<Vec<String>> {
        self.begin_read().await?;
        let state = self.state.read().await;
        self.require_authenticated(&state, "objects")?;
        Ok(state
            .objects
            .keys()
            .filter(|(b, key)| b == bucket && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{key}", self.public_url)
    }
}
