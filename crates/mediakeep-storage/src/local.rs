use crate::keys::object_key;
use crate::traits::{BlobStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use mediakeep_core::constants::PRESIGNED_URL_EXPIRY;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem blob store
///
/// Objects live under `base_path/{key}`. "Presigned" URLs are plain links under
/// `base_url` carrying the intended method and expiry; serving and enforcing them
/// is left to whatever fronts the directory.
#[derive(Clone)]
pub struct LocalBlobStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    /// Create a new LocalBlobStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for objects (e.g., "/var/lib/mediakeep/blobs")
    /// * `base_url` - Base URL the directory is served under (e.g., "http://localhost:3000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalBlobStore {
            base_path,
            base_url,
        })
    }

    /// Convert `(folder, file_name)` to a filesystem path with traversal checks.
    fn resolve(&self, folder: &str, file_name: &str) -> StorageResult<(String, PathBuf)> {
        let key = object_key(folder, file_name)?;
        let plain = Path::new(&key)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !plain || key.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(&key);
        if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok((key, path))
    }

    fn signed_url(&self, key: &str, method: &str) -> String {
        let expires = SystemTime::now()
            .checked_add(PRESIGNED_URL_EXPIRY)
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or_default();
        format!(
            "{}/{}?method={}&expires={}",
            self.base_url.trim_end_matches('/'),
            key,
            method,
            expires
        )
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn presign_upload(
        &self,
        folder: &str,
        file_name: &str,
        _content_type: &str,
    ) -> StorageResult<String> {
        let (key, _) = self.resolve(folder, file_name)?;
        Ok(self.signed_url(&key, "PUT"))
    }

    async fn presign_download(
        &self,
        folder: &str,
        file_name: &str,
        _content_type: &str,
    ) -> StorageResult<String> {
        let (key, _) = self.resolve(folder, file_name)?;
        Ok(self.signed_url(&key, "GET"))
    }

    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String> {
        let (key, path) = self.resolve(folder, file_name)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::Unavailable(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::Unavailable(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::Unavailable(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(key)
    }

    async fn delete(&self, folder: &str, file_name: &str) -> StorageResult<()> {
        let (key, path) = self.resolve(folder, file_name)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key));
            }
            Err(e) => {
                return Err(StorageError::Unavailable(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, folder: &str, file_name: &str) -> StorageResult<bool> {
        let (key, path) = self.resolve(folder, file_name)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::Unavailable(format!("Failed to stat {}: {}", key, e)))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    async fn store(dir: &Path) -> LocalBlobStore {
        LocalBlobStore::new(dir, "http://localhost:3000/media".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_exists_under_shared_key() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;

        let key = store
            .upload("videos", "clip.mp4", "video/mp4", b"data".to_vec())
            .await
            .unwrap();

        assert_eq!(key, "videos/clip.mp4");
        assert!(dir.path().join("videos/clip.mp4").exists());
        assert!(store.exists("videos", "clip.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_presigned_urls_address_same_key() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;

        let put = store
            .presign_upload("avatars", "me.png", "image/png")
            .await
            .unwrap();
        let get = store
            .presign_download("avatars", "me.png", "image/jpeg")
            .await
            .unwrap();

        let path_of = |url: &str| url.split('?').next().unwrap().to_string();
        assert_eq!(path_of(&put), "http://localhost:3000/media/avatars/me.png");
        assert_eq!(path_of(&put), path_of(&get));
        assert!(put.contains("method=PUT"));
        assert!(get.contains("method=GET"));
    }

    #[tokio::test]
    async fn test_empty_file_name_rejected() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;

        let result = store.presign_upload("videos", "", "video/mp4").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;

        let result = store.delete("..", "etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store.exists("/etc", "passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_reports_not_found() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;

        let result = store.delete("videos", "missing.mp4").await;
        assert!(matches!(result, Err(StorageError::NotFound(key)) if key == "videos/missing.mp4"));
    }

    #[tokio::test]
    async fn test_delete_and_wait_removes_object() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;

        store
            .upload("", "loose.json", "application/json", b"{}".to_vec())
            .await
            .unwrap();
        store
            .delete_and_wait("", "loose.json", Duration::from_secs(2))
            .await
            .unwrap();

        assert!(!store.exists("", "loose.json").await.unwrap());
    }

    #[tokio::test]
    async fn test_double_dots_inside_a_name_are_allowed() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;

        store
            .upload("avatars", "a..b.png", "image/png", b"png".to_vec())
            .await
            .unwrap();
        assert!(store.exists("avatars", "a..b.png").await.unwrap());

        let result = store.exists("avatars/..", "a..b.png").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exists_surfaces_io_errors() {
        let dir = tempdir().unwrap();
        let store = store(dir.path()).await;
        // A regular file where a folder is expected makes stat fail with ENOTDIR.
        std::fs::write(dir.path().join("videos"), b"not a dir").unwrap();

        let result = store.exists("videos", "clip.mp4").await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
    }
}
