#[cfg(feature = "storage-local")]
use crate::LocalBlobStore;
#[cfg(feature = "storage-s3")]
use crate::S3BlobStore;
use crate::{BlobStore, StorageBackend, StorageError, StorageResult};
use mediakeep_core::Config;
use std::sync::Arc;

/// Create a blob store based on configuration
pub async fn create_blob_store(config: &Config) -> StorageResult<Arc<dyn BlobStore>> {
    let backend = config.storage_backend().unwrap_or(StorageBackend::S3);

    match backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config
                .s3_region()
                .map(String::from)
                .or_else(|| config.aws_region().map(String::from))
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;
            let endpoint = config.s3_endpoint().map(String::from);

            tracing::info!(bucket = %bucket, region = %region, "Using S3 blob store");
            let store = S3BlobStore::new(bucket, region, endpoint).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            tracing::info!(path = %base_path, "Using local blob store");
            let store = LocalBlobStore::new(base_path, base_url).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use mediakeep_core::{DeleteSettings, ProvisionSettings};

    fn config(backend: StorageBackend, path: Option<String>) -> Config {
        Config {
            environment: "test".to_string(),
            log_format: "pretty".to_string(),
            database_url: "postgres://localhost/mediakeep".to_string(),
            db_max_connections: 1,
            db_timeout_seconds: 1,
            storage_backend: Some(backend),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: path,
            local_storage_base_url: Some("http://localhost:3000/media".to_string()),
            provision: ProvisionSettings::default(),
            delete: DeleteSettings::default(),
        }
    }

    #[tokio::test]
    async fn test_creates_local_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_string_lossy().to_string();

        let store = create_blob_store(&config(StorageBackend::Local, Some(path)))
            .await
            .unwrap();
        assert_eq!(store.backend_type(), StorageBackend::Local);
    }

    #[tokio::test]
    async fn test_missing_local_path_is_config_error() {
        let result = create_blob_store(&config(StorageBackend::Local, None)).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[cfg(feature = "storage-s3")]
    #[tokio::test]
    async fn test_missing_bucket_is_config_error() {
        let result = create_blob_store(&config(StorageBackend::S3, None)).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
