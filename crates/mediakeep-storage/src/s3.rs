use crate::keys::object_key;
use crate::traits::{BlobStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use mediakeep_core::constants::PRESIGNED_URL_EXPIRY;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};

/// S3 blob store
#[derive(Clone)]
pub struct S3BlobStore {
    store: AmazonS3,
    bucket: String,
}

impl S3BlobStore {
    /// Create a new S3BlobStore instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the usual AWS_* environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3BlobStore { store, bucket })
    }

    async fn presign(
        &self,
        method: Method,
        folder: &str,
        file_name: &str,
        content_type: &str,
    ) -> StorageResult<String> {
        let key = object_key(folder, file_name)?;
        let location = Path::from(key.clone());

        let url_result: ObjectResult<_> = self
            .store
            .signed_url(method.clone(), &location, PRESIGNED_URL_EXPIRY)
            .await;

        let url = url_result
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    method = %method,
                    "S3 presign failed"
                );
                StorageError::Unavailable(e.to_string())
            })?
            .to_string();

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            method = %method,
            content_type = %content_type,
            expires_in_secs = PRESIGNED_URL_EXPIRY.as_secs(),
            "S3 presigned URL issued"
        );

        Ok(url)
    }
}

/// Put options that store `content_type` with the object, so presigned GETs serve it.
fn put_options(content_type: &str) -> PutOptions {
    PutOptions {
        attributes: Attributes::from_iter([(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        )]),
        ..Default::default()
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn presign_upload(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
    ) -> StorageResult<String> {
        self.presign(Method::PUT, folder, file_name, content_type)
            .await
    }

    async fn presign_download(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
    ) -> StorageResult<String> {
        self.presign(Method::GET, folder, file_name, content_type)
            .await
    }

    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String> {
        let key = object_key(folder, file_name)?;
        let size = data.len() as u64;
        let location = Path::from(key.clone());

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put_opts(
                &location,
                PutPayload::from(Bytes::from(data)),
                put_options(content_type),
            )
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::Unavailable(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(key)
    }

    async fn delete(&self, folder: &str, file_name: &str) -> StorageResult<()> {
        let key = object_key(folder, file_name)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.clone());

        // S3 deletes are silent for missing keys; HEAD first so callers see NotFound.
        match self.store.head(&location).await {
            Ok(_) => {}
            Err(ObjectStoreError::NotFound { .. }) => return Err(StorageError::NotFound(key)),
            Err(e) => return Err(StorageError::Unavailable(e.to_string())),
        }

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            StorageError::Unavailable(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, folder: &str, file_name: &str) -> StorageResult<bool> {
        let location = Path::from(object_key(folder, file_name)?);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::Unavailable(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_options_carry_content_type() {
        let opts = put_options("video/mp4");
        assert_eq!(
            opts.attributes
                .get(&Attribute::ContentType)
                .map(|value| value.as_ref()),
            Some("video/mp4")
        );
    }
}
