//! Blob store abstraction trait
//!
//! This module defines the `BlobStore` trait that all storage backends implement.
//! Every operation addresses an object by `(folder, file_name)`; keys are built with
//! [`crate::keys::object_key`].

use crate::keys::object_key;
use crate::StorageBackend;
use async_trait::async_trait;
use mediakeep_core::constants::BLOB_ABSENCE_POLL_INTERVAL;
use mediakeep_core::AppError;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Blob store unavailable: {0}")]
    Unavailable(String),

    #[error("Object {key} still present after {waited:?}")]
    Timeout { key: String, waited: Duration },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::ResourceNotFound(format!("blob {}", key)),
            StorageError::InvalidKey(msg) => AppError::InvalidKey(msg),
            StorageError::ConfigError(msg) => AppError::Config(msg),
            other => AppError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Blob store abstraction
///
/// Implementations must be safe to share across concurrent requests. Request-serving
/// code only presigns and deletes; `upload` exists for the bulk provisioner.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Presigned PUT URL for `(folder, file_name)`, valid for
    /// [`mediakeep_core::constants::PRESIGNED_URL_EXPIRY`].
    async fn presign_upload(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Presigned GET URL for `(folder, file_name)`, same key and expiry as uploads.
    async fn presign_download(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Write `data` to `(folder, file_name)` and return the object key.
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String>;

    /// Delete the object. Returns `NotFound` when there is nothing to delete.
    async fn delete(&self, folder: &str, file_name: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, folder: &str, file_name: &str) -> StorageResult<bool>;

    /// Delete the object, then poll until it is observably absent.
    ///
    /// Fails with `Timeout` once `timeout` has elapsed and the object is still visible.
    async fn delete_and_wait(
        &self,
        folder: &str,
        file_name: &str,
        timeout: Duration,
    ) -> StorageResult<()> {
        self.delete(folder, file_name).await?;

        let key = object_key(folder, file_name)?;
        let wait = async {
            loop {
                if !self.exists(folder, file_name).await? {
                    return Ok::<(), StorageError>(());
                }
                tokio::time::sleep(BLOB_ABSENCE_POLL_INTERVAL).await;
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout {
                key,
                waited: timeout,
            }),
        }
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
