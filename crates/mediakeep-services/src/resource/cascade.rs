//! Blob-then-metadata deletion shared by every resource and by bulk cleanup.
//!
//! Blob failures are logged and recorded but never stop the metadata delete. A blob
//! that is already gone counts as deleted, which keeps a repeated delete idempotent.

use mediakeep_core::models::{BlobKind, HasBlobs};
use mediakeep_core::{AppError, DeleteSettings};
use mediakeep_storage::{object_key, BlobStore, StorageError};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "error", rename_all = "snake_case")]
pub enum BlobDeleteResult {
    Deleted,
    AlreadyAbsent,
    /// Recovered locally; the metadata delete still ran.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobDeletion {
    pub kind: BlobKind,
    pub key: String,
    pub result: BlobDeleteResult,
}

impl BlobDeletion {
    pub fn is_failure(&self) -> bool {
        matches!(self.result, BlobDeleteResult::Failed(_))
    }
}

/// Result of a successful cascading delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub resource: &'static str,
    pub id: i64,
    pub blobs: Vec<BlobDeletion>,
    /// False when the row was already gone by the time the delete ran.
    pub metadata_deleted: bool,
}

impl DeleteOutcome {
    pub fn blob_failures(&self) -> usize {
        self.blobs.iter().filter(|b| b.is_failure()).count()
    }
}

#[derive(Clone)]
pub struct CascadeDeleter {
    store: Arc<dyn BlobStore>,
    settings: DeleteSettings,
}

impl CascadeDeleter {
    pub fn new(store: Arc<dyn BlobStore>, settings: DeleteSettings) -> Self {
        Self { store, settings }
    }

    /// Delete every set blob of `entity`, in order, recording each result.
    pub async fn delete_blobs(&self, entity: &impl HasBlobs) -> Vec<BlobDeletion> {
        let blobs = entity.blobs();
        let mut deletions = Vec::with_capacity(blobs.len());

        for blob in blobs {
            let folder = blob.pointer.folder();
            let file_name = blob.pointer.file_name();
            let key = object_key(folder, file_name).unwrap_or_else(|_| blob.pointer.to_string());

            let result = match self.settings.blob_delete_wait {
                Some(timeout) => self.store.delete_and_wait(folder, file_name, timeout).await,
                None => self.store.delete(folder, file_name).await,
            };

            let result = match result {
                Ok(()) => {
                    tracing::debug!(blob.key = %key, blob.kind = %blob.kind, "Blob deleted");
                    BlobDeleteResult::Deleted
                }
                Err(StorageError::NotFound(_)) => {
                    tracing::debug!(blob.key = %key, blob.kind = %blob.kind, "Blob already absent");
                    BlobDeleteResult::AlreadyAbsent
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        blob.key = %key,
                        blob.kind = %blob.kind,
                        "Failed to delete blob, continuing with metadata deletion"
                    );
                    BlobDeleteResult::Failed(e.to_string())
                }
            };

            deletions.push(BlobDeletion {
                kind: blob.kind,
                key,
                result,
            });
        }

        deletions
    }

    /// Turn the metadata delete result into the outcome of the whole operation.
    pub fn finish(
        &self,
        resource: &'static str,
        id: i64,
        blobs: Vec<BlobDeletion>,
        metadata: Result<bool, AppError>,
    ) -> Result<DeleteOutcome, AppError> {
        match metadata {
            Ok(metadata_deleted) => {
                let outcome = DeleteOutcome {
                    resource,
                    id,
                    blobs,
                    metadata_deleted,
                };
                tracing::info!(
                    resource,
                    id,
                    blob_failures = outcome.blob_failures(),
                    metadata_deleted,
                    "Resource deleted"
                );
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    resource,
                    id,
                    blobs_processed = blobs.len(),
                    "Failed to delete metadata row after blob deletion"
                );
                Err(AppError::MetadataDeleteFailed {
                    resource,
                    id,
                    reason: e.to_string(),
                })
            }
        }
    }
}
