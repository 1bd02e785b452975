//! Per-entity resource services.
//!
//! Each service combines a repository lookup with blob store calls: presigned URLs
//! for access, and the blob-then-metadata cascading delete.

pub mod audio;
pub mod avatar;
pub mod cascade;
pub mod transcription;
pub mod video;

pub use audio::AudioService;
pub use avatar::AvatarService;
pub use cascade::{BlobDeleteResult, BlobDeletion, CascadeDeleter, DeleteOutcome};
pub use transcription::TranscriptionService;
pub use video::VideoService;

use mediakeep_core::models::{AssociatedBlob, BlobKind};
use mediakeep_core::AppError;
use mediakeep_storage::{object_key, BlobStore};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request for a presigned upload URL.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UploadUrlRequest {
    #[validate(length(max = 512))]
    pub folder: String,
    pub file_name: String,
    #[validate(length(min = 1, max = 255))]
    pub content_type: String,
}

/// A presigned download URL for one blob of a resource.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SignedBlob {
    pub kind: BlobKind,
    pub url: String,
}

/// Metadata of a resource plus one download URL per set blob.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceAccess<T> {
    pub resource: T,
    pub urls: Vec<SignedBlob>,
}

impl<T> ResourceAccess<T> {
    pub fn url(&self, kind: BlobKind) -> Option<&str> {
        self.urls
            .iter()
            .find(|signed| signed.kind == kind)
            .map(|signed| signed.url.as_str())
    }
}

/// Issue a presigned upload URL. The key is checked before anything else so an
/// empty file name is always `InvalidKey`.
pub async fn issue_upload_url(
    store: &dyn BlobStore,
    request: &UploadUrlRequest,
) -> Result<String, AppError> {
    let key = object_key(&request.folder, &request.file_name)?;
    request.validate()?;

    let url = store
        .presign_upload(&request.folder, &request.file_name, &request.content_type)
        .await?;

    tracing::info!(
        blob.key = %key,
        content_type = %request.content_type,
        "Issued presigned upload URL"
    );
    Ok(url)
}

pub(crate) async fn sign_blobs(
    store: &dyn BlobStore,
    blobs: &[AssociatedBlob],
) -> Result<Vec<SignedBlob>, AppError> {
    let mut urls = Vec::with_capacity(blobs.len());
    for blob in blobs {
        urls.push(sign_blob(store, blob).await?);
    }
    Ok(urls)
}

pub(crate) async fn sign_blob(
    store: &dyn BlobStore,
    blob: &AssociatedBlob,
) -> Result<SignedBlob, AppError> {
    let url = store
        .presign_download(
            blob.pointer.folder(),
            blob.pointer.file_name(),
            blob.kind.content_type(),
        )
        .await?;
    Ok(SignedBlob {
        kind: blob.kind,
        url,
    })
}

pub(crate) fn not_found(resource: &str, id: i64) -> AppError {
    AppError::ResourceNotFound(format!("{} {} not found", resource, id))
}
