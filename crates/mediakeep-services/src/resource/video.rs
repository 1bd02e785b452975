use mediakeep_core::models::{BlobKind, HasBlobs, NewVideo, Video, VideoStatus};
use mediakeep_core::{AppError, DeleteSettings};
use mediakeep_db::VideoRepository;
use mediakeep_storage::BlobStore;
use std::sync::Arc;
use validator::Validate;

use super::{
    issue_upload_url, not_found, sign_blob, sign_blobs, CascadeDeleter, DeleteOutcome,
    ResourceAccess, SignedBlob, UploadUrlRequest,
};

const RESOURCE: &str = "video";

#[derive(Clone)]
pub struct VideoService {
    videos: Arc<dyn VideoRepository>,
    store: Arc<dyn BlobStore>,
    cascade: CascadeDeleter,
}

impl VideoService {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        store: Arc<dyn BlobStore>,
        delete: DeleteSettings,
    ) -> Self {
        Self {
            videos,
            cascade: CascadeDeleter::new(store.clone(), delete),
            store,
        }
    }

    pub async fn upload_url(&self, request: &UploadUrlRequest) -> Result<String, AppError> {
        issue_upload_url(self.store.as_ref(), request).await
    }

    #[tracing::instrument(skip(self, video), fields(video.title = %video.title, user_id = video.user_id))]
    pub async fn create(&self, video: NewVideo) -> Result<Video, AppError> {
        video.validate()?;
        let video = self.videos.create(video).await?;
        tracing::info!(video_id = video.id, "Video created");
        Ok(video)
    }

    /// Metadata plus a download URL for the media blob and thumbnail, when set.
    pub async fn get(&self, id: i64) -> Result<ResourceAccess<Video>, AppError> {
        let video = self.load(id).await?;
        let urls = sign_blobs(self.store.as_ref(), &video.blobs()).await?;
        Ok(ResourceAccess {
            resource: video,
            urls,
        })
    }

    /// Download URL for the media blob only.
    pub async fn download_url(&self, id: i64) -> Result<SignedBlob, AppError> {
        let video = self.load(id).await?;
        let media = video
            .blobs()
            .into_iter()
            .find(|blob| blob.kind == BlobKind::Video)
            .ok_or_else(|| AppError::ResourceNotFound(format!("video {} has no media", id)))?;
        sign_blob(self.store.as_ref(), &media).await
    }

    pub async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Video>, AppError> {
        self.videos.list_by_owner(user_id).await
    }

    /// Delete the media blob and thumbnail, then the row.
    ///
    /// Blob failures are recorded in the outcome; only a failed row delete is an error.
    /// A second call for the same id returns `ResourceNotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<DeleteOutcome, AppError> {
        let video = self.load(id).await?;
        if video.status == VideoStatus::Processing {
            tracing::warn!(video_id = id, "Deleting a video that is still processing");
        }

        let blobs = self.cascade.delete_blobs(&video).await;
        let metadata = self.videos.delete(id).await;
        self.cascade.finish(RESOURCE, id, blobs, metadata)
    }

    async fn load(&self, id: i64) -> Result<Video, AppError> {
        self.videos
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(RESOURCE, id))
    }
}
