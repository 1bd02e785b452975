use mediakeep_core::models::{Audio, HasBlobs, NewAudio};
use mediakeep_core::{AppError, DeleteSettings};
use mediakeep_db::AudioRepository;
use mediakeep_storage::BlobStore;
use std::sync::Arc;
use validator::Validate;

use super::{
    issue_upload_url, not_found, sign_blobs, CascadeDeleter, DeleteOutcome, ResourceAccess,
    SignedBlob, UploadUrlRequest,
};

const RESOURCE: &str = "audio";

#[derive(Clone)]
pub struct AudioService {
    audios: Arc<dyn AudioRepository>,
    store: Arc<dyn BlobStore>,
    cascade: CascadeDeleter,
}

impl AudioService {
    pub fn new(
        audios: Arc<dyn AudioRepository>,
        store: Arc<dyn BlobStore>,
        delete: DeleteSettings,
    ) -> Self {
        Self {
            audios,
            cascade: CascadeDeleter::new(store.clone(), delete),
            store,
        }
    }

    pub async fn upload_url(&self, request: &UploadUrlRequest) -> Result<String, AppError> {
        issue_upload_url(self.store.as_ref(), request).await
    }

    #[tracing::instrument(skip(self, audio), fields(video_id = audio.video_id, lang = %audio.lang))]
    pub async fn create(&self, audio: NewAudio) -> Result<Audio, AppError> {
        audio.validate()?;
        let audio = self.audios.create(audio).await?;
        tracing::info!(audio_id = audio.id, "Audio created");
        Ok(audio)
    }

    pub async fn get(&self, id: i64) -> Result<ResourceAccess<Audio>, AppError> {
        let audio = self.load(id).await?;
        self.with_urls(audio).await
    }

    /// Like [`get`](Self::get), but an audio that belongs to another video is not found.
    pub async fn get_for_video(
        &self,
        video_id: i64,
        id: i64,
    ) -> Result<ResourceAccess<Audio>, AppError> {
        let audio = self
            .audios
            .get_by_video(video_id, id)
            .await?
            .ok_or_else(|| not_found(RESOURCE, id))?;
        self.with_urls(audio).await
    }

    pub async fn download_url(&self, id: i64) -> Result<SignedBlob, AppError> {
        let access = self.get(id).await?;
        access
            .urls
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ResourceNotFound(format!("audio {} has no blob", id)))
    }

    pub async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Audio>, AppError> {
        self.audios.list_by_owner(user_id).await
    }

    pub async fn list_by_video(&self, video_id: i64) -> Result<Vec<Audio>, AppError> {
        self.audios.list_by_video(video_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<DeleteOutcome, AppError> {
        let audio = self.load(id).await?;
        let blobs = self.cascade.delete_blobs(&audio).await;
        let metadata = self.audios.delete(id).await;
        self.cascade.finish(RESOURCE, id, blobs, metadata)
    }

    async fn load(&self, id: i64) -> Result<Audio, AppError> {
        self.audios
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(RESOURCE, id))
    }

    async fn with_urls(&self, audio: Audio) -> Result<ResourceAccess<Audio>, AppError> {
        let urls = sign_blobs(self.store.as_ref(), &audio.blobs()).await?;
        Ok(ResourceAccess {
            resource: audio,
            urls,
        })
    }
}
