use mediakeep_core::models::{HasBlobs, NewTranscription, Transcription};
use mediakeep_core::{AppError, DeleteSettings};
use mediakeep_db::TranscriptionRepository;
use mediakeep_storage::BlobStore;
use std::sync::Arc;
use validator::Validate;

use super::{
    issue_upload_url, not_found, sign_blobs, CascadeDeleter, DeleteOutcome, ResourceAccess,
    SignedBlob, UploadUrlRequest,
};

const RESOURCE: &str = "transcription";

#[derive(Clone)]
pub struct TranscriptionService {
    transcriptions: Arc<dyn TranscriptionRepository>,
    store: Arc<dyn BlobStore>,
    cascade: CascadeDeleter,
}

impl TranscriptionService {
    pub fn new(
        transcriptions: Arc<dyn TranscriptionRepository>,
        store: Arc<dyn BlobStore>,
        delete: DeleteSettings,
    ) -> Self {
        Self {
            transcriptions,
            cascade: CascadeDeleter::new(store.clone(), delete),
            store,
        }
    }

    pub async fn upload_url(&self, request: &UploadUrlRequest) -> Result<String, AppError> {
        issue_upload_url(self.store.as_ref(), request).await
    }

    #[tracing::instrument(skip(self, transcription), fields(video_id = transcription.video_id, lang = %transcription.lang))]
    pub async fn create(&self, transcription: NewTranscription) -> Result<Transcription, AppError> {
        transcription.validate()?;
        let transcription = self.transcriptions.create(transcription).await?;
        tracing::info!(transcription_id = transcription.id, "Transcription created");
        Ok(transcription)
    }

    pub async fn get(&self, id: i64) -> Result<ResourceAccess<Transcription>, AppError> {
        let transcription = self.load(id).await?;
        self.with_urls(transcription).await
    }

    pub async fn get_for_video(
        &self,
        video_id: i64,
        id: i64,
    ) -> Result<ResourceAccess<Transcription>, AppError> {
        let transcription = self
            .transcriptions
            .get_by_video(video_id, id)
            .await?
            .ok_or_else(|| not_found(RESOURCE, id))?;
        self.with_urls(transcription).await
    }

    pub async fn download_url(&self, id: i64) -> Result<SignedBlob, AppError> {
        self.get(id).await?.urls.into_iter().next().ok_or_else(|| {
            AppError::ResourceNotFound(format!("transcription {} has no blob", id))
        })
    }

    pub async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Transcription>, AppError> {
        self.transcriptions.list_by_owner(user_id).await
    }

    pub async fn list_by_video(&self, video_id: i64) -> Result<Vec<Transcription>, AppError> {
        self.transcriptions.list_by_video(video_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<DeleteOutcome, AppError> {
        let transcription = self.load(id).await?;
        let blobs = self.cascade.delete_blobs(&transcription).await;
        let metadata = self.transcriptions.delete(id).await;
        self.cascade.finish(RESOURCE, id, blobs, metadata)
    }

    async fn load(&self, id: i64) -> Result<Transcription, AppError> {
        self.transcriptions
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(RESOURCE, id))
    }

    async fn with_urls(
        &self,
        transcription: Transcription,
    ) -> Result<ResourceAccess<Transcription>, AppError> {
        let urls = sign_blobs(self.store.as_ref(), &transcription.blobs()).await?;
        Ok(ResourceAccess {
            resource: transcription,
            urls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestContext;
    use mediakeep_core::models::BlobPointer;

    fn new_transcription(blob: BlobPointer) -> NewTranscription {
        NewTranscription {
            video_id: 5,
            user_id: 2,
            text: "hello".to_string(),
            lang: "en".to_string(),
            blob,
        }
    }

    #[tokio::test]
    async fn transcription_without_blob_has_no_urls() {
        let ctx = TestContext::new();
        let service = ctx.transcription_service();
        let t = service
            .create(new_transcription(BlobPointer::unset()))
            .await
            .unwrap();

        assert!(service.get(t.id).await.unwrap().urls.is_empty());
        assert!(service.download_url(t.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn store_outage_surfaces_on_get() {
        let ctx = TestContext::new();
        let service = ctx.transcription_service();
        let t = service
            .create(new_transcription(
                BlobPointer::new("transcriptions", "t.json").unwrap(),
            ))
            .await
            .unwrap();
        ctx.store.set_unavailable(true);

        let err = service.get(t.id).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn delete_with_store_outage_still_removes_row() {
        let ctx = TestContext::new();
        let service = ctx.transcription_service();
        let t = service
            .create(new_transcription(
                BlobPointer::new("transcriptions", "t.json").unwrap(),
            ))
            .await
            .unwrap();
        ctx.store.set_unavailable(true);

        let outcome = service.delete(t.id).await.unwrap();
        assert_eq!(outcome.blob_failures(), 1);
        assert_eq!(ctx.transcriptions.row_count(), 0);
    }

    #[tokio::test]
    async fn rejects_short_language() {
        let ctx = TestContext::new();
        let mut input = new_transcription(BlobPointer::unset());
        input.lang = "e".to_string();
        let err = ctx.transcription_service().create(input).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
