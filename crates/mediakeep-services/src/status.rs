//! Video processing status.
//!
//! Every transition between the four states is allowed. Only values outside the
//! enumeration are rejected, and a missing video is `ResourceNotFound` for both
//! reads and updates.

use mediakeep_core::models::VideoStatus;
use mediakeep_core::AppError;
use mediakeep_db::VideoRepository;
use std::sync::Arc;

use crate::resource::not_found;

#[derive(Clone)]
pub struct VideoStatusService {
    videos: Arc<dyn VideoRepository>,
}

impl VideoStatusService {
    pub fn new(videos: Arc<dyn VideoRepository>) -> Self {
        Self { videos }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_status(&self, video_id: i64) -> Result<VideoStatus, AppError> {
        self.videos
            .get_status(video_id)
            .await?
            .ok_or_else(|| not_found("video", video_id))
    }

    /// Parse `status` and write it. Unknown values fail with `InvalidStatus` before the
    /// store is touched.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, video_id: i64, status: &str) -> Result<VideoStatus, AppError> {
        let next: VideoStatus = status.parse()?;
        self.set_status(video_id, next).await
    }

    pub async fn set_status(&self, video_id: i64, next: VideoStatus) -> Result<VideoStatus, AppError> {
        let previous = self.get_status(video_id).await?;

        if next == VideoStatus::Processing && previous.is_settled() {
            tracing::info!(video_id, previous = %previous, "Restarting processing of settled video");
        }

        // Zero rows means the video vanished between the read and the write.
        let rows = self.videos.update_status(video_id, next).await?;
        if rows == 0 {
            return Err(not_found("video", video_id));
        }

        tracing::info!(
            video_id,
            from = %previous,
            to = %next,
            "Video status updated"
        );
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestContext;
    use mediakeep_core::models::{BlobPointer, NewVideo};

    async fn seed(ctx: &TestContext) -> i64 {
        ctx.video_service()
            .create(NewVideo {
                user_id: 1,
                title: "Clip".to_string(),
                duration: 3,
                description: String::new(),
                blob: BlobPointer::unset(),
                image: String::new(),
                provision_key: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn new_videos_start_raw() {
        let ctx = TestContext::new();
        let id = seed(&ctx).await;
        assert_eq!(ctx.status_service().get_status(id).await.unwrap(), VideoStatus::Raw);
    }

    #[tokio::test]
    async fn accepts_every_member_of_the_enumeration() {
        let ctx = TestContext::new();
        let id = seed(&ctx).await;
        let service = ctx.status_service();

        for status in VideoStatus::ALL {
            let updated = service.update_status(id, status.as_str()).await.unwrap();
            assert_eq!(updated, status);
            assert_eq!(service.get_status(id).await.unwrap(), status);
        }
    }

    #[tokio::test]
    async fn any_state_reaches_any_other() {
        let ctx = TestContext::new();
        let id = seed(&ctx).await;
        let service = ctx.status_service();

        for from in VideoStatus::ALL {
            for to in VideoStatus::ALL {
                service.set_status(id, from).await.unwrap();
                assert_eq!(service.set_status(id, to).await.unwrap(), to);
            }
        }
    }

    #[tokio::test]
    async fn rejects_values_outside_enumeration() {
        let ctx = TestContext::new();
        let id = seed(&ctx).await;
        let service = ctx.status_service();

        for bad in ["", "done", "RAW", "processing "] {
            let err = service.update_status(id, bad).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidStatus(_)), "{bad:?}");
        }
        assert_eq!(service.get_status(id).await.unwrap(), VideoStatus::Raw);
    }

    #[tokio::test]
    async fn missing_video_is_not_found() {
        let ctx = TestContext::new();
        let service = ctx.status_service();

        assert!(service.get_status(42).await.unwrap_err().is_not_found());
        assert!(service
            .update_status(42, "processing")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn video_removed_between_read_and_write_is_not_found() {
        let ctx = TestContext::new();
        let id = seed(&ctx).await;
        ctx.videos.drop_after_next_status_read();

        let err = ctx
            .status_service()
            .update_status(id, "processing")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ResourceNotFound(_)));
        assert_eq!(ctx.videos.row_count(), 0);
    }
}
