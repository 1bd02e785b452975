//! Repository trait abstractions
//!
//! Services depend on these traits rather than on the Postgres structs, so an
//! implementation is chosen once at process start and tests can substitute
//! in-memory doubles.

use async_trait::async_trait;
use mediakeep_core::models::{
    Audio, BlobPointer, NewAudio, NewTranscription, NewUser, NewVideo, Transcription, User, Video,
    VideoStatus,
};
use mediakeep_core::AppError;

#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Insert a video. The row always starts as `raw`.
    async fn create(&self, video: NewVideo) -> Result<Video, AppError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Video>, AppError>;

    async fn get_by_provision_key(&self, key: &str) -> Result<Option<Video>, AppError>;

    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Video>, AppError>;

    /// Write title, duration, description and blob pointers. Status is left alone.
    /// Returns false when the row does not exist.
    async fn update(&self, video: &Video) -> Result<bool, AppError>;

    /// Hard delete. Returns false when the row did not exist.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    async fn get_status(&self, id: i64) -> Result<Option<VideoStatus>, AppError>;

    /// Returns the number of rows affected.
    async fn update_status(&self, id: i64, status: VideoStatus) -> Result<u64, AppError>;
}

#[async_trait]
pub trait AudioRepository: Send + Sync {
    async fn create(&self, audio: NewAudio) -> Result<Audio, AppError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Audio>, AppError>;

    /// Returns `None` when the audio does not exist or belongs to another video.
    async fn get_by_video(&self, video_id: i64, id: i64) -> Result<Option<Audio>, AppError>;

    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Audio>, AppError>;

    async fn list_by_video(&self, video_id: i64) -> Result<Vec<Audio>, AppError>;

    async fn update(&self, audio: &Audio) -> Result<bool, AppError>;

    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TranscriptionRepository: Send + Sync {
    async fn create(&self, transcription: NewTranscription) -> Result<Transcription, AppError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Transcription>, AppError>;

    async fn get_by_video(
        &self,
        video_id: i64,
        id: i64,
    ) -> Result<Option<Transcription>, AppError>;

    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Transcription>, AppError>;

    async fn list_by_video(&self, video_id: i64) -> Result<Vec<Transcription>, AppError>;

    async fn update(&self, transcription: &Transcription) -> Result<bool, AppError>;

    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    /// Soft-deleted users are still returned, with status `deleted`.
    async fn get_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Users whose email ends with `suffix`, ordered by id.
    async fn list_by_email_suffix(&self, suffix: &str) -> Result<Vec<User>, AppError>;

    /// Write names and avatar pointer. Returns false when the row does not exist.
    async fn update(&self, user: &User) -> Result<bool, AppError>;

    async fn update_avatar(&self, id: i64, avatar: &BlobPointer) -> Result<bool, AppError>;

    /// Soft delete: marks the user `deleted` and keeps the row.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Hard delete. Only bulk cleanup removes user rows.
    async fn purge(&self, id: i64) -> Result<bool, AppError>;
}
