//! Video repository: CRUD and status updates for the videos table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediakeep_core::models::{NewVideo, Video, VideoStatus};
use mediakeep_core::AppError;
use sqlx::{PgPool, Postgres};

use super::pointer_from_columns;
use crate::repository::VideoRepository;

const VIDEO_COLUMNS: &str = "id, user_id, title, duration, description, folder, file_name, image, status, provision_key, created_at, updated_at";

/// Row type for videos table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct VideoRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub duration: i32,
    pub description: String,
    pub folder: String,
    pub file_name: String,
    pub image: String,
    pub status: VideoStatus,
    pub provision_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRow {
    pub fn into_video(self) -> Result<Video, AppError> {
        let blob = pointer_from_columns("videos", self.id, self.folder, self.file_name)?;
        Ok(Video {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            duration: self.duration,
            description: self.description,
            blob,
            image: self.image,
            status: self.status,
            provision_key: self.provision_key,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "insert", user_id = video.user_id))]
    async fn create(&self, video: NewVideo) -> Result<Video, AppError> {
        let row: VideoRow = sqlx::query_as::<Postgres, VideoRow>(&format!(
            r#"
            INSERT INTO videos (user_id, title, duration, description, folder, file_name, image, status, provision_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'raw', $8)
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        ))
        .bind(video.user_id)
        .bind(&video.title)
        .bind(video.duration)
        .bind(&video.description)
        .bind(video.blob.folder())
        .bind(video.blob.file_name())
        .bind(&video.image)
        .bind(&video.provision_key)
        .fetch_one(&self.pool)
        .await?;

        let video = row.into_video()?;
        tracing::info!(db.record_id = video.id, "Video row created");
        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.record_id = id))]
    async fn get_by_id(&self, id: i64) -> Result<Option<Video>, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            "SELECT {} FROM videos WHERE id = $1",
            VIDEO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(VideoRow::into_video).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos"))]
    async fn get_by_provision_key(&self, key: &str) -> Result<Option<Video>, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            "SELECT {} FROM videos WHERE provision_key = $1",
            VIDEO_COLUMNS
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        row.map(VideoRow::into_video).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos"))]
    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Video>, AppError> {
        let rows: Vec<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            "SELECT {} FROM videos WHERE user_id = $1 ORDER BY id",
            VIDEO_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(VideoRow::into_video).collect()
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "update", db.record_id = video.id))]
    async fn update(&self, video: &Video) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET title = $2, duration = $3, description = $4, folder = $5, file_name = $6,
                image = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(video.duration)
        .bind(&video.description)
        .bind(video.blob.folder())
        .bind(video.blob.file_name())
        .bind(&video.image)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "delete", db.record_id = id))]
    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.record_id = id))]
    async fn get_status(&self, id: i64) -> Result<Option<VideoStatus>, AppError> {
        let status: Option<VideoStatus> =
            sqlx::query_scalar::<Postgres, VideoStatus>("SELECT status FROM videos WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(status)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update_status", db.record_id = id))]
    async fn update_status(&self, id: i64, status: VideoStatus) -> Result<u64, AppError> {
        let result =
            sqlx::query("UPDATE videos SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
