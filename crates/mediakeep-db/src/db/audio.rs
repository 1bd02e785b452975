//! Audio repository: CRUD for the audios table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediakeep_core::models::{Audio, NewAudio};
use mediakeep_core::AppError;
use sqlx::{PgPool, Postgres};

use super::pointer_from_columns;
use crate::repository::AudioRepository;

const AUDIO_COLUMNS: &str =
    "id, video_id, user_id, duration, lang, folder, file_name, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub struct AudioRow {
    pub id: i64,
    pub video_id: i64,
    pub user_id: i64,
    pub duration: i32,
    pub lang: String,
    pub folder: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AudioRow {
    pub fn into_audio(self) -> Result<Audio, AppError> {
        let blob = pointer_from_columns("audios", self.id, self.folder, self.file_name)?;
        Ok(Audio {
            id: self.id,
            video_id: self.video_id,
            user_id: self.user_id,
            duration: self.duration,
            lang: self.lang,
            blob,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgAudioRepository {
    pool: PgPool,
}

impl PgAudioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_where(&self, column: &str, value: i64) -> Result<Vec<Audio>, AppError> {
        let rows: Vec<AudioRow> = sqlx::query_as::<Postgres, AudioRow>(&format!(
            "SELECT {} FROM audios WHERE {} = $1 ORDER BY id",
            AUDIO_COLUMNS, column
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AudioRow::into_audio).collect()
    }
}

#[async_trait]
impl AudioRepository for PgAudioRepository {
    #[tracing::instrument(skip(self, audio), fields(db.table = "audios", db.operation = "insert", video_id = audio.video_id))]
    async fn create(&self, audio: NewAudio) -> Result<Audio, AppError> {
        let row: AudioRow = sqlx::query_as::<Postgres, AudioRow>(&format!(
            r#"
            INSERT INTO audios (video_id, user_id, duration, lang, folder, file_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            AUDIO_COLUMNS
        ))
        .bind(audio.video_id)
        .bind(audio.user_id)
        .bind(audio.duration)
        .bind(&audio.lang)
        .bind(audio.blob.folder())
        .bind(audio.blob.file_name())
        .fetch_one(&self.pool)
        .await?;
        row.into_audio()
    }

    #[tracing::instrument(skip(self), fields(db.table = "audios", db.record_id = id))]
    async fn get_by_id(&self, id: i64) -> Result<Option<Audio>, AppError> {
        let row: Option<AudioRow> = sqlx::query_as::<Postgres, AudioRow>(&format!(
            "SELECT {} FROM audios WHERE id = $1",
            AUDIO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(AudioRow::into_audio).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "audios", db.record_id = id))]
    async fn get_by_video(&self, video_id: i64, id: i64) -> Result<Option<Audio>, AppError> {
        let row: Option<AudioRow> = sqlx::query_as::<Postgres, AudioRow>(&format!(
            "SELECT {} FROM audios WHERE id = $1 AND video_id = $2",
            AUDIO_COLUMNS
        ))
        .bind(id)
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(AudioRow::into_audio).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "audios"))]
    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Audio>, AppError> {
        self.list_where("user_id", user_id).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "audios"))]
    async fn list_by_video(&self, video_id: i64) -> Result<Vec<Audio>, AppError> {
        self.list_where("video_id", video_id).await
    }

    #[tracing::instrument(skip(self, audio), fields(db.table = "audios", db.operation = "update", db.record_id = audio.id))]
    async fn update(&self, audio: &Audio) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE audios
            SET duration = $2, lang = $3, folder = $4, file_name = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(audio.id)
        .bind(audio.duration)
        .bind(&audio.lang)
        .bind(audio.blob.folder())
        .bind(audio.blob.file_name())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "audios", db.operation = "delete", db.record_id = id))]
    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM audios WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
