//! Transcription repository: CRUD for the transcriptions table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediakeep_core::models::{NewTranscription, Transcription};
use mediakeep_core::AppError;
use sqlx::{PgPool, Postgres};

use super::pointer_from_columns;
use crate::repository::TranscriptionRepository;

const TRANSCRIPTION_COLUMNS: &str =
    "id, video_id, user_id, text, lang, folder, file_name, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub struct TranscriptionRow {
    pub id: i64,
    pub video_id: i64,
    pub user_id: i64,
    pub text: String,
    pub lang: String,
    pub folder: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TranscriptionRow {
    pub fn into_transcription(self) -> Result<Transcription, AppError> {
        let blob = pointer_from_columns("transcriptions", self.id, self.folder, self.file_name)?;
        Ok(Transcription {
            id: self.id,
            video_id: self.video_id,
            user_id: self.user_id,
            text: self.text,
            lang: self.lang,
            blob,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgTranscriptionRepository {
    pool: PgPool,
}

impl PgTranscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_where(&self, column: &str, value: i64) -> Result<Vec<Transcription>, AppError> {
        let rows: Vec<TranscriptionRow> = sqlx::query_as::<Postgres, TranscriptionRow>(&format!(
            "SELECT {} FROM transcriptions WHERE {} = $1 ORDER BY id",
            TRANSCRIPTION_COLUMNS, column
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(TranscriptionRow::into_transcription)
            .collect()
    }
}

#[async_trait]
impl TranscriptionRepository for PgTranscriptionRepository {
    #[tracing::instrument(skip(self, transcription), fields(db.table = "transcriptions", db.operation = "insert", video_id = transcription.video_id))]
    async fn create(&self, transcription: NewTranscription) -> Result<Transcription, AppError> {
        let row: TranscriptionRow = sqlx::query_as::<Postgres, TranscriptionRow>(&format!(
            r#"
            INSERT INTO transcriptions (video_id, user_id, text, lang, folder, file_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TRANSCRIPTION_COLUMNS
        ))
        .bind(transcription.video_id)
        .bind(transcription.user_id)
        .bind(&transcription.text)
        .bind(&transcription.lang)
        .bind(transcription.blob.folder())
        .bind(transcription.blob.file_name())
        .fetch_one(&self.pool)
        .await?;
        row.into_transcription()
    }

    #[tracing::instrument(skip(self), fields(db.table = "transcriptions", db.record_id = id))]
    async fn get_by_id(&self, id: i64) -> Result<Option<Transcription>, AppError> {
        let row: Option<TranscriptionRow> = sqlx::query_as::<Postgres, TranscriptionRow>(
            &format!(
                "SELECT {} FROM transcriptions WHERE id = $1",
                TRANSCRIPTION_COLUMNS
            ),
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TranscriptionRow::into_transcription).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "transcriptions", db.record_id = id))]
    async fn get_by_video(
        &self,
        video_id: i64,
        id: i64,
    ) -> Result<Option<Transcription>, AppError> {
        let row: Option<TranscriptionRow> = sqlx::query_as::<Postgres, TranscriptionRow>(
            &format!(
                "SELECT {} FROM transcriptions WHERE id = $1 AND video_id = $2",
                TRANSCRIPTION_COLUMNS
            ),
        )
        .bind(id)
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TranscriptionRow::into_transcription).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "transcriptions"))]
    async fn list_by_owner(&self, user_id: i64) -> Result<Vec<Transcription>, AppError> {
        self.list_where("user_id", user_id).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "transcriptions"))]
    async fn list_by_video(&self, video_id: i64) -> Result<Vec<Transcription>, AppError> {
        self.list_where("video_id", video_id).await
    }

    #[tracing::instrument(skip(self, transcription), fields(db.table = "transcriptions", db.operation = "update", db.record_id = transcription.id))]
    async fn update(&self, transcription: &Transcription) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE transcriptions
            SET text = $2, lang = $3, folder = $4, file_name = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(transcription.id)
        .bind(&transcription.text)
        .bind(&transcription.lang)
        .bind(transcription.blob.folder())
        .bind(transcription.blob.file_name())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "transcriptions", db.operation = "delete", db.record_id = id))]
    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM transcriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
