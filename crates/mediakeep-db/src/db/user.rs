//! User repository. `delete` is a status change; `purge` removes the row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediakeep_core::models::{BlobPointer, NewUser, User, UserStatus};
use mediakeep_core::AppError;
use sqlx::{PgPool, Postgres};

use super::pointer_from_columns;
use crate::repository::UserRepository;

const USER_COLUMNS: &str = "id, first_name, last_name, username, email, password_hash, status, avatar_folder, avatar, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub status: UserStatus,
    pub avatar_folder: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_user(self) -> Result<User, AppError> {
        let avatar = pointer_from_columns("users", self.id, self.avatar_folder, self.avatar)?;
        Ok(User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            status: self.status,
            avatar,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[tracing::instrument(skip(self, user), fields(db.table = "users", db.operation = "insert", email = %user.email))]
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let row: UserRow = sqlx::query_as::<Postgres, UserRow>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, username, email, password_hash, status, avatar_folder, avatar)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(UserStatus::Available)
        .bind(user.avatar.folder())
        .bind(user.avatar.file_name())
        .fetch_one(&self.pool)
        .await?;
        row.into_user()
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.record_id = id))]
    async fn get_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> = sqlx::query_as::<Postgres, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "users"))]
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> = sqlx::query_as::<Postgres, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "users"))]
    async fn list_by_email_suffix(&self, suffix: &str) -> Result<Vec<User>, AppError> {
        // Escape LIKE metacharacters so the suffix matches literally.
        let pattern = format!(
            "%{}",
            suffix
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_")
        );
        let rows: Vec<UserRow> = sqlx::query_as::<Postgres, UserRow>(&format!(
            "SELECT {} FROM users WHERE email LIKE $1 ORDER BY id",
            USER_COLUMNS
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(UserRow::into_user).collect()
    }

    #[tracing::instrument(skip(self, user), fields(db.table = "users", db.operation = "update", db.record_id = user.id))]
    async fn update(&self, user: &User) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, username = $4, avatar_folder = $5, avatar = $6,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(user.avatar.folder())
        .bind(user.avatar.file_name())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, avatar), fields(db.table = "users", db.operation = "update_avatar", db.record_id = id, avatar = %avatar))]
    async fn update_avatar(&self, id: i64, avatar: &BlobPointer) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET avatar_folder = $2, avatar = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(avatar.folder())
        .bind(avatar.file_name())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "soft_delete", db.record_id = id))]
    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(UserStatus::Deleted)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "delete", db.record_id = id))]
    async fn purge(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
