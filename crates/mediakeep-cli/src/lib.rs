//! Wiring shared by the `mediakeep` binary.

use anyhow::Context;
use mediakeep_core::{AppError, Config, DeleteSettings, ErrorMetadata, LogLevel, ProvisionSettings};
use mediakeep_db::{
    AudioRepository, PgAudioRepository, PgTranscriptionRepository, PgUserRepository,
    PgVideoRepository, TranscriptionRepository, UserRepository, VideoRepository,
};
use mediakeep_services::{
    AudioService, AvatarService, Provisioner, TranscriptionService, VideoService,
    VideoStatusService,
};
use mediakeep_storage::BlobStore;
use serde::Serialize;
use std::sync::Arc;

/// Initialize tracing for the CLI. `RUST_LOG` wins over the default `info` level.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// JSON printed when a command fails with an [`AppError`].
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: &'static str,
    pub error_type: &'static str,
    pub message: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<&'static str>,
    /// Full error chain; withheld for sensitive errors in production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorReport {
    pub fn new(err: &AppError, production: bool) -> Self {
        let details = if production && err.is_sensitive() {
            None
        } else {
            Some(err.detailed_message())
        };
        Self {
            error: err.error_code(),
            error_type: err.error_type(),
            message: err.client_message(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            details,
        }
    }
}

/// Log a failed command at the level the error asks for.
pub fn log_error(err: &AppError) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %err, code = err.error_code(), "Command failed"),
        LogLevel::Warn => tracing::warn!(error = %err, code = err.error_code(), "Command failed"),
        LogLevel::Error => tracing::error!(error = %err, code = err.error_code(), "Command failed"),
    }
}

/// Process exit code for a failed command. Caller errors, missing resources and
/// retryable failures get distinct codes (sysexits `EX_USAGE`, `EX_NOINPUT`,
/// `EX_TEMPFAIL`) so scripts can decide whether to retry.
pub fn exit_code(err: &AppError) -> u8 {
    match err.http_status_code() {
        400 => 64,
        404 => 66,
        _ if err.is_recoverable() => 75,
        _ => 1,
    }
}

/// Resources a CLI command can address by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ResourceKind {
    Video,
    Audio,
    Transcription,
    /// A user's avatar; the id is the user id.
    Avatar,
}

/// Every service, sharing one set of repositories and one blob store.
pub struct Services {
    pub videos: VideoService,
    pub audios: AudioService,
    pub transcriptions: TranscriptionService,
    pub avatars: AvatarService,
    pub status: VideoStatusService,
    pub provisioner: Provisioner,
}

impl Services {
    pub fn from_parts(
        users: Arc<dyn UserRepository>,
        videos: Arc<dyn VideoRepository>,
        audios: Arc<dyn AudioRepository>,
        transcriptions: Arc<dyn TranscriptionRepository>,
        store: Arc<dyn BlobStore>,
        provision: ProvisionSettings,
        delete: DeleteSettings,
    ) -> Self {
        Self {
            videos: VideoService::new(videos.clone(), store.clone(), delete.clone()),
            audios: AudioService::new(audios.clone(), store.clone(), delete.clone()),
            transcriptions: TranscriptionService::new(
                transcriptions.clone(),
                store.clone(),
                delete.clone(),
            ),
            avatars: AvatarService::new(users.clone(), store.clone(), delete.clone()),
            status: VideoStatusService::new(videos.clone()),
            provisioner: Provisioner::new(
                users,
                videos,
                audios,
                transcriptions,
                store,
                provision,
                delete,
            ),
        }
    }

    /// Connect to Postgres and the configured blob store, applying migrations first.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let pool = mediakeep_db::connect(config)
            .await
            .context("Connect to database")?;
        mediakeep_db::run_migrations(&pool).await?;
        let store = mediakeep_storage::create_blob_store(config)
            .await
            .context("Create blob store")?;

        Ok(Self::from_parts(
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgVideoRepository::new(pool.clone())),
            Arc::new(PgAudioRepository::new(pool.clone())),
            Arc::new(PgTranscriptionRepository::new(pool)),
            store,
            config.provision_settings().clone(),
            config.delete_settings().clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;
    use mediakeep_core::models::{BlobPointer, NewVideo};
    use mediakeep_services::test_helpers::TestContext;

    fn services(ctx: &TestContext) -> Services {
        Services::from_parts(
            ctx.users.clone(),
            ctx.videos.clone(),
            ctx.audios.clone(),
            ctx.transcriptions.clone(),
            ctx.store.clone(),
            ctx.provision.clone(),
            ctx.delete.clone(),
        )
    }

    #[test]
    fn error_report_carries_code_and_retry_hint() {
        let err = AppError::StoreUnavailable("connection reset by peer".to_string());

        let report = ErrorReport::new(&err, false);
        assert_eq!(report.error, "STORE_UNAVAILABLE");
        assert_eq!(report.error_type, "StoreUnavailable");
        assert!(report.recoverable);
        assert!(report.details.unwrap().contains("connection reset"));

        let production = ErrorReport::new(&err, true);
        assert_eq!(production.message, "Blob store is temporarily unavailable");
        assert!(production.details.is_none());
    }

    #[test]
    fn exit_codes_follow_error_taxonomy() {
        assert_eq!(exit_code(&AppError::ResourceNotFound("video 42".into())), 66);
        assert_eq!(exit_code(&AppError::InvalidStatus("done".into())), 64);
        assert_eq!(exit_code(&AppError::InvalidKey("empty".into())), 64);
        assert_eq!(exit_code(&AppError::StoreUnavailable("down".into())), 75);
        assert_eq!(
            exit_code(&AppError::MetadataDeleteFailed {
                resource: "video",
                id: 7,
                reason: "fk".into(),
            }),
            1
        );
    }

    #[test]
    fn resource_kind_parses_lowercase_names() {
        assert_eq!(
            ResourceKind::from_str("transcription", true).unwrap(),
            ResourceKind::Transcription
        );
        assert_eq!(
            ResourceKind::from_str("avatar", true).unwrap(),
            ResourceKind::Avatar
        );
        assert!(ResourceKind::from_str("image", true).is_err());
    }

    #[tokio::test]
    async fn services_share_repositories() {
        let ctx = TestContext::new();
        let services = services(&ctx);

        let video = services
            .videos
            .create(NewVideo {
                user_id: 1,
                title: "Demo".to_string(),
                duration: 10,
                description: String::new(),
                blob: BlobPointer::new("videos", "demo.mp4").unwrap(),
                image: String::new(),
                provision_key: None,
            })
            .await
            .unwrap();

        let status = services
            .status
            .update_status(video.id, "processing")
            .await
            .unwrap();
        assert_eq!(services.status.get_status(video.id).await.unwrap(), status);

        services.videos.delete(video.id).await.unwrap();
        assert!(services.status.get_status(video.id).await.is_err());
    }
}
