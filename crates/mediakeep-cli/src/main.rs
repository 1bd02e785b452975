//! Mediakeep CLI: signed access, cascading deletes, video status and bulk provisioning.
//!
//! Reads the same environment as the services (DATABASE_URL, STORAGE_BACKEND, S3_* or
//! LOCAL_STORAGE_*, PROVISION_*). Results are printed as JSON on stdout; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use mediakeep_cli::{exit_code, init_tracing, log_error, ErrorReport, ResourceKind, Services};
use mediakeep_core::{AppError, Config};
use mediakeep_services::{ProvisionSources, UploadUrlRequest};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "mediakeep", about = "Media resource consistency and signed access")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create users from avatar images, then videos from video files with a frame image
    Provision {
        /// Directory of avatar images (one user per image)
        #[arg(long)]
        avatars: Option<PathBuf>,
        /// Directory of video files, each with a `{stem}_thumbnail.jpg` frame beside it
        #[arg(long)]
        videos: Option<PathBuf>,
    },
    /// Remove every provisioned user with its videos, audios, transcriptions and blobs
    Cleanup,
    /// Issue a presigned upload URL
    UploadUrl {
        folder: String,
        file_name: String,
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },
    /// Issue a presigned download URL for a resource's primary blob
    DownloadUrl {
        #[arg(value_enum)]
        kind: ResourceKind,
        id: i64,
    },
    /// Show a resource with download URLs for each of its blobs
    Get {
        #[arg(value_enum)]
        kind: ResourceKind,
        id: i64,
    },
    /// Delete a resource's blobs, then its metadata
    Delete {
        #[arg(value_enum)]
        kind: ResourceKind,
        id: i64,
    },
    /// Point a user at an uploaded avatar
    SetAvatar {
        user_id: i64,
        folder: String,
        file_name: String,
    },
    /// Mark a user deleted (soft delete)
    DeleteUser { user_id: i64 },
    /// Video status operations
    Status {
        #[command(subcommand)]
        sub: StatusCommands,
    },
}

#[derive(Subcommand)]
enum StatusCommands {
    /// Current status of a video
    Get { id: i64 },
    /// Set the status: raw, processing, failed or success
    Set { id: i64, status: String },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Cancelled on Ctrl-C so bulk runs stop starting new items.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight items");
            child.cancel();
        }
    });
    token
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Load configuration")?;
    init_tracing(config.log_json());
    config.validate()?;

    match run(cli.command, &config).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => match e.downcast_ref::<AppError>() {
            Some(err) => {
                log_error(err);
                print_json(&ErrorReport::new(err, config.is_production()))?;
                Ok(ExitCode::from(exit_code(err)))
            }
            None => Err(e),
        },
    }
}

async fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    let services = Services::connect(config).await?;

    match command {
        Commands::Provision { avatars, videos } => {
            if avatars.is_none() && videos.is_none() {
                anyhow::bail!("Nothing to provision: pass --avatars and/or --videos");
            }
            let sources = ProvisionSources {
                avatar_dir: avatars,
                video_dir: videos,
            };
            let report = services
                .provisioner
                .provision(&sources, &shutdown_token())
                .await?;
            print_json(&report)?;
        }
        Commands::Cleanup => {
            let report = services.provisioner.cleanup(&shutdown_token()).await?;
            print_json(&report)?;
            if !report.is_clean() {
                anyhow::bail!("{} provisioned users not fully removed", report.failed());
            }
        }
        Commands::UploadUrl {
            folder,
            file_name,
            content_type,
        } => {
            let request = UploadUrlRequest {
                folder,
                file_name,
                content_type,
            };
            // Any service signs against the same store.
            let url = services.videos.upload_url(&request).await?;
            print_json(&serde_json::json!({ "url": url }))?;
        }
        Commands::DownloadUrl { kind, id } => {
            let signed = match kind {
                ResourceKind::Video => services.videos.download_url(id).await?,
                ResourceKind::Audio => services.audios.download_url(id).await?,
                ResourceKind::Transcription => services.transcriptions.download_url(id).await?,
                ResourceKind::Avatar => services.avatars.download_url(id).await?,
            };
            print_json(&signed)?;
        }
        Commands::Get { kind, id } => match kind {
            ResourceKind::Video => print_json(&services.videos.get(id).await?)?,
            ResourceKind::Audio => print_json(&services.audios.get(id).await?)?,
            ResourceKind::Transcription => print_json(&services.transcriptions.get(id).await?)?,
            ResourceKind::Avatar => print_json(&services.avatars.get(id).await?)?,
        },
        Commands::Delete { kind, id } => match kind {
            ResourceKind::Video => print_json(&services.videos.delete(id).await?)?,
            ResourceKind::Audio => print_json(&services.audios.delete(id).await?)?,
            ResourceKind::Transcription => {
                print_json(&services.transcriptions.delete(id).await?)?
            }
            ResourceKind::Avatar => print_json(&services.avatars.delete_avatar(id).await?)?,
        },
        Commands::SetAvatar {
            user_id,
            folder,
            file_name,
        } => {
            let user = services
                .avatars
                .set_avatar(user_id, &folder, &file_name)
                .await?;
            print_json(&user)?;
        }
        Commands::DeleteUser { user_id } => {
            services.avatars.delete_user(user_id).await?;
            print_json(&serde_json::json!({ "user_id": user_id, "status": "deleted" }))?;
        }
        Commands::Status { sub } => match sub {
            StatusCommands::Get { id } => {
                let status = services.status.get_status(id).await?;
                print_json(&serde_json::json!({ "video_id": id, "status": status }))?;
            }
            StatusCommands::Set { id, status } => {
                let status = services.status.update_status(id, &status).await?;
                print_json(&serde_json::json!({ "video_id": id, "status": status }))?;
            }
        },
    }

    Ok(())
}
