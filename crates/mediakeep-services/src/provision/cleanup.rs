use mediakeep_core::models::{Audio, Transcription, User};
use mediakeep_core::AppError;
use tokio_util::sync::CancellationToken;

use super::report::{BulkReport, ItemOutcome, ItemReport};
use super::Provisioner;
use crate::resource::DeleteOutcome;

/// Problems collected while removing one provisioned user.
#[derive(Default)]
struct Tally {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl Tally {
    fn record(&mut self, result: Result<DeleteOutcome, AppError>) {
        match result {
            Ok(outcome) => {
                for blob in outcome.blobs.iter().filter(|b| b.is_failure()) {
                    self.warnings.push(format!(
                        "{} {}: blob {} not removed",
                        outcome.resource, outcome.id, blob.key
                    ));
                }
            }
            Err(e) => self.errors.push(e.to_string()),
        }
    }
}

impl Provisioner {
    /// Remove every provisioned user with the rows and blobs it owns.
    ///
    /// For each user: audio and transcription rows of each owned video, the video
    /// itself, leftover audio and transcription rows owned by the user, the avatar
    /// blob, and finally the user row. Every row goes blob first. Blob failures are
    /// warnings; a failed row delete keeps the user row so a re-run can finish it.
    #[tracing::instrument(skip(self, cancel), fields(provision.operation = "cleanup"))]
    pub async fn cleanup(&self, cancel: &CancellationToken) -> Result<BulkReport, AppError> {
        let users = self
            .users
            .list_by_email_suffix(&self.settings.email_suffix())
            .await?;
        tracing::info!(users = users.len(), "Cleaning up provisioned users");

        let report = self
            .run_bounded(
                users,
                cancel,
                |user| user.email.clone(),
                |user| self.cleanup_user(user),
            )
            .await;

        tracing::info!(
            removed = report.removed(),
            failed = report.failed(),
            cancelled = report.cancelled,
            "Cleanup finished"
        );
        Ok(report)
    }

    #[tracing::instrument(skip(self, user), fields(user_id = user.id))]
    async fn cleanup_user(&self, user: User) -> ItemReport {
        let mut tally = Tally::default();

        let videos = match self.videos.list_by_owner(user.id).await {
            Ok(videos) => videos,
            Err(e) => return ItemReport::failed(user.email, e),
        };

        for video in videos {
            self.remove_audios(self.audios.list_by_video(video.id).await, &mut tally)
                .await;
            self.remove_transcriptions(
                self.transcriptions.list_by_video(video.id).await,
                &mut tally,
            )
            .await;

            let blobs = self.cascade.delete_blobs(&video).await;
            let metadata = self.videos.delete(video.id).await;
            tally.record(self.cascade.finish("video", video.id, blobs, metadata));
        }

        // Children attached to videos of other owners.
        self.remove_audios(self.audios.list_by_owner(user.id).await, &mut tally)
            .await;
        self.remove_transcriptions(self.transcriptions.list_by_owner(user.id).await, &mut tally)
            .await;

        for blob in self.cascade.delete_blobs(&user).await {
            if blob.is_failure() {
                tally.warnings.push(format!("avatar {} not removed", blob.key));
            }
        }

        if tally.errors.is_empty() {
            match self.users.purge(user.id).await {
                Ok(_) => {
                    tracing::info!(email = %user.email, "Removed provisioned user");
                    return ItemReport::new(user.email, ItemOutcome::Removed { id: user.id })
                        .with_warnings(tally.warnings);
                }
                Err(e) => tally.errors.push(e.to_string()),
            }
        }

        tracing::warn!(errors = ?tally.errors, "Provisioned user not fully removed");
        ItemReport::failed(user.email, tally.errors.join("; ")).with_warnings(tally.warnings)
    }

    async fn remove_audios(&self, listed: Result<Vec<Audio>, AppError>, tally: &mut Tally) {
        let audios = match listed {
            Ok(audios) => audios,
            Err(e) => {
                tally.errors.push(e.to_string());
                return;
            }
        };
        for audio in audios {
            let blobs = self.cascade.delete_blobs(&audio).await;
            let metadata = self.audios.delete(audio.id).await;
            tally.record(self.cascade.finish("audio", audio.id, blobs, metadata));
        }
    }

    async fn remove_transcriptions(
        &self,
        listed: Result<Vec<Transcription>, AppError>,
        tally: &mut Tally,
    ) {
        let transcriptions = match listed {
            Ok(transcriptions) => transcriptions,
            Err(e) => {
                tally.errors.push(e.to_string());
                return;
            }
        };
        for transcription in transcriptions {
            let blobs = self.cascade.delete_blobs(&transcription).await;
            let metadata = self.transcriptions.delete(transcription.id).await;
            tally.record(self.cascade.finish(
                "transcription",
                transcription.id,
                blobs,
                metadata,
            ));
        }
    }
}
