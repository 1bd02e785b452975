//! Bulk provisioning and cleanup
//!
//! `provision` turns local directories into paired rows and blobs: one user per
//! avatar image, then one video per video file that has a frame image next to it.
//! `cleanup` is the inverse and removes everything tagged with the provisioning
//! email domain. Both are best-effort per item, safe to re-run, and return a
//! report with one entry per item instead of failing the batch.
//!
//! Items are processed through a bounded stream (`ProvisionSettings::concurrency`).
//! The steps of one item always run in order, so the blob-before-row delete order
//! holds per item at any concurrency.

mod cleanup;
pub mod report;
pub mod scan;
mod users;
mod videos;

pub use report::{BulkReport, ItemOutcome, ItemReport, ProvisionReport, SkipReason};

use futures::stream::{self, StreamExt};
use mediakeep_core::constants::{AVATAR_EXTENSIONS, VIDEO_EXTENSIONS};
use mediakeep_core::{AppError, DeleteSettings, ProvisionSettings};
use mediakeep_db::{AudioRepository, TranscriptionRepository, UserRepository, VideoRepository};
use mediakeep_storage::BlobStore;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::resource::CascadeDeleter;
use scan::{scan_dir, SourceFile};

/// Directories to provision from. A pass whose directory is `None` is skipped.
#[derive(Debug, Clone, Default)]
pub struct ProvisionSources {
    pub avatar_dir: Option<PathBuf>,
    pub video_dir: Option<PathBuf>,
}

#[derive(Clone)]
pub struct Provisioner {
    users: Arc<dyn UserRepository>,
    videos: Arc<dyn VideoRepository>,
    audios: Arc<dyn AudioRepository>,
    transcriptions: Arc<dyn TranscriptionRepository>,
    store: Arc<dyn BlobStore>,
    settings: ProvisionSettings,
    cascade: CascadeDeleter,
}

impl Provisioner {
    pub fn new(
        users: Arc<dyn UserRepository>,
        videos: Arc<dyn VideoRepository>,
        audios: Arc<dyn AudioRepository>,
        transcriptions: Arc<dyn TranscriptionRepository>,
        store: Arc<dyn BlobStore>,
        settings: ProvisionSettings,
        delete: DeleteSettings,
    ) -> Self {
        Self {
            users,
            videos,
            audios,
            transcriptions,
            cascade: CascadeDeleter::new(store.clone(), delete),
            store,
            settings,
        }
    }

    /// Run the users pass, then the videos pass.
    ///
    /// Both directories are scanned before anything is created, so an unreadable
    /// directory fails the call without side effects.
    #[tracing::instrument(skip(self, sources, cancel), fields(provision.operation = "provision"))]
    pub async fn provision(
        &self,
        sources: &ProvisionSources,
        cancel: &CancellationToken,
    ) -> Result<ProvisionReport, AppError> {
        let avatars = match &sources.avatar_dir {
            Some(dir) => Some(scan_dir(dir, AVATAR_EXTENSIONS).await?),
            None => None,
        };
        let videos = match &sources.video_dir {
            Some(dir) => Some(scan_dir(dir, VIDEO_EXTENSIONS).await?),
            None => None,
        };

        let mut report = ProvisionReport::default();
        if let Some(files) = avatars {
            report.users = self.provision_users(files, cancel).await;
        }
        if let Some(files) = videos {
            report.videos = self.provision_videos(files, cancel).await;
        }

        tracing::info!(
            users_created = report.users.created(),
            users_failed = report.users.failed(),
            videos_created = report.videos.created(),
            videos_skipped = report.videos.skipped(),
            videos_failed = report.videos.failed(),
            cancelled = report.cancelled(),
            "Provisioning finished"
        );
        Ok(report)
    }

    /// Ids of provisioned users that are not soft-deleted, in id order.
    async fn provisioned_user_ids(&self) -> Result<Vec<i64>, AppError> {
        let users = self
            .users
            .list_by_email_suffix(&self.settings.email_suffix())
            .await?;
        Ok(users
            .into_iter()
            .filter(|u| !u.is_deleted())
            .map(|u| u.id)
            .collect())
    }

    /// Process `items` with at most `concurrency` in flight and return the reports in
    /// input order. Items not yet started when `cancel` fires are reported as
    /// cancelled.
    async fn run_bounded<T, F, Fut>(
        &self,
        items: Vec<T>,
        cancel: &CancellationToken,
        label: impl Fn(&T) -> String,
        process: F,
    ) -> BulkReport
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = ItemReport>,
    {
        let mut reports: Vec<(usize, ItemReport)> = stream::iter(items.into_iter().enumerate())
            .map(|(index, item)| {
                let name = label(&item);
                let work = if cancel.is_cancelled() {
                    None
                } else {
                    Some(process(item))
                };
                async move {
                    match work {
                        Some(work) => (index, work.await),
                        None => (index, ItemReport::skipped(name, SkipReason::Cancelled)),
                    }
                }
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        reports.sort_by_key(|(index, _)| *index);
        BulkReport::new(reports.into_iter().map(|(_, report)| report).collect())
    }
}

fn source_label(file: &SourceFile) -> String {
    file.file_name.clone()
}
