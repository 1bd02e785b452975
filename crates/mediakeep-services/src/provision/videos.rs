use mediakeep_core::constants::{
    PROVISION_VIDEO_DESCRIPTION, THUMBNAIL_CONTENT_TYPE, VIDEO_CONTENT_TYPE,
};
use mediakeep_core::models::{BlobPointer, NewVideo, Video};
use mediakeep_core::AppError;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::report::{BulkReport, ItemOutcome, ItemReport, SkipReason};
use super::scan::{content_type_for, provision_key, title_case, SourceFile};
use super::{source_label, Provisioner};

fn pick_owner(owners: &[i64]) -> Option<i64> {
    owners.choose(&mut rand::rng()).copied()
}

impl Provisioner {
    /// One video per video file that has a frame image beside it, owned by a random
    /// provisioned user. The owner pool is read once, before any item starts.
    pub(super) async fn provision_videos(
        &self,
        files: Vec<SourceFile>,
        cancel: &CancellationToken,
    ) -> BulkReport {
        let owners = match self.provisioned_user_ids().await {
            Ok(owners) => Arc::new(owners),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load provisioned users");
                return BulkReport::new(
                    files
                        .into_iter()
                        .map(|file| ItemReport::failed(file.file_name, &e))
                        .collect(),
                );
            }
        };
        tracing::debug!(owners = owners.len(), "Loaded provisioned user snapshot");

        self.run_bounded(files, cancel, source_label, |file| {
            self.provision_video(file, owners.clone())
        })
        .await
    }

    #[tracing::instrument(skip(self, file, owners), fields(file = %file.file_name))]
    async fn provision_video(&self, file: SourceFile, owners: Arc<Vec<i64>>) -> ItemReport {
        let frame_path = file.frame_path();
        match tokio::fs::try_exists(&frame_path).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(frame = %frame_path.display(), "Frame image missing, skipping video");
                return ItemReport::skipped(file.file_name, SkipReason::MissingFrame);
            }
            Err(e) => return ItemReport::failed(file.file_name, e),
        }

        let key = provision_key(&file);
        match self.videos.get_by_provision_key(&key).await {
            Ok(Some(existing)) => {
                tracing::info!(video_id = existing.id, "Video already provisioned, skipping");
                return ItemReport::skipped(file.file_name, SkipReason::AlreadyExists);
            }
            Ok(None) => {}
            Err(e) => return ItemReport::failed(file.file_name, e),
        }

        let Some(owner) = pick_owner(&owners) else {
            tracing::warn!("No provisioned users to own the video, skipping");
            return ItemReport::skipped(file.file_name, SkipReason::NoProvisionedUsers);
        };

        let (video_data, frame_data) = match (
            tokio::fs::read(&file.path).await,
            tokio::fs::read(&frame_path).await,
        ) {
            (Ok(video), Ok(frame)) => (video, frame),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Failed to read source files");
                return ItemReport::failed(file.file_name, e);
            }
        };

        let mut video = match self
            .videos
            .create(NewVideo {
                user_id: owner,
                title: title_case(&file.stem),
                duration: self.settings.video_duration_secs,
                description: PROVISION_VIDEO_DESCRIPTION.to_string(),
                blob: BlobPointer::unset(),
                image: String::new(),
                provision_key: Some(key),
            })
            .await
        {
            Ok(video) => video,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create video");
                return ItemReport::failed(file.file_name, e);
            }
        };

        // Video and frame share one prefix so they stay recognisable as a pair.
        let prefix = Uuid::new_v4();
        let folder = self.settings.videos_folder.as_str();
        let video_name = format!("{}_{}", prefix, file.file_name);
        let frame_name = format!("{}_{}", prefix, file.frame_file_name());
        let mut uploaded: Vec<String> = Vec::with_capacity(2);

        let uploads = [
            (
                &video_name,
                content_type_for(&file.extension, VIDEO_CONTENT_TYPE),
                video_data,
            ),
            (&frame_name, THUMBNAIL_CONTENT_TYPE, frame_data),
        ];
        for (name, content_type, data) in uploads {
            if let Err(e) = self.store.upload(folder, name, content_type, data).await {
                tracing::warn!(error = %e, video_id = video.id, "Failed to upload, removing video");
                let warnings = self.discard_video(video.id, &uploaded).await;
                return ItemReport::failed(file.file_name, e).with_warnings(warnings);
            }
            uploaded.push(name.clone());
        }

        match self.link_blobs(&mut video, folder, &video_name, &frame_name).await {
            Ok(()) => {
                tracing::info!(video_id = video.id, user_id = owner, "Provisioned video");
                ItemReport::new(file.file_name, ItemOutcome::Created { id: video.id })
            }
            Err(e) => {
                tracing::warn!(error = %e, video_id = video.id, "Failed to link blobs, removing video");
                let warnings = self.discard_video(video.id, &uploaded).await;
                ItemReport::failed(file.file_name, e).with_warnings(warnings)
            }
        }
    }

    async fn link_blobs(
        &self,
        video: &mut Video,
        folder: &str,
        video_name: &str,
        frame_name: &str,
    ) -> Result<(), AppError> {
        video.blob = BlobPointer::new(folder, video_name)?;
        video.image = frame_name.to_string();
        if !self.videos.update(video).await? {
            return Err(AppError::ResourceNotFound(format!(
                "video {} not found",
                video.id
            )));
        }
        Ok(())
    }

    /// Remove uploaded blobs, then the row, so the next run retries the file.
    async fn discard_video(&self, video_id: i64, uploaded: &[String]) -> Vec<String> {
        let mut warnings = Vec::new();
        for name in uploaded {
            if let Err(e) = self.store.delete(&self.settings.videos_folder, name).await {
                warnings.push(format!("blob {} not removed: {}", name, e));
            }
        }
        if let Err(e) = self.videos.delete(video_id).await {
            tracing::error!(error = %e, video_id, "Failed to remove half-provisioned video");
            warnings.push(format!("video {} not removed: {}", video_id, e));
        }
        warnings
    }
}
