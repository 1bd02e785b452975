use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use validator::Validate;

use super::blob::{AssociatedBlob, BlobKind, BlobPointer, HasBlobs};
use crate::error::AppError;

/// Processing status of a video.
///
/// Any status may be set from any other; only values outside the four states are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "video_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    #[default]
    Raw,
    Processing,
    Failed,
    Success,
}

impl VideoStatus {
    pub const ALL: [VideoStatus; 4] = [
        VideoStatus::Raw,
        VideoStatus::Processing,
        VideoStatus::Failed,
        VideoStatus::Success,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VideoStatus::Raw => "raw",
            VideoStatus::Processing => "processing",
            VideoStatus::Failed => "failed",
            VideoStatus::Success => "success",
        }
    }

    /// `success` and `failed` end a processing run, but an explicit update may restart it.
    pub fn is_settled(self) -> bool {
        matches!(self, VideoStatus::Success | VideoStatus::Failed)
    }
}

impl FromStr for VideoStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(VideoStatus::Raw),
            "processing" => Ok(VideoStatus::Processing),
            "failed" => Ok(VideoStatus::Failed),
            "success" => Ok(VideoStatus::Success),
            other => Err(AppError::InvalidStatus(other.to_string())),
        }
    }
}

impl Display for VideoStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    /// Seconds
    pub duration: i32,
    pub description: String,
    /// Media blob. The thumbnail shares its folder.
    pub blob: BlobPointer,
    /// Thumbnail file name, empty when there is none.
    pub image: String,
    pub status: VideoStatus,
    /// Natural key of provisioned videos, `None` for user uploads.
    pub provision_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Pointer to the thumbnail blob, if the video has both a folder and an image.
    pub fn thumbnail(&self) -> Option<BlobPointer> {
        if self.image.is_empty() || self.blob.folder().is_empty() {
            return None;
        }
        BlobPointer::new(self.blob.folder(), self.image.clone()).ok()
    }
}

impl HasBlobs for Video {
    fn blobs(&self) -> Vec<AssociatedBlob> {
        let mut blobs = Vec::with_capacity(2);
        if self.blob.is_set() {
            blobs.push(AssociatedBlob {
                kind: BlobKind::Video,
                pointer: self.blob.clone(),
            });
        }
        if let Some(pointer) = self.thumbnail() {
            blobs.push(AssociatedBlob {
                kind: BlobKind::Thumbnail,
                pointer,
            });
        }
        blobs
    }
}

/// Input for creating a video row. New videos always start as `raw`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewVideo {
    pub user_id: i64,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(range(min = 1))]
    pub duration: i32,
    #[validate(length(max = 5000))]
    pub description: String,
    #[serde(default)]
    pub blob: BlobPointer,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub provision_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(folder: &str, file_name: &str, image: &str) -> Video {
        Video {
            id: 1,
            user_id: 2,
            title: "Clip".to_string(),
            duration: 120,
            description: String::new(),
            blob: BlobPointer::new(folder, file_name).unwrap(),
            image: image.to_string(),
            status: VideoStatus::Raw,
            provision_key: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn status_parse_is_closed_over_four_values() {
        for status in VideoStatus::ALL {
            assert_eq!(status.as_str().parse::<VideoStatus>().unwrap(), status);
        }
        assert!(matches!(
            "done".parse::<VideoStatus>(),
            Err(AppError::InvalidStatus(_))
        ));
        assert!("Processing".parse::<VideoStatus>().is_err());
        assert!("".parse::<VideoStatus>().is_err());
    }

    #[test]
    fn video_yields_media_and_thumbnail() {
        let blobs = video("videos", "a.mp4", "a.jpg").blobs();
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].kind, BlobKind::Video);
        assert_eq!(blobs[1].kind, BlobKind::Thumbnail);
        assert_eq!(blobs[1].pointer.folder(), "videos");
        assert_eq!(blobs[1].pointer.file_name(), "a.jpg");
    }

    #[test]
    fn unset_video_yields_no_blobs() {
        assert!(video("", "", "").blobs().is_empty());
        assert!(video("", "", "orphan.jpg").blobs().is_empty());
    }

    #[test]
    fn new_video_validation() {
        let mut input = NewVideo {
            user_id: 1,
            title: "Clip".to_string(),
            duration: 0,
            description: String::new(),
            blob: BlobPointer::unset(),
            image: String::new(),
            provision_key: None,
        };
        assert!(input.validate().is_err());
        input.duration = 10;
        assert!(input.validate().is_ok());
        input.title.clear();
        assert!(input.validate().is_err());
    }

    #[test]
    fn new_video_rejects_half_set_blob_on_the_wire() {
        let body = r#"{
            "user_id": 1,
            "title": "Clip",
            "duration": 10,
            "description": "",
            "blob": {"folder": "videos", "file_name": ""}
        }"#;
        assert!(serde_json::from_str::<NewVideo>(body).is_err());

        let unset = r#"{"user_id": 1, "title": "Clip", "duration": 10, "description": ""}"#;
        let input: NewVideo = serde_json::from_str(unset).unwrap();
        assert!(!input.blob.is_set());
    }
}
