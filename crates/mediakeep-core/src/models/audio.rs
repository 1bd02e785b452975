use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::blob::{AssociatedBlob, BlobKind, BlobPointer, HasBlobs};

/// An audio track of a video. Several tracks may share one video and language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Audio {
    pub id: i64,
    pub video_id: i64,
    pub user_id: i64,
    /// Seconds
    pub duration: i32,
    pub lang: String,
    pub blob: BlobPointer,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HasBlobs for Audio {
    fn blobs(&self) -> Vec<AssociatedBlob> {
        if !self.blob.is_set() {
            return Vec::new();
        }
        vec![AssociatedBlob {
            kind: BlobKind::Audio,
            pointer: self.blob.clone(),
        }]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAudio {
    pub video_id: i64,
    pub user_id: i64,
    #[validate(range(min = 1))]
    pub duration: i32,
    #[validate(length(min = 2, max = 16))]
    pub lang: String,
    #[serde(default)]
    pub blob: BlobPointer,
}
