use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::blob::{AssociatedBlob, BlobKind, BlobPointer, HasBlobs};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transcription {
    pub id: i64,
    pub video_id: i64,
    pub user_id: i64,
    pub text: String,
    pub lang: String,
    pub blob: BlobPointer,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HasBlobs for Transcription {
    fn blobs(&self) -> Vec<AssociatedBlob> {
        if !self.blob.is_set() {
            return Vec::new();
        }
        vec![AssociatedBlob {
            kind: BlobKind::Transcription,
            pointer: self.blob.clone(),
        }]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewTranscription {
    pub video_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub text: String,
    #[validate(length(min = 2, max = 16))]
    pub lang: String,
    #[serde(default)]
    pub blob: BlobPointer,
}
