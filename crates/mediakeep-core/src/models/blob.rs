use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::constants::{
    AUDIO_CONTENT_TYPE, AVATAR_CONTENT_TYPE, THUMBNAIL_CONTENT_TYPE, TRANSCRIPTION_CONTENT_TYPE,
    VIDEO_CONTENT_TYPE,
};
use crate::error::AppError;

/// Location of a binary object in the blob store.
///
/// Either both parts are empty (unset) or both are non-empty (set). The pair is
/// the only handle used to address the blob store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBlobPointer")]
pub struct BlobPointer {
    folder: String,
    file_name: String,
}

/// Wire shape of [`BlobPointer`]; deserialization goes through `BlobPointer::new`.
#[derive(Deserialize)]
struct RawBlobPointer {
    #[serde(default)]
    folder: String,
    #[serde(default)]
    file_name: String,
}

impl TryFrom<RawBlobPointer> for BlobPointer {
    type Error = AppError;

    fn try_from(raw: RawBlobPointer) -> Result<Self, Self::Error> {
        BlobPointer::new(raw.folder, raw.file_name)
    }
}

impl BlobPointer {
    pub fn new(folder: impl Into<String>, file_name: impl Into<String>) -> Result<Self, AppError> {
        let folder = folder.into();
        let file_name = file_name.into();
        if folder.is_empty() != file_name.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "blob pointer must set both folder and file name or neither (folder={:?}, file_name={:?})",
                folder, file_name
            )));
        }
        Ok(Self { folder, file_name })
    }

    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        !self.file_name.is_empty()
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Display for BlobPointer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.is_set() {
            write!(f, "{}/{}", self.folder, self.file_name)
        } else {
            write!(f, "<unset>")
        }
    }
}

/// Role a blob plays for the entity that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobKind {
    Video,
    Thumbnail,
    Audio,
    Transcription,
    Avatar,
}

impl BlobKind {
    /// Content type bound into download URLs for this kind of blob.
    pub fn content_type(self) -> &'static str {
        match self {
            BlobKind::Video => VIDEO_CONTENT_TYPE,
            BlobKind::Thumbnail => THUMBNAIL_CONTENT_TYPE,
            BlobKind::Audio => AUDIO_CONTENT_TYPE,
            BlobKind::Transcription => TRANSCRIPTION_CONTENT_TYPE,
            BlobKind::Avatar => AVATAR_CONTENT_TYPE,
        }
    }
}

impl Display for BlobKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BlobKind::Video => write!(f, "video"),
            BlobKind::Thumbnail => write!(f, "thumbnail"),
            BlobKind::Audio => write!(f, "audio"),
            BlobKind::Transcription => write!(f, "transcription"),
            BlobKind::Avatar => write!(f, "avatar"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociatedBlob {
    pub kind: BlobKind,
    pub pointer: BlobPointer,
}

/// Implemented by every entity that references blobs. Only set pointers are returned.
pub trait HasBlobs {
    fn blobs(&self) -> Vec<AssociatedBlob>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_half_set_pointer() {
        assert!(BlobPointer::new("videos", "").is_err());
        assert!(BlobPointer::new("", "clip.mp4").is_err());
    }

    #[test]
    fn deserializing_enforces_both_or_neither() {
        let half: Result<BlobPointer, _> =
            serde_json::from_str(r#"{"folder":"videos","file_name":""}"#);
        assert!(half.is_err());

        let set: BlobPointer =
            serde_json::from_str(r#"{"folder":"videos","file_name":"clip.mp4"}"#).unwrap();
        assert_eq!(set, BlobPointer::new("videos", "clip.mp4").unwrap());

        let empty: BlobPointer = serde_json::from_str("{}").unwrap();
        assert!(!empty.is_set());
    }

    #[test]
    fn set_and_unset() {
        let pointer = BlobPointer::new("videos", "clip.mp4").unwrap();
        assert!(pointer.is_set());
        assert_eq!(pointer.to_string(), "videos/clip.mp4");

        let empty = BlobPointer::new("", "").unwrap();
        assert!(!empty.is_set());
        assert_eq!(empty, BlobPointer::unset());
    }

    #[test]
    fn content_types_per_kind() {
        assert_eq!(BlobKind::Audio.content_type(), "audio/mpeg");
        assert_eq!(BlobKind::Transcription.content_type(), "application/json");
        assert_eq!(BlobKind::Avatar.content_type(), "image/jpeg");
    }
}
