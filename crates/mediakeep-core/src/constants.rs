//! Shared constants.

use std::time::Duration;

/// Lifetime of every presigned upload or download URL. Not caller-configurable.
pub const PRESIGNED_URL_EXPIRY: Duration = Duration::from_secs(15 * 60);

/// Interval between existence checks while waiting for a deleted blob to disappear.
pub const BLOB_ABSENCE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Content types used when presigning downloads for each kind of blob.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";
pub const TRANSCRIPTION_CONTENT_TYPE: &str = "application/json";
pub const AVATAR_CONTENT_TYPE: &str = "image/jpeg";

/// Provisioning markers. Provisioned users are recognised by their email domain.
pub const PROVISION_LAST_NAME: &str = "Seeder";
pub const PROVISION_USERNAME_SUFFIX: &str = "_seeder";
pub const PROVISION_VIDEO_DESCRIPTION: &str = "Seeder video description";
pub const PROVISION_KEY_PREFIX: &str = "seed:";

/// A provisioned video needs `{stem}{FRAME_FILE_SUFFIX}` next to it.
pub const FRAME_FILE_SUFFIX: &str = "_thumbnail.jpg";

pub const AVATAR_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];
