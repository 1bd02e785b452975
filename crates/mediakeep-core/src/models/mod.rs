pub mod audio;
pub mod blob;
pub mod transcription;
pub mod user;
pub mod video;

pub use audio::{Audio, NewAudio};
pub use blob::{AssociatedBlob, BlobKind, BlobPointer, HasBlobs};
pub use transcription::{NewTranscription, Transcription};
pub use user::{NewUser, User, UserStatus};
pub use video::{NewVideo, Video, VideoStatus};
