//! Mediakeep service layer
//!
//! Coordinates the metadata store and the blob store: presigned access, the
//! cascading blob-then-metadata delete, the video status state machine, and bulk
//! provisioning and cleanup. Services depend only on the repository and
//! [`BlobStore`](mediakeep_storage::BlobStore) traits; the concrete backends are
//! chosen by the caller.

pub mod provision;
pub mod resource;
pub mod status;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use provision::{
    BulkReport, ItemOutcome, ItemReport, ProvisionReport, ProvisionSources, Provisioner,
    SkipReason,
};
pub use resource::{
    issue_upload_url, AudioService, AvatarService, BlobDeleteResult, BlobDeletion,
    CascadeDeleter, DeleteOutcome, ResourceAccess, SignedBlob, TranscriptionService,
    UploadUrlRequest, VideoService,
};
pub use status::VideoStatusService;
