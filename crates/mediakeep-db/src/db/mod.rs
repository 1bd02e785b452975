pub mod audio;
pub mod pool;
pub mod transcription;
pub mod user;
pub mod video;

pub use audio::PgAudioRepository;
pub use transcription::PgTranscriptionRepository;
pub use user::PgUserRepository;
pub use video::PgVideoRepository;

use mediakeep_core::models::BlobPointer;
use mediakeep_core::AppError;

/// Rebuild a pointer from its two columns, rejecting half-set rows.
pub(crate) fn pointer_from_columns(
    table: &'static str,
    id: i64,
    folder: String,
    file_name: String,
) -> Result<BlobPointer, AppError> {
    BlobPointer::new(folder, file_name).map_err(|e| {
        tracing::error!(db.table = table, db.record_id = id, error = %e, "Row holds a half-set blob pointer");
        AppError::Internal(format!("{} {} has an inconsistent blob pointer", table, id))
    })
}
