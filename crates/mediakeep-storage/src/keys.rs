//! Shared object key construction.

use crate::traits::{StorageError, StorageResult};

/// Build the object key for a `(folder, file_name)` pair.
///
/// `folder/file_name` when the folder is non-empty, otherwise `file_name`.
pub fn object_key(folder: &str, file_name: &str) -> StorageResult<String> {
    if file_name.is_empty() {
        return Err(StorageError::InvalidKey("file name is empty".to_string()));
    }
    if folder.is_empty() {
        Ok(file_name.to_string())
    } else {
        Ok(format!("{}/{}", folder, file_name))
    }
}
