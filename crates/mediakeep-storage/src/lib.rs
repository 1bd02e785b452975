//! Mediakeep Storage Library
//!
//! Blob store abstraction with S3 and local filesystem implementations.
//!
//! # Object key format
//!
//! Every backend addresses an object as `{folder}/{file_name}`, or just `{file_name}`
//! when the folder is empty. An empty file name is rejected. Key construction lives
//! in the [`keys`] module and every caller must go through it, so presigned uploads,
//! presigned downloads, direct uploads and deletes for the same pair always hit the
//! same object.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_blob_store;
pub use keys::object_key;
#[cfg(feature = "storage-local")]
pub use local::LocalBlobStore;
pub use mediakeep_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3BlobStore;
pub use traits::{BlobStore, StorageError, StorageResult};
