//! Mediakeep Core Library
//!
//! Domain models, error types, configuration and shared constants used by every
//! mediakeep crate. Media entities carry a [`models::BlobPointer`] that addresses
//! their binary object in the blob store; everything else lives in the metadata store.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, DeleteSettings, ProvisionSettings};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
