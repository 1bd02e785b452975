//! Error types module
//!
//! All service and repository operations return `AppError`. The taxonomy separates
//! "the metadata row is absent" from "a store is temporarily unreachable" and from
//! "the row could not be removed", because callers retry each of them differently.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// to whatever transport sits in front of the services.
pub trait ErrorMetadata {
    /// HTTP-equivalent status code
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "RESOURCE_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether the failed operation may be retried as-is
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the caller
    fn suggested_action(&self) -> Option<&'static str>;

    /// Caller-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Blob store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Failed to delete {resource} {id}: {reason}")]
    MetadataDeleteFailed {
        resource: &'static str,
        id: i64,
        reason: String,
    },

    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::ResourceNotFound(_) => (
            404,
            "RESOURCE_NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::StoreUnavailable(_) => (
            503,
            "STORE_UNAVAILABLE",
            true,
            Some("Retry the blob operation after a short delay"),
            true,
            LogLevel::Warn,
        ),
        AppError::MetadataDeleteFailed { .. } => (
            500,
            "METADATA_DELETE_FAILED",
            false,
            Some("Check for dependent records, then re-run the delete"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidKey(_) => (
            400,
            "INVALID_KEY",
            false,
            Some("Provide a non-empty file name"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidStatus(_) => (
            400,
            "INVALID_STATUS",
            false,
            Some("Use one of: raw, processing, failed, success"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Config(_) => (
            500,
            "CONFIGURATION_ERROR",
            false,
            Some("Fix the environment configuration and restart"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::ResourceNotFound(_) => "ResourceNotFound",
            AppError::StoreUnavailable(_) => "StoreUnavailable",
            AppError::MetadataDeleteFailed { .. } => "MetadataDeleteFailed",
            AppError::InvalidKey(_) => "InvalidKey",
            AppError::InvalidStatus(_) => "InvalidStatus",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Database(_) => "Database",
            AppError::Config(_) => "Config",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::ResourceNotFound(_))
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::ResourceNotFound(ref msg) => msg.clone(),
            AppError::StoreUnavailable(_) => "Blob store is temporarily unavailable".to_string(),
            AppError::MetadataDeleteFailed { resource, id, .. } => {
                format!("Failed to delete {} {}", resource, id)
            }
            AppError::InvalidKey(ref msg) => msg.clone(),
            AppError::InvalidStatus(ref msg) => format!("Invalid status: {}", msg),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Config(_) => "Service is misconfigured".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::ResourceNotFound("video 42".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "RESOURCE_NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "video 42");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_metadata_store_unavailable_is_retryable() {
        let err = AppError::StoreUnavailable("connection reset".to_string());
        assert_eq!(err.http_status_code(), 503);
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_error_metadata_delete_failed_is_not_retried() {
        let err = AppError::MetadataDeleteFailed {
            resource: "video",
            id: 7,
            reason: "foreign key violation".to_string(),
        };
        assert_eq!(err.error_code(), "METADATA_DELETE_FAILED");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to delete video 7");
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_caller_errors() {
        let key = AppError::InvalidKey("file name is empty".to_string());
        assert_eq!(key.http_status_code(), 400);
        assert!(!key.is_recoverable());

        let status = AppError::InvalidStatus("done".to_string());
        assert_eq!(status.error_code(), "INVALID_STATUS");
        assert_eq!(status.client_message(), "Invalid status: done");
    }

    #[test]
    fn test_detailed_message_includes_source() {
        let err = AppError::from(anyhow::anyhow!("inner").context("outer"));
        let details = err.detailed_message();
        assert!(details.contains("outer"));
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_sqlx_error_maps_to_database() {
        let err = AppError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.error_type(), "Database");
        assert!(err.is_recoverable());
    }
}
