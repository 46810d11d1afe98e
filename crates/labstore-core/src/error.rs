//! Error types module
//!
//! Every failure of the upload pipeline is reported as one `UploadError` variant, so
//! callers can tell failures apart by kind and decide how to present them. None of
//! these errors is retried inside the pipeline.

use std::path::PathBuf;

use crate::models::{EntityType, PrincipalId};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected requests worth noticing
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for presenting an error - lets errors self-describe how they should be shown
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "PERMISSION_DENIED")
    fn error_code(&self) -> &'static str;

    /// Whether the same request may succeed if issued again later
    fn is_recoverable(&self) -> bool;

    /// Caller-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("No file received: {0}")]
    EmptyPayload(String),

    #[error("Unreadable source {}: {reason}", .path.display())]
    UnreadableSource { path: PathBuf, reason: String },

    #[error("Permission denied: principal {principal} does not own {entity_type} {entity_id}")]
    PermissionDenied {
        entity_type: EntityType,
        entity_id: i64,
        principal: PrincipalId,
    },

    #[error("Ownership lookup failed: {0}")]
    OwnershipLookupFailed(String),

    #[error("Placement failed: {0}")]
    PlacementFailed(String),

    #[error("Integrity check failed: {0}")]
    IntegrityCheckFailed(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn upload_error_static_metadata(err: &UploadError) -> (&'static str, bool, LogLevel) {
    match err {
        UploadError::InvalidTarget(_) => ("INVALID_TARGET", false, LogLevel::Debug),
        UploadError::EmptyPayload(_) => ("EMPTY_PAYLOAD", false, LogLevel::Debug),
        UploadError::UnreadableSource { .. } => ("UNREADABLE_SOURCE", false, LogLevel::Warn),
        UploadError::PermissionDenied { .. } => ("PERMISSION_DENIED", false, LogLevel::Warn),
        UploadError::OwnershipLookupFailed(_) => {
            ("OWNERSHIP_LOOKUP_FAILED", true, LogLevel::Error)
        }
        UploadError::PlacementFailed(_) => ("PLACEMENT_FAILED", true, LogLevel::Error),
        UploadError::IntegrityCheckFailed(_) => ("INTEGRITY_CHECK_FAILED", true, LogLevel::Error),
        UploadError::PersistenceFailed(_) => ("PERSISTENCE_FAILED", true, LogLevel::Error),
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::InvalidTarget(ref msg) => format!("Bad item id: {}", msg),
            UploadError::EmptyPayload(_) => "No files received".to_string(),
            UploadError::UnreadableSource { .. } => "No file here!".to_string(),
            UploadError::PermissionDenied { entity_type, .. } => match entity_type {
                EntityType::Experiment => "Not your experiment!".to_string(),
                EntityType::Item => "Not allowed to upload to this item".to_string(),
            },
            UploadError::OwnershipLookupFailed(_) => {
                "Could not verify ownership, try again later".to_string()
            }
            UploadError::PlacementFailed(_) => {
                "Error while moving the file. Check folder permissions!".to_string()
            }
            UploadError::IntegrityCheckFailed(_) => {
                "Could not read the stored file to compute its hash".to_string()
            }
            UploadError::PersistenceFailed(_) => "Cannot add to SQL database!".to_string(),
        }
    }
}
