//! Upload inputs and the record persisted for every stored file.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{EntityType, PrincipalId};
use super::hash_algorithm::HashAlgorithm;
use crate::constants::DEFAULT_UPLOAD_COMMENT;
use crate::error::UploadError;

/// File received through a transfer: the name the client sent and where the
/// transport layer spooled the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadDescriptor {
    pub name: String,
    pub temporary_path: PathBuf,
}

impl PayloadDescriptor {
    pub fn new(name: impl Into<String>, temporary_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            temporary_path: temporary_path.into(),
        }
    }

    /// Check that the descriptor names a file and points somewhere.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.name.trim().is_empty() {
            return Err(UploadError::EmptyPayload(
                "payload has no file name".to_string(),
            ));
        }
        if self.temporary_path.as_os_str().is_empty() {
            return Err(UploadError::EmptyPayload(
                "payload has no temporary path".to_string(),
            ));
        }
        Ok(())
    }
}

/// Descriptive record of a stored upload.
///
/// Written once per successful upload. Only `comment` is meant to change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Sanitized name shown to users
    pub display_name: String,
    /// Name of the file inside the upload directory
    pub storage_name: String,
    pub comment: String,
    pub entity_id: i64,
    pub principal_id: PrincipalId,
    pub entity_type: EntityType,
    /// Hex digest; `None` when the file was too large to hash
    pub digest: Option<String>,
    pub digest_algorithm: HashAlgorithm,
}

impl UploadRecord {
    pub fn new(
        display_name: String,
        storage_name: String,
        entity_type: EntityType,
        entity_id: i64,
        principal_id: PrincipalId,
        digest: Option<String>,
        digest_algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            display_name,
            storage_name,
            comment: DEFAULT_UPLOAD_COMMENT.to_string(),
            entity_id,
            principal_id,
            entity_type,
            digest,
            digest_algorithm,
        }
    }
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub record: UploadRecord,
    pub stored_path: PathBuf,
    pub size_bytes: u64,
    pub completed_at: DateTime<Utc>,
}
