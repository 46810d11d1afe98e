//! Content store abstraction trait
//!
//! This module defines the ContentStore trait that every storage backend implements.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::keys::StorageName;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Placement failed: {0}")]
    PlacementFailed(String),

    #[error("Destination already exists: {0}")]
    AlreadyExists(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Permanent home of uploaded bytes.
///
/// Placement takes ownership of a file that already exists on the same host (a transfer
/// spool file or a file extracted from an archive) and makes it reachable under its
/// storage name. Implementations must move rather than copy: when `place` fails the
/// source is left where it was and nothing exists under the storage name.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Move `source` into the store under `storage_name` and return the final path.
    async fn place(&self, source: &Path, storage_name: &StorageName) -> StorageResult<PathBuf>;

    /// Remove a stored file. Removing a missing file is not an error.
    async fn remove(&self, storage_name: &StorageName) -> StorageResult<()>;

    /// Check if a file is stored under this name
    async fn exists(&self, storage_name: &StorageName) -> StorageResult<bool>;
}
