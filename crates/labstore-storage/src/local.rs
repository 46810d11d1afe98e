use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::keys::StorageName;
use crate::traits::{ContentStore, StorageError, StorageResult};

/// Local filesystem content store
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Directory receiving stored files (e.g., "/var/lib/labstore/uploads")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a storage name to its filesystem path.
    ///
    /// Storage names are single path segments, so the result is always a direct child of
    /// the base directory.
    fn key_to_path(&self, storage_name: &StorageName) -> StorageResult<PathBuf> {
        let name = storage_name.as_str();
        if name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(StorageError::InvalidKey(
                "Storage name contains path separators".to_string(),
            ));
        }
        Ok(self.base_path.join(name))
    }
}

#[async_trait]
impl ContentStore for LocalStorage {
    async fn place(&self, source: &Path, storage_name: &StorageName) -> StorageResult<PathBuf> {
        let destination = self.key_to_path(storage_name)?;
        let start = std::time::Instant::now();

        // link(2) never replaces an existing destination, unlike rename(2)
        fs::hard_link(source, &destination)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    StorageError::NotFound(source.display().to_string())
                }
                ErrorKind::AlreadyExists => {
                    StorageError::AlreadyExists(destination.display().to_string())
                }
                _ => StorageError::PlacementFailed(format!(
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    e
                )),
            })?;

        if let Err(e) = fs::remove_file(source).await {
            // Leave the source in place and undo the link so the move stays all-or-nothing
            if let Err(undo) = fs::remove_file(&destination).await {
                tracing::error!(
                    error = %undo,
                    path = %destination.display(),
                    "Failed to unlink destination after aborted move"
                );
            }
            return Err(StorageError::PlacementFailed(format!(
                "Failed to release source {}: {}",
                source.display(),
                e
            )));
        }

        tracing::info!(
            source = %source.display(),
            path = %destination.display(),
            storage_name = %storage_name,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage placement successful"
        );

        Ok(destination)
    }

    async fn remove(&self, storage_name: &StorageName) -> StorageResult<()> {
        let path = self.key_to_path(storage_name)?;

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        tracing::info!(
            path = %path.display(),
            storage_name = %storage_name,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_name: &StorageName) -> StorageResult<bool> {
        let path = self.key_to_path(storage_name)?;
        Ok(fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{IdentityGenerator, RandomIdentityGenerator};
    use tempfile::tempdir;

    async fn storage_in(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir.join("uploads")).await.unwrap()
    }

    #[tokio::test]
    async fn test_new_creates_base_directory() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        assert!(storage.base_path().is_dir());
    }

    #[tokio::test]
    async fn test_place_moves_file() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let source = dir.path().join("phpA1b2");
        std::fs::write(&source, b"spectrum data").unwrap();

        let name = RandomIdentityGenerator::new().new_storage_name("csv");
        let placed = storage.place(&source, &name).await.unwrap();

        assert_eq!(placed, storage.base_path().join(name.as_str()));
        assert!(!source.exists());
        assert_eq!(std::fs::read(&placed).unwrap(), b"spectrum data");
        assert!(storage.exists(&name).await.unwrap());
    }

    #[tokio::test]
    async fn test_place_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let name = StorageName::parse("fixed.txt").unwrap();
        std::fs::write(storage.base_path().join("fixed.txt"), b"first").unwrap();

        let source = dir.path().join("incoming");
        std::fs::write(&source, b"second").unwrap();

        let result = storage.place(&source, &name).await;
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
        assert!(source.exists());
        assert_eq!(
            std::fs::read(storage.base_path().join("fixed.txt")).unwrap(),
            b"first"
        );
    }

    #[tokio::test]
    async fn test_place_missing_source() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let name = StorageName::parse("never.txt").unwrap();

        let result = storage.place(&dir.path().join("nope"), &name).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(!storage.exists(&name).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_nonexistent_is_ok() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let name = StorageName::parse("ghost.bin").unwrap();
        assert!(storage.remove(&name).await.is_ok());
    }

    #[tokio::test]
    async fn test_remove_placed_file() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let source = dir.path().join("tmp");
        std::fs::write(&source, b"x").unwrap();
        let name = StorageName::parse("abc.bin").unwrap();

        storage.place(&source, &name).await.unwrap();
        storage.remove(&name).await.unwrap();
        assert!(!storage.exists(&name).await.unwrap());
    }

    #[tokio::test]
    async fn test_io_errors_are_not_reported_as_absence() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        std::fs::remove_dir(storage.base_path()).unwrap();
        std::fs::write(storage.base_path(), b"not a directory").unwrap();
        let name = StorageName::parse("abc.bin").unwrap();

        assert!(matches!(
            storage.exists(&name).await,
            Err(StorageError::IoError(_))
        ));
        assert!(matches!(
            storage.remove(&name).await,
            Err(StorageError::DeleteFailed(_))
        ));

        let source = dir.path().join("tmp");
        std::fs::write(&source, b"x").unwrap();
        assert!(storage.place(&source, &name).await.is_err());
        assert!(source.exists());
    }
}
