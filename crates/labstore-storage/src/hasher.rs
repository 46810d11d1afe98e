//! Integrity hashing of stored files.
//!
//! Files below the size limit are streamed through the configured algorithm. Files at or
//! above it get no digest at all: hashing very large files would block the upload for
//! too long, and an absent digest is a normal state for a record.

use std::path::Path;

use labstore_core::{Config, HashAlgorithm};
use sha2::{Sha256, Sha512};
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::traits::{StorageError, StorageResult};

const CHUNK_SIZE: usize = 64 * 1024;

/// Hex digest of a file together with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub algorithm: HashAlgorithm,
    pub hex: String,
}

#[derive(Debug, Clone, Copy)]
pub struct IntegrityHasher {
    algorithm: HashAlgorithm,
    size_limit: u64,
}

impl IntegrityHasher {
    pub fn new(algorithm: HashAlgorithm, size_limit: u64) -> Self {
        Self {
            algorithm,
            size_limit,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.hash_algorithm(), config.hash_size_limit())
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn size_limit(&self) -> u64 {
        self.size_limit
    }

    /// Digest the file at `path`, or `None` when it is at or above the size limit.
    pub async fn digest(&self, path: &Path) -> StorageResult<Option<FileDigest>> {
        let metadata = fs::metadata(path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to stat {}: {}", path.display(), e))
        })?;

        if metadata.len() >= self.size_limit {
            tracing::debug!(
                path = %path.display(),
                size_bytes = metadata.len(),
                size_limit = self.size_limit,
                "File at or above hash size limit, skipping digest"
            );
            return Ok(None);
        }

        let start = std::time::Instant::now();
        let file = fs::File::open(path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let hex = match self.algorithm {
            HashAlgorithm::Sha256 => stream_digest::<Sha256>(file).await,
            HashAlgorithm::Sha512 => stream_digest::<Sha512>(file).await,
        }
        .map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            algorithm = %self.algorithm,
            size_bytes = metadata.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Computed file digest"
        );

        Ok(Some(FileDigest {
            algorithm: self.algorithm,
            hex,
        }))
    }
}

async fn stream_digest<D: sha2::Digest>(mut file: fs::File) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hex digest of an in-memory buffer.
pub fn digest_bytes(algorithm: HashAlgorithm, data: &[u8]) -> String {
    use sha2::Digest;

    match algorithm {
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
    }
}
