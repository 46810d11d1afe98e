//! Repository trait abstractions for the upload pipeline
//!
//! These traits define the minimal interface the pipeline needs from the database,
//! allowing it to be tested with in-memory implementations.

use anyhow::{Context, Result};
use async_trait::async_trait;
use labstore_core::{EntityType, PrincipalId, UploadRecord};

use crate::db::{OwnershipRepository, UploadRepository};

/// Answers whether a principal owns an entity. Must not have side effects.
#[async_trait]
pub trait OwnershipLookup: Send + Sync {
    async fn is_owned_by(
        &self,
        entity_id: i64,
        entity_type: EntityType,
        principal: PrincipalId,
    ) -> Result<bool>;
}

/// Persists upload records. Records are only ever inserted.
#[async_trait]
pub trait UploadRecorder: Send + Sync {
    /// Insert one record
    async fn record(&self, record: &UploadRecord) -> Result<()>;

    /// Whether a record already references this storage name
    async fn storage_name_exists(&self, storage_name: &str) -> Result<bool>;
}

// Implementations for concrete repository types

#[async_trait]
impl OwnershipLookup for OwnershipRepository {
    async fn is_owned_by(
        &self,
        entity_id: i64,
        entity_type: EntityType,
        principal: PrincipalId,
    ) -> Result<bool> {
        OwnershipRepository::is_owned_by(self, entity_id, entity_type, principal)
            .await
            .with_context(|| format!("Failed to look up owner of {} {}", entity_type, entity_id))
    }
}

#[async_trait]
impl UploadRecorder for UploadRepository {
    async fn record(&self, record: &UploadRecord) -> Result<()> {
        self.create(record)
            .await
            .context("Failed to insert upload record")?;
        Ok(())
    }

    async fn storage_name_exists(&self, storage_name: &str) -> Result<bool> {
        UploadRepository::storage_name_exists(self, storage_name)
            .await
            .context("Failed to check storage name")
    }
}
