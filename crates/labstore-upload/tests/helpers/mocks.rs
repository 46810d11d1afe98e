//! In-memory collaborators for pipeline tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use labstore_core::{EntityType, PrincipalId, UploadRecord};
use labstore_db::{OwnershipLookup, UploadRecorder};
use labstore_storage::{
    ContentStore, IdentityGenerator, LocalStorage, RandomIdentityGenerator, StorageError,
    StorageName, StorageResult,
};

/// Ownership table keyed by (entity type, entity id).
#[derive(Default)]
pub struct MockOwnership {
    owners: Mutex<HashMap<(EntityType, i64), i64>>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl MockOwnership {
    pub fn with_owner(self, entity_type: EntityType, entity_id: i64, owner: i64) -> Self {
        self.owners
            .lock()
            .unwrap()
            .insert((entity_type, entity_id), owner);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl OwnershipLookup for MockOwnership {
    async fn is_owned_by(
        &self,
        entity_id: i64,
        entity_type: EntityType,
        principal: PrincipalId,
    ) -> anyhow::Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("ownership lookup unavailable");
        }
        let owners = self.owners.lock().unwrap();
        Ok(owners.get(&(entity_type, entity_id)) == Some(&principal.get()))
    }
}

/// Recorder keeping every written record in memory.
#[derive(Clone, Default)]
pub struct MockRecorder {
    pub records: Arc<Mutex<Vec<UploadRecord>>>,
    /// Storage names reported as already referenced
    pub taken: Arc<Mutex<HashSet<String>>>,
    pub fail: bool,
    pub delay: Option<Duration>,
}

impl MockRecorder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn take_name(&self, storage_name: &str) {
        self.taken.lock().unwrap().insert(storage_name.to_string());
    }

    pub fn records(&self) -> Vec<UploadRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadRecorder for MockRecorder {
    async fn record(&self, record: &UploadRecord) -> anyhow::Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            anyhow::bail!("insert into uploads failed");
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn storage_name_exists(&self, storage_name: &str) -> anyhow::Result<bool> {
        let recorded = self
            .records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.storage_name == storage_name);
        Ok(recorded || self.taken.lock().unwrap().contains(storage_name))
    }
}

/// Content store whose placement always fails. Counts every call that would touch the
/// filesystem.
#[derive(Default)]
pub struct FailingStore {
    pub operations: AtomicUsize,
}

#[async_trait]
impl ContentStore for FailingStore {
    async fn place(&self, source: &Path, _storage_name: &StorageName) -> StorageResult<PathBuf> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::PlacementFailed(format!(
            "rename of {} failed: cross-device link",
            source.display()
        )))
    }

    async fn remove(&self, _storage_name: &StorageName) -> StorageResult<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn exists(&self, _storage_name: &StorageName) -> StorageResult<bool> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        Ok(false)
    }
}

/// Places through a real local store but reports a path nothing lives at, so reading the
/// placed file back fails.
pub struct MisreportingStore {
    pub inner: LocalStorage,
}

#[async_trait]
impl ContentStore for MisreportingStore {
    async fn place(&self, source: &Path, storage_name: &StorageName) -> StorageResult<PathBuf> {
        let placed = self.inner.place(source, storage_name).await?;
        Ok(placed.with_extension("elsewhere"))
    }

    async fn remove(&self, storage_name: &StorageName) -> StorageResult<()> {
        self.inner.remove(storage_name).await
    }

    async fn exists(&self, storage_name: &StorageName) -> StorageResult<bool> {
        self.inner.exists(storage_name).await
    }
}

/// Hands out predetermined tokens first, then random names.
#[derive(Default)]
pub struct SequenceIdentity {
    tokens: Mutex<VecDeque<String>>,
    pub drawn: AtomicUsize,
}

impl SequenceIdentity {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: Mutex::new(tokens.iter().map(|t| t.to_string()).collect()),
            drawn: AtomicUsize::new(0),
        }
    }
}

impl IdentityGenerator for SequenceIdentity {
    fn new_storage_name(&self, extension: &str) -> StorageName {
        self.drawn.fetch_add(1, Ordering::SeqCst);
        match self.tokens.lock().unwrap().pop_front() {
            Some(token) => StorageName::parse(&format!("{}.{}", token, extension)).unwrap(),
            None => RandomIdentityGenerator::new().new_storage_name(extension),
        }
    }
}
