//! Test helpers: build an upload pipeline over a temporary upload directory.
//!
//! Run from workspace root: `cargo test -p labstore-upload --test pipeline_test`.
//! No database is needed; the metadata store is replaced by in-memory mocks.

#![allow(dead_code)]

pub mod mocks;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use labstore_core::{HashAlgorithm, PayloadDescriptor, PrincipalId};
use labstore_db::{OwnershipLookup, UploadRecorder};
use labstore_storage::{
    ContentStore, IdentityGenerator, IntegrityHasher, LocalStorage, RandomIdentityGenerator,
};
use labstore_upload::{PipelineConfig, UploadPipeline};
use tempfile::TempDir;

use mocks::{MockOwnership, MockRecorder};

pub const HASH_LIMIT: u64 = 1024;

pub struct TestHarness {
    pub temp_dir: TempDir,
    pub spool_dir: PathBuf,
    pub storage: Arc<LocalStorage>,
    pub recorder: MockRecorder,
    pub pipeline: UploadPipeline,
    spooled: AtomicUsize,
}

impl TestHarness {
    /// Spool directory for incoming files and a local upload directory, both under one
    /// temporary directory.
    pub async fn new(ownership: MockOwnership) -> Self {
        Self::build(
            ownership,
            MockRecorder::default(),
            Arc::new(RandomIdentityGenerator::new()),
            PipelineConfig::default(),
        )
        .await
    }

    pub async fn build(
        ownership: MockOwnership,
        recorder: MockRecorder,
        identity: Arc<dyn IdentityGenerator>,
        config: PipelineConfig,
    ) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let spool_dir = temp_dir.path().join("spool");
        std::fs::create_dir_all(&spool_dir).expect("Failed to create spool directory");
        let storage = Arc::new(
            LocalStorage::new(temp_dir.path().join("uploads"))
                .await
                .expect("Failed to create local storage"),
        );

        let pipeline = UploadPipeline::new(
            Arc::new(ownership) as Arc<dyn OwnershipLookup>,
            Arc::new(recorder.clone()) as Arc<dyn UploadRecorder>,
            storage.clone() as Arc<dyn ContentStore>,
            IntegrityHasher::new(HashAlgorithm::Sha256, HASH_LIMIT),
            identity,
            config,
        );

        Self {
            temp_dir,
            spool_dir,
            storage,
            recorder,
            pipeline,
            spooled: AtomicUsize::new(0),
        }
    }

    /// Write a spooled file the way a transfer layer would and describe it.
    pub fn spool(&self, client_name: &str, contents: &[u8]) -> PayloadDescriptor {
        let n = self.spooled.fetch_add(1, Ordering::SeqCst);
        let path = self.spool_dir.join(format!("php{}", n));
        std::fs::write(&path, contents).expect("Failed to write spool file");
        PayloadDescriptor::new(client_name, path)
    }

    pub fn write_local(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.spool_dir.join(name);
        std::fs::write(&path, contents).expect("Failed to write local file");
        path
    }

    pub fn stored_files(&self) -> Vec<PathBuf> {
        list_files(self.storage.base_path())
    }
}

pub fn principal(id: i64) -> PrincipalId {
    PrincipalId::new(id).expect("positive principal id")
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|entry| entry.expect("Failed to read entry").path())
        .collect();
    files.sort();
    files
}
