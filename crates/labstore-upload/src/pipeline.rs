//! Upload pipeline
//!
//! One run takes a file that already sits on this host and attaches it to an experiment
//! or an item:
//! validate payload → validate target → authorize → check source → sanitize name →
//! generate identity → place → digest → persist
//!
//! Any failure ends the run with the matching [`UploadError`]; later stages never run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use labstore_core::{
    ErrorMetadata, LogLevel, PayloadDescriptor, PrincipalId, TargetReference, UploadError,
    UploadOutcome, UploadRecord,
};
use labstore_db::{OwnershipLookup, UploadRecorder};
use labstore_storage::{ContentStore, IdentityGenerator, IntegrityHasher, StorageName};
use tokio::fs;
use tracing::Instrument;

use crate::config::PipelineConfig;
use crate::permission::PermissionGuard;
use crate::sanitize::sanitize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    ValidatePayload,
    ValidateTarget,
    Authorize,
    CheckSource,
    SanitizeName,
    GenerateIdentity,
    PlaceContent,
    ComputeDigest,
    PersistMetadata,
    Done,
}

impl Stage {
    fn as_str(&self) -> &'static str {
        match self {
            Stage::ValidatePayload => "validate_payload",
            Stage::ValidateTarget => "validate_target",
            Stage::Authorize => "authorize",
            Stage::CheckSource => "check_source",
            Stage::SanitizeName => "sanitize_name",
            Stage::GenerateIdentity => "generate_identity",
            Stage::PlaceContent => "place_content",
            Stage::ComputeDigest => "compute_digest",
            Stage::PersistMetadata => "persist_metadata",
            Stage::Done => "done",
        }
    }
}

/// Where the bytes of an upload come from
enum Intake<'a> {
    /// Spooled by the transfer layer; `None` when the request carried no file
    Transfer(Option<PayloadDescriptor>),
    /// A file already on disk (archive import); its name is the final path segment
    Local(&'a Path),
}

/// Intake after its payload has been checked
enum Source<'a> {
    Spooled(PayloadDescriptor),
    Local(&'a Path),
}

/// Orchestrates a single upload from an on-host file to a stored, recorded attachment.
///
/// Holds no per-upload state: one pipeline can serve any number of concurrent uploads.
pub struct UploadPipeline {
    guard: PermissionGuard,
    recorder: Arc<dyn UploadRecorder>,
    store: Arc<dyn ContentStore>,
    hasher: IntegrityHasher,
    identity: Arc<dyn IdentityGenerator>,
    config: PipelineConfig,
}

impl UploadPipeline {
    pub fn new(
        ownership: Arc<dyn OwnershipLookup>,
        recorder: Arc<dyn UploadRecorder>,
        store: Arc<dyn ContentStore>,
        hasher: IntegrityHasher,
        identity: Arc<dyn IdentityGenerator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            guard: PermissionGuard::new(ownership),
            recorder,
            store,
            hasher,
            identity,
            config,
        }
    }

    /// Attach a file received through a transfer.
    ///
    /// `payload` is `None` when the request carried no file at all.
    pub async fn upload_file(
        &self,
        principal: PrincipalId,
        entity_type: &str,
        entity_id: i64,
        payload: Option<PayloadDescriptor>,
    ) -> Result<UploadOutcome, UploadError> {
        self.run(principal, entity_type, entity_id, Intake::Transfer(payload))
            .await
    }

    /// Attach a file that already exists on this host, e.g. one extracted from an archive.
    pub async fn upload_local_file(
        &self,
        principal: PrincipalId,
        entity_type: &str,
        entity_id: i64,
        source: &Path,
    ) -> Result<UploadOutcome, UploadError> {
        self.run(principal, entity_type, entity_id, Intake::Local(source))
            .await
    }

    async fn run(
        &self,
        principal: PrincipalId,
        entity_type: &str,
        entity_id: i64,
        intake: Intake<'_>,
    ) -> Result<UploadOutcome, UploadError> {
        let span = tracing::info_span!(
            "upload",
            entity_type = %entity_type,
            entity_id = entity_id,
            principal = %principal
        );

        async move {
            let start = Instant::now();
            let mut stage = Stage::ValidatePayload;
            let result = self.stages(principal, entity_type, entity_id, intake, &mut stage).await;

            match &result {
                Ok(outcome) => tracing::info!(
                    storage_name = %outcome.record.storage_name,
                    display_name = %outcome.record.display_name,
                    size_bytes = outcome.size_bytes,
                    hashed = outcome.record.digest.is_some(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload completed"
                ),
                Err(e) => log_failure(stage, e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn stages(
        &self,
        principal: PrincipalId,
        entity_type: &str,
        entity_id: i64,
        intake: Intake<'_>,
        stage: &mut Stage,
    ) -> Result<UploadOutcome, UploadError> {
        let source = match intake {
            Intake::Transfer(payload) => {
                enter(stage, Stage::ValidatePayload);
                let payload = payload.ok_or_else(|| {
                    UploadError::EmptyPayload("request carried no file".to_string())
                })?;
                payload.validate()?;
                Source::Spooled(payload)
            }
            Intake::Local(path) => Source::Local(path),
        };

        enter(stage, Stage::ValidateTarget);
        let target = TargetReference::parse(entity_type, entity_id)?;

        enter(stage, Stage::Authorize);
        self.guard.authorize(&target, principal).await?;

        let (original_name, source_path) = match &source {
            Source::Spooled(payload) => (payload.name.clone(), payload.temporary_path.as_path()),
            Source::Local(path) => {
                enter(stage, Stage::CheckSource);
                (readable_file_name(path).await?, *path)
            }
        };

        enter(stage, Stage::SanitizeName);
        let display_name = sanitize(&original_name);

        enter(stage, Stage::GenerateIdentity);
        let storage_name = self.draw_storage_name(display_name.extension()).await?;

        enter(stage, Stage::PlaceContent);
        let stored_path = self.place(source_path, &storage_name).await?;

        enter(stage, Stage::ComputeDigest);
        let (size_bytes, digest) = match self.measure(&stored_path).await {
            Ok(measured) => measured,
            Err(e) => {
                self.discard(&storage_name).await;
                return Err(e);
            }
        };

        enter(stage, Stage::PersistMetadata);
        let record = UploadRecord::new(
            display_name.into_string(),
            storage_name.as_str().to_string(),
            target.entity_type(),
            target.entity_id(),
            principal,
            digest,
            self.hasher.algorithm(),
        );
        if let Err(e) = self.persist(&record).await {
            self.discard(&storage_name).await;
            return Err(e);
        }

        enter(stage, Stage::Done);
        Ok(UploadOutcome {
            record,
            stored_path,
            size_bytes,
            completed_at: Utc::now(),
        })
    }

    /// Draw storage names until one is unknown to both the metadata store and the content
    /// store.
    async fn draw_storage_name(&self, extension: &str) -> Result<StorageName, UploadError> {
        let attempts = self.config.max_identity_attempts.max(1);

        for attempt in 1..=attempts {
            let candidate = self.identity.new_storage_name(extension);

            let recorded = self
                .recorder
                .storage_name_exists(candidate.as_str())
                .await
                .map_err(|e| {
                    UploadError::PlacementFailed(format!(
                        "cannot check storage name against metadata store: {:#}",
                        e
                    ))
                })?;
            let stored = !recorded
                && self.store.exists(&candidate).await.map_err(|e| {
                    UploadError::PlacementFailed(format!(
                        "cannot check storage name against content store: {}",
                        e
                    ))
                })?;

            if !recorded && !stored {
                return Ok(candidate);
            }

            tracing::warn!(
                storage_name = %candidate,
                attempt = attempt,
                max_attempts = attempts,
                "Storage name already taken, drawing a new one"
            );
        }

        Err(UploadError::PlacementFailed(format!(
            "no free storage name after {} attempts",
            attempts
        )))
    }

    async fn place(&self, source: &Path, storage_name: &StorageName) -> Result<PathBuf, UploadError> {
        let timeout = self.config.placement_timeout;

        match tokio::time::timeout(timeout, self.store.place(source, storage_name)).await {
            Ok(Ok(path)) => Ok(path),
            Ok(Err(e)) => Err(UploadError::PlacementFailed(e.to_string())),
            // The move runs on blocking threads and may still land after this point
            Err(_) => Err(UploadError::PlacementFailed(format!(
                "moving {} timed out after {}s",
                source.display(),
                timeout.as_secs_f64()
            ))),
        }
    }

    /// Size and digest of the placed file. The digest is `None` above the hash size limit.
    async fn measure(&self, stored_path: &Path) -> Result<(u64, Option<String>), UploadError> {
        let size_bytes = fs::metadata(stored_path)
            .await
            .map_err(|e| {
                UploadError::IntegrityCheckFailed(format!(
                    "cannot stat {}: {}",
                    stored_path.display(),
                    e
                ))
            })?
            .len();

        let digest = self
            .hasher
            .digest(stored_path)
            .await
            .map_err(|e| UploadError::IntegrityCheckFailed(e.to_string()))?;

        Ok((size_bytes, digest.map(|d| d.hex)))
    }

    async fn persist(&self, record: &UploadRecord) -> Result<(), UploadError> {
        let timeout = self.config.persist_timeout;

        match tokio::time::timeout(timeout, self.recorder.record(record)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(UploadError::PersistenceFailed(format!("{:#}", e))),
            Err(_) => Err(UploadError::PersistenceFailed(format!(
                "writing upload record timed out after {}s",
                timeout.as_secs_f64()
            ))),
        }
    }

    /// Remove a placed file whose record will never be written. Failures are logged only;
    /// the caller reports the error that caused the rollback.
    async fn discard(&self, storage_name: &StorageName) {
        if !self.config.cleanup_on_persist_failure {
            tracing::warn!(
                storage_name = %storage_name,
                "Leaving placed file without an upload record"
            );
            return;
        }

        match self.store.remove(storage_name).await {
            Ok(()) => tracing::info!(
                storage_name = %storage_name,
                "Removed placed file after failed upload"
            ),
            Err(e) => tracing::error!(
                error = %e,
                storage_name = %storage_name,
                "Failed to remove placed file after failed upload"
            ),
        }
    }
}

fn enter(current: &mut Stage, next: Stage) {
    *current = next;
    tracing::debug!(stage = next.as_str(), "Upload stage");
}

fn log_failure(stage: Stage, err: &UploadError) {
    let stage = stage.as_str();
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(stage, error_code = code, error = %err, "Upload rejected"),
        LogLevel::Warn => tracing::warn!(stage, error_code = code, error = %err, "Upload rejected"),
        LogLevel::Error => tracing::error!(stage, error_code = code, error = %err, "Upload failed"),
    }
}

/// Check that a local import source is a readable regular file and return its name.
async fn readable_file_name(path: &Path) -> Result<String, UploadError> {
    let unreadable = |reason: String| UploadError::UnreadableSource {
        path: path.to_path_buf(),
        reason,
    };

    let metadata = fs::metadata(path)
        .await
        .map_err(|e| unreadable(e.to_string()))?;
    if !metadata.is_file() {
        return Err(unreadable("not a regular file".to_string()));
    }
    fs::File::open(path)
        .await
        .map_err(|e| unreadable(e.to_string()))?;

    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| unreadable("path has no file name".to_string()))
}
