use std::sync::Arc;

use anyhow::Context;
use labstore_core::Config;
use labstore_db::{OwnershipRepository, UploadRepository};
use labstore_storage::{create_storage, FileDigest, IntegrityHasher, RandomIdentityGenerator};
use labstore_upload::{PipelineConfig, UploadPipeline};
use sqlx::PgPool;

/// Wire the production pipeline: Postgres repositories, local content store, random
/// storage names.
pub async fn build_pipeline(config: &Config, pool: PgPool) -> anyhow::Result<UploadPipeline> {
    let store = create_storage(config)
        .await
        .context("Failed to initialize upload directory")?;

    Ok(UploadPipeline::new(
        Arc::new(OwnershipRepository::new(pool.clone())),
        Arc::new(UploadRepository::new(pool)),
        store,
        IntegrityHasher::from_config(config),
        Arc::new(RandomIdentityGenerator::new()),
        PipelineConfig::from_config(config),
    ))
}

/// One-line rendering of a digest result for the `digest` command.
pub fn describe_digest(digest: Option<&FileDigest>) -> String {
    match digest {
        Some(d) => format!("{}:{}", d.algorithm, d.hex),
        None => "none: file at or above size limit".to_string(),
    }
}

/// Initialize tracing for CLI binaries. Production runs log JSON lines.
pub fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    );

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
