use std::sync::Arc;

use labstore_core::Config;

use crate::{ContentStore, LocalStorage, StorageResult};

/// Create the content store described by the configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn ContentStore>> {
    let storage = LocalStorage::new(config.upload_dir()).await?;

    tracing::info!(
        upload_dir = %storage.base_path().display(),
        "Local content store ready"
    );

    Ok(Arc::new(storage))
}
