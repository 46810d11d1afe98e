use std::time::Duration;

use labstore_core::constants::DEFAULT_MAX_IDENTITY_ATTEMPTS;
use labstore_core::Config;

/// Runtime knobs of the upload pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound for moving the file into the store
    pub placement_timeout: Duration,
    /// Upper bound for writing the upload record
    pub persist_timeout: Duration,
    /// How many storage names to draw before giving up on a collision
    pub max_identity_attempts: u32,
    /// Delete the placed file when its record cannot be written
    pub cleanup_on_persist_failure: bool,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            placement_timeout: config.placement_timeout(),
            persist_timeout: config.persist_timeout(),
            max_identity_attempts: config.max_identity_attempts().max(1),
            cleanup_on_persist_failure: config.cleanup_on_persist_failure(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            placement_timeout: Duration::from_secs(30),
            persist_timeout: Duration::from_secs(10),
            max_identity_attempts: DEFAULT_MAX_IDENTITY_ATTEMPTS,
            cleanup_on_persist_failure: true,
        }
    }
}
