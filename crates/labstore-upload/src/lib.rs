//! Labstore upload pipeline
//!
//! Attaches files to experiments and items: checks the principal may write to the
//! target, gives the file a sanitized display name and a random storage name, moves it
//! into the content store, hashes it and records it in the metadata store.

pub mod config;
pub mod permission;
pub mod pipeline;
pub mod sanitize;

pub use config::PipelineConfig;
pub use permission::PermissionGuard;
pub use pipeline::UploadPipeline;
pub use sanitize::{sanitize, DisplayName};
