//! Labstore Core Library
//!
//! This crate provides the domain models, error taxonomy and configuration shared by
//! every Labstore component: the storage layer, the metadata repositories, the upload
//! pipeline and the command-line tools.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorMetadata, LogLevel, UploadError};
pub use models::{
    EntityType, HashAlgorithm, PayloadDescriptor, PrincipalId, TargetReference, UploadOutcome,
    UploadRecord,
};
