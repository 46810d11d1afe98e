//! Labstore Database Layer
//!
//! This crate provides the repositories the upload pipeline talks to: the ownership
//! lookup used for authorization and the append-only upload record store. The traits in
//! `traits` are the seams the pipeline depends on, so it can be exercised without a
//! database.

// Module declarations
pub mod db;
pub mod setup;
pub mod traits;

// Re-exports: repositories
pub use db::{OwnershipRepository, UploadRepository};

// Re-exports: database setup
pub use setup::setup_database;

// Re-exports: pipeline-facing traits
pub use traits::{OwnershipLookup, UploadRecorder};
