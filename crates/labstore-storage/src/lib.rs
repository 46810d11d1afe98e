//! Labstore Storage Library
//!
//! This crate provides the content store abstraction and its local filesystem
//! implementation, plus the two helpers that work on stored bytes: storage name
//! generation and integrity hashing.
//!
//! # Storage name format
//!
//! Every stored file is named `{token}.{extension}` where `token` is 128 hex characters
//! drawn from a random source and `extension` is alphanumeric. Names never carry
//! separators, so the on-disk location is always `{upload_dir}/{name}` with no
//! subdirectories.

pub mod factory;
pub mod hasher;
pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use hasher::{digest_bytes, FileDigest, IntegrityHasher};
pub use keys::{IdentityGenerator, RandomIdentityGenerator, StorageName};
pub use local::LocalStorage;
pub use traits::{ContentStore, StorageError, StorageResult};
