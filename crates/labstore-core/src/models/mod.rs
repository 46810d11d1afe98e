//! Data models for the file intake subsystem
//!
//! Each sub-module represents one part of an upload: who is acting and on what
//! (`entity`), how the stored bytes are fingerprinted (`hash_algorithm`), and what the
//! pipeline receives and persists (`upload`).

mod entity;
mod hash_algorithm;
mod upload;

pub use entity::{EntityType, PrincipalId, TargetReference};
pub use hash_algorithm::HashAlgorithm;
pub use upload::{PayloadDescriptor, UploadOutcome, UploadRecord};
