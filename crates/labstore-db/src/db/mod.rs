//! Database repositories for the data access layer
//!
//! `uploads` is owned by this subsystem; `experiments` and `items` belong to the wider
//! application and are only read here.

pub mod ownership;
pub mod uploads;

pub use ownership::OwnershipRepository;
pub use uploads::UploadRepository;
