//! Application-wide constants

/// Files at or above this size (in bytes) are stored without a digest.
pub const DEFAULT_HASH_SIZE_LIMIT: u64 = 5_000_000;

/// Comment stored with every new upload. Users edit it after the upload completes.
pub const DEFAULT_UPLOAD_COMMENT: &str = "Click to add a comment";

/// Extension used in storage names when the display name carries none.
pub const UNKNOWN_EXTENSION: &str = "unknown";

/// Number of storage names drawn before placement gives up on finding a free one.
pub const DEFAULT_MAX_IDENTITY_ATTEMPTS: u32 = 3;
