//! Storage name generation shared by all content stores.
//!
//! Name format: `{token}.{extension}`, where `token` is the hex SHA-512 of a random seed.
//! The original filename never contributes to the token.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::{SystemTime, UNIX_EPOCH};

use labstore_core::constants::UNKNOWN_EXTENSION;
use sha2::{Digest, Sha512};

use crate::traits::{StorageError, StorageResult};

/// Name of a file inside the content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageName(String);

impl StorageName {
    /// Validate a name read back from elsewhere (e.g. the metadata store).
    ///
    /// Names must be a single path segment: no separators, no `..`, no leading dot.
    pub fn parse(name: &str) -> StorageResult<Self> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
            || name.starts_with('.')
            || name.chars().any(|c| c.is_control())
        {
            return Err(StorageError::InvalidKey(format!(
                "'{}' is not a valid storage name",
                name
            )));
        }
        Ok(StorageName(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extension part (after the last dot), if any.
    pub fn extension(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(_, ext)| ext)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for StorageName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Source of fresh storage names.
pub trait IdentityGenerator: Send + Sync {
    /// Draw a new name ending in `.{extension}`.
    fn new_storage_name(&self, extension: &str) -> StorageName;
}

/// Default generator: SHA-512 over 32 bytes from the thread-local CSPRNG plus the
/// current time in nanoseconds.
///
/// Uniqueness is probabilistic. Callers wanting a hard guarantee check the name against
/// the metadata store before placing content under it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdentityGenerator;

impl RandomIdentityGenerator {
    pub fn new() -> Self {
        Self
    }

    fn token() -> String {
        let seed: [u8; 32] = rand::random();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        let mut hasher = Sha512::new();
        hasher.update(seed);
        hasher.update(nanos.to_le_bytes());
        hex::encode(hasher.finalize())
    }
}

impl IdentityGenerator for RandomIdentityGenerator {
    fn new_storage_name(&self, extension: &str) -> StorageName {
        StorageName(format!("{}.{}", Self::token(), safe_extension(extension)))
    }
}

/// Extensions come from sanitized display names and are alphanumeric already; anything
/// else is replaced rather than trusted.
fn safe_extension(extension: &str) -> &str {
    if !extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        extension
    } else {
        UNKNOWN_EXTENSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn storage_name_has_token_and_extension() {
        let name = RandomIdentityGenerator::new().new_storage_name("pdf");
        let (token, ext) = name.as_str().split_once('.').unwrap();
        assert_eq!(token.len(), 128);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ext, "pdf");
        assert_eq!(name.extension(), Some("pdf"));
    }

    #[test]
    fn ten_thousand_names_are_distinct() {
        let generator = RandomIdentityGenerator::new();
        let names: HashSet<String> = (0..10_000)
            .map(|_| generator.new_storage_name("bin").into_string())
            .collect();
        assert_eq!(names.len(), 10_000);
    }

    #[test]
    fn unsafe_extension_falls_back_to_unknown() {
        let generator = RandomIdentityGenerator::new();
        assert!(generator
            .new_storage_name("")
            .as_str()
            .ends_with(".unknown"));
        assert!(generator
            .new_storage_name("../x")
            .as_str()
            .ends_with(".unknown"));
    }

    #[test]
    fn parse_rejects_path_segments() {
        assert!(StorageName::parse("abc.pdf").is_ok());
        for bad in ["", "../etc/passwd", "a/b.pdf", "a\\b.pdf", ".hidden", "x..y"] {
            assert!(
                matches!(StorageName::parse(bad), Err(StorageError::InvalidKey(_))),
                "{bad} should be rejected"
            );
        }
    }
}
