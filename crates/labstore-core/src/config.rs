//! Configuration module
//!
//! Settings are read from the process environment (after loading a `.env` file when one
//! is present). Unset values fall back to the defaults below; malformed values are
//! reported instead of silently replaced.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{DEFAULT_HASH_SIZE_LIMIT, DEFAULT_MAX_IDENTITY_ATTEMPTS};
use crate::models::HashAlgorithm;

// Common constants
const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const PLACEMENT_TIMEOUT_SECS: u64 = 30;
const PERSIST_TIMEOUT_SECS: u64 = 10;
const UPLOAD_DIR: &str = "uploads";

/// Settings shared by every binary: environment and database connection.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub environment: String,
    /// Only needed by commands that talk to the metadata store
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
}

/// Settings of the file intake pipeline.
#[derive(Clone, Debug)]
pub struct IntakeConfig {
    /// Directory receiving stored files
    pub upload_dir: PathBuf,
    pub hash_algorithm: HashAlgorithm,
    /// Files at or above this size are stored without a digest
    pub hash_size_limit: u64,
    pub placement_timeout_secs: u64,
    pub persist_timeout_secs: u64,
    pub max_identity_attempts: u32,
    /// Remove the stored file when its record cannot be written
    pub cleanup_on_persist_failure: bool,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub intake: IntakeConfig,
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, anyhow::Error> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: '{}'", key, raw)),
        _ => Ok(default),
    }
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let base = BaseConfig {
            environment,
            database_url: lookup("DATABASE_URL"),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_or(&lookup, "DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS)?,
        };

        let hash_algorithm = match lookup("HASH_ALGORITHM") {
            Some(raw) => raw.parse::<HashAlgorithm>()?,
            None => HashAlgorithm::default(),
        };

        let intake = IntakeConfig {
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(UPLOAD_DIR)),
            hash_algorithm,
            hash_size_limit: parse_or(&lookup, "HASH_SIZE_LIMIT_BYTES", DEFAULT_HASH_SIZE_LIMIT)?,
            placement_timeout_secs: parse_or(
                &lookup,
                "PLACEMENT_TIMEOUT_SECS",
                PLACEMENT_TIMEOUT_SECS,
            )?,
            persist_timeout_secs: parse_or(&lookup, "PERSIST_TIMEOUT_SECS", PERSIST_TIMEOUT_SECS)?,
            max_identity_attempts: parse_or(
                &lookup,
                "MAX_IDENTITY_ATTEMPTS",
                DEFAULT_MAX_IDENTITY_ATTEMPTS,
            )?,
            cleanup_on_persist_failure: parse_or(&lookup, "CLEANUP_ON_PERSIST_FAILURE", true)?,
        };

        let config = Config { base, intake };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(url) = &self.base.database_url {
            if url.trim().is_empty() {
                return Err(anyhow::anyhow!("DATABASE_URL cannot be empty"));
            }
        }
        if self.base.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be at least 1"));
        }
        if self.intake.hash_size_limit == 0 {
            return Err(anyhow::anyhow!("HASH_SIZE_LIMIT_BYTES must be at least 1"));
        }
        if self.intake.placement_timeout_secs == 0 || self.intake.persist_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "PLACEMENT_TIMEOUT_SECS and PERSIST_TIMEOUT_SECS must be at least 1"
            ));
        }
        if self.intake.max_identity_attempts == 0 {
            return Err(anyhow::anyhow!("MAX_IDENTITY_ATTEMPTS must be at least 1"));
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    // Convenience getters for common fields
    pub fn database_url(&self) -> Result<&str, anyhow::Error> {
        self.base
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))
    }

    pub fn db_max_connections(&self) -> u32 {
        self.base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.base.db_timeout_seconds
    }

    pub fn upload_dir(&self) -> &Path {
        &self.intake.upload_dir
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.intake.hash_algorithm
    }

    pub fn hash_size_limit(&self) -> u64 {
        self.intake.hash_size_limit
    }

    pub fn placement_timeout(&self) -> Duration {
        Duration::from_secs(self.intake.placement_timeout_secs)
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_secs(self.intake.persist_timeout_secs)
    }

    pub fn max_identity_attempts(&self) -> u32 {
        self.intake.max_identity_attempts
    }

    pub fn cleanup_on_persist_failure(&self) -> bool {
        self.intake.cleanup_on_persist_failure
    }
}
