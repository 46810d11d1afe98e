//! Upload targets and the principal acting on them.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UploadError;

/// Kind of entity an upload is attached to.
///
/// The lowercase plural spelling (`experiments`, `items`) is both the persisted `type`
/// column of an upload and the name of the table holding the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "experiments")]
    Experiment,
    #[serde(rename = "items")]
    Item,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Experiment => "experiments",
            EntityType::Item => "items",
        }
    }
}

impl FromStr for EntityType {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "experiments" | "experiment" => Ok(EntityType::Experiment),
            "items" | "item" => Ok(EntityType::Item),
            _ => Err(UploadError::InvalidTarget(format!(
                "unknown entity type '{}'",
                s
            ))),
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Identity of the user performing an upload, as supplied by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(i64);

impl PrincipalId {
    /// Wrap a raw user id. Zero and negative ids are rejected.
    pub fn new(id: i64) -> Result<Self, UploadError> {
        if id <= 0 {
            return Err(UploadError::InvalidTarget(format!(
                "principal id must be a positive integer, got {}",
                id
            )));
        }
        Ok(PrincipalId(id))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl Display for PrincipalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// A validated reference to the experiment or item receiving an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetReference {
    entity_type: EntityType,
    entity_id: i64,
}

impl TargetReference {
    pub fn new(entity_type: EntityType, entity_id: i64) -> Result<Self, UploadError> {
        if entity_id <= 0 {
            return Err(UploadError::InvalidTarget(format!(
                "entity id must be a positive integer, got {}",
                entity_id
            )));
        }
        Ok(TargetReference {
            entity_type,
            entity_id,
        })
    }

    /// Validate untrusted type and id values coming from a request or an archive manifest.
    pub fn parse(entity_type: &str, entity_id: i64) -> Result<Self, UploadError> {
        let entity_type = entity_type.parse::<EntityType>()?;
        Self::new(entity_type, entity_id)
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn entity_id(&self) -> i64 {
        self.entity_id
    }
}

impl Display for TargetReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.entity_type, self.entity_id)
    }
}
