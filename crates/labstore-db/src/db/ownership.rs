//! Ownership lookups against the experiments and items tables.

use labstore_core::{EntityType, PrincipalId};
use sqlx::{PgPool, Postgres};

/// Owner query for each entity table. The table name comes from the entity type, never
/// from caller input.
///
/// `userid` is cast because the entity tables are not ours and may declare it as
/// `INTEGER`; the cast keeps decoding to `i64` valid either way.
fn owner_query(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Experiment => "SELECT userid::BIGINT FROM experiments WHERE id = $1",
        EntityType::Item => "SELECT userid::BIGINT FROM items WHERE id = $1",
    }
}

/// Read-only repository answering "who owns this entity".
#[derive(Clone)]
pub struct OwnershipRepository {
    pool: PgPool,
}

impl OwnershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the owner of an entity, `None` when the entity does not exist.
    #[tracing::instrument(skip(self), fields(db.table = %entity_type, db.record_id = entity_id))]
    pub async fn owner_of(
        &self,
        entity_id: i64,
        entity_type: EntityType,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<Postgres, i64>(owner_query(entity_type))
            .bind(entity_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Whether `principal` owns the entity. Missing entities are owned by nobody.
    pub async fn is_owned_by(
        &self,
        entity_id: i64,
        entity_type: EntityType,
        principal: PrincipalId,
    ) -> Result<bool, sqlx::Error> {
        let owner = self.owner_of(entity_id, entity_type).await?;
        Ok(owner == Some(principal.get()))
    }
}
