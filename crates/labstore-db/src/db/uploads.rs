//! Upload repository: append-only writes to the uploads table.

use labstore_core::UploadRecord;
use sqlx::{PgPool, Postgres};

const INSERT_UPLOAD: &str = r#"
    INSERT INTO uploads (
        real_name,
        long_name,
        comment,
        item_id,
        userid,
        type,
        hash,
        hash_algorithm
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING id
"#;

const STORAGE_NAME_EXISTS: &str =
    "SELECT EXISTS (SELECT 1 FROM uploads WHERE long_name = $1)";

/// Repository for the uploads table.
#[derive(Clone)]
pub struct UploadRepository {
    pool: PgPool,
}

impl UploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new upload record and return its id.
    ///
    /// Every value is bound as a parameter; nothing from the record is spliced into the
    /// statement text.
    #[tracing::instrument(
        skip(self, record),
        fields(
            db.table = "uploads",
            entity_type = %record.entity_type,
            entity_id = record.entity_id,
            storage_name = %record.storage_name
        )
    )]
    pub async fn create(&self, record: &UploadRecord) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar::<Postgres, i64>(INSERT_UPLOAD)
            .bind(&record.display_name)
            .bind(&record.storage_name)
            .bind(&record.comment)
            .bind(record.entity_id)
            .bind(record.principal_id.get())
            .bind(record.entity_type.as_str())
            .bind(&record.digest)
            .bind(record.digest_algorithm.as_str())
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(upload_id = id, "Upload record inserted");
        Ok(id)
    }

    /// Check whether a storage name is already referenced by a record.
    #[tracing::instrument(skip(self), fields(db.table = "uploads"))]
    pub async fn storage_name_exists(&self, storage_name: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<Postgres, bool>(STORAGE_NAME_EXISTS)
            .bind(storage_name)
            .fetch_one(&self.pool)
            .await
    }
}
