//! Document store on a single `documents` table.

use sqlx::PgPool;
use sqlx::types::Json;

use crate::store::{
    CollectionPath, DocPath, Document, DocumentStore, StoreError, WriteBatch, WriteOp,
};

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    path: String,
    data: Json<serde_json::Value>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let path = DocPath::parse(&row.path).map_err(|e| {
            StoreError::DataCorruption(format!("invalid document path in database: {e}"))
        })?;
        Ok(Self {
            path,
            data: row.data.0,
        })
    }
}

const UPSERT: &str = r"
    INSERT INTO documents (path, parent, data)
    VALUES ($1, $2, $3)
    ON CONFLICT (path) DO UPDATE
    SET data = EXCLUDED.data, updated_at = now()
";

const DELETE: &str = "DELETE FROM documents WHERE path = $1";

/// Postgres-backed [`DocumentStore`].
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a new document store on `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check database connectivity.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the database is not reachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

impl DocumentStore for PgDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT path, data FROM documents WHERE path = $1",
        )
        .bind(path.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn set(&self, path: &DocPath, data: serde_json::Value) -> Result<(), StoreError> {
        sqlx::query(UPSERT)
            .bind(path.as_str())
            .bind(path.parent().as_str())
            .bind(Json(data))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        sqlx::query(DELETE)
            .bind(path.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_collection(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT path, data FROM documents WHERE parent = $1 ORDER BY path",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn query_eq(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r"
            SELECT path, data FROM documents
            WHERE parent = $1 AND data ->> $2 = $3
            ORDER BY path
            ",
        )
        .bind(collection.as_str())
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for op in batch.ops() {
            match op {
                WriteOp::Set { path, data } => {
                    sqlx::query(UPSERT)
                        .bind(path.as_str())
                        .bind(path.parent().as_str())
                        .bind(Json(data))
                        .execute(&mut *tx)
                        .await?;
                }
                WriteOp::Delete { path } => {
                    sqlx::query(DELETE)
                        .bind(path.as_str())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        // Dropping `tx` on an early return above rolls the batch back.
        tx.commit().await?;
        Ok(())
    }
}
