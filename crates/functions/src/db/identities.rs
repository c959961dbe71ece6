//! Identity & claims store on the `identities` table.

use sqlx::PgPool;
use sqlx::types::Json;

use menuboard_core::{CustomClaims, Email, Uid};

use crate::store::{IdentityStore, StoreError, UserRecord};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    uid: String,
    email: Option<String>,
    claims: Option<Json<serde_json::Value>>,
}

impl TryFrom<IdentityRow> for UserRecord {
    type Error = StoreError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| StoreError::DataCorruption(format!("invalid email in database: {e}")))?;

        let claims = row
            .claims
            .map(|Json(value)| serde_json::from_value::<CustomClaims>(value))
            .transpose()
            .map_err(|e| {
                StoreError::DataCorruption(format!("invalid custom claims in database: {e}"))
            })?;

        Ok(Self {
            uid: Uid::new(row.uid),
            email,
            claims,
        })
    }
}

// =============================================================================
// Store
// =============================================================================

/// Postgres-backed [`IdentityStore`].
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    /// Create a new identity store on `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl IdentityStore for PgIdentityStore {
    async fn get_user(&self, uid: &Uid) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT uid, email, claims FROM identities WHERE uid = $1",
        )
        .bind(uid.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create_user(&self, uid: &Uid, email: Option<&Email>) -> Result<UserRecord, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r"
            INSERT INTO identities (uid, email)
            VALUES ($1, $2)
            RETURNING uid, email, claims
            ",
        )
        .bind(uid.as_str())
        .bind(email.map(Email::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict(format!("uid {uid} already exists"));
            }
            StoreError::Database(e)
        })?;

        row.try_into()
    }

    async fn set_custom_claims(&self, uid: &Uid, claims: &CustomClaims) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE identities SET claims = $2, updated_at = now() WHERE uid = $1",
        )
        .bind(uid.as_str())
        .bind(Json(claims))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("no user record for uid {uid}")));
        }
        Ok(())
    }

    async fn delete_user(&self, uid: &Uid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM identities WHERE uid = $1")
            .bind(uid.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("no user record for uid {uid}")));
        }
        Ok(())
    }
}
