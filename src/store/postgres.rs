use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::token::permissions::PermissionSet;

use super::{NewTokenRecord, StoreError, TokenRecord, TokenStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

const RECORD_COLUMNS: &str = "id, owner_id, name, fingerprint, token_prefix, permissions, \
     expires_at, is_active, last_used_at, created_at";

#[async_trait]
impl TokenStore for PgStore {
    async fn count_active(&self, owner_id: Uuid) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM personal_tokens WHERE owner_id = $1 AND is_active = true",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn insert(&self, new: &NewTokenRecord) -> Result<TokenRecord, StoreError> {
        let row = sqlx::query_as::<_, PgTokenRow>(&format!(
            r#"INSERT INTO personal_tokens (owner_id, name, fingerprint, token_prefix, permissions, expires_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {RECORD_COLUMNS}"#
        ))
        .bind(new.owner_id)
        .bind(&new.name)
        .bind(&new.fingerprint)
        .bind(&new.token_prefix)
        .bind(serde_json::to_value(&new.permissions)?)
        .bind(new.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateFingerprint
            }
            _ => StoreError::Database(e),
        })?;

        row.into_record()
    }

    async fn find_active_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<TokenRecord>, StoreError> {
        let row = sqlx::query_as::<_, PgTokenRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM personal_tokens \
             WHERE fingerprint = $1 AND is_active = true"
        ))
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PgTokenRow::into_record).transpose()
    }

    async fn touch_last_used(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE personal_tokens SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn deactivate(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE personal_tokens SET is_active = false \
             WHERE id = $1 AND owner_id = $2 AND is_active = true",
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<TokenRecord>, StoreError> {
        let rows = sqlx::query_as::<_, PgTokenRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM personal_tokens \
             WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PgTokenRow::into_record).collect()
    }
}

/// Raw row shape; `permissions` stays JSONB until decoded into the typed set.
#[derive(Debug, sqlx::FromRow)]
struct PgTokenRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    fingerprint: String,
    token_prefix: String,
    permissions: serde_json::Value,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    last_used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl PgTokenRow {
    fn into_record(self) -> Result<TokenRecord, StoreError> {
        let permissions: PermissionSet = serde_json::from_value(self.permissions)?;
        Ok(TokenRecord {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            fingerprint: self.fingerprint,
            token_prefix: self.token_prefix,
            permissions,
            expires_at: self.expires_at,
            is_active: self.is_active,
            last_used_at: self.last_used_at,
            created_at: self.created_at,
        })
    }
}
