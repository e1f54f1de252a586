//! Persistence seam for token records.
//!
//! The services only see the [`TokenStore`] trait; the server wires in
//! [`postgres::PgStore`], tests wire in an in-memory implementation. The
//! store owns the token-record table exclusively: issuance inserts, a
//! successful validation touches `last_used_at`, revocation flips
//! `is_active`. Rows are never physically deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::token::permissions::PermissionSet;

pub mod postgres;

/// A persisted personal-access-token record. Contains the fingerprint but
/// never the cleartext. Deliberately not serializable: responses go through
/// the API's view types, which carry no fingerprint.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub fingerprint: String,
    /// Display-safe head of the cleartext (e.g. `CXI_h9Xk`).
    pub token_prefix: String,
    pub permissions: PermissionSet,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields the issuance service provides for a new record.
#[derive(Debug, Clone)]
pub struct NewTokenRecord {
    pub owner_id: Uuid,
    pub name: String,
    pub fingerprint: String,
    pub token_prefix: String,
    pub permissions: PermissionSet,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The unique fingerprint index rejected the insert. The issuance
    /// service retries generation on this; it is never silently overwritten.
    #[error("fingerprint already exists")]
    DuplicateFingerprint,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt permissions payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Number of records with `is_active = true` for an owner.
    async fn count_active(&self, owner_id: Uuid) -> Result<i64, StoreError>;

    /// Insert a new active record. Fails with
    /// [`StoreError::DuplicateFingerprint`] if the fingerprint is taken.
    async fn insert(&self, new: &NewTokenRecord) -> Result<TokenRecord, StoreError>;

    /// Look up the single active record for a fingerprint.
    async fn find_active_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<TokenRecord>, StoreError>;

    /// Set `last_used_at = now` on a record. Best-effort from the caller's
    /// point of view; last-writer-wins under concurrent validations.
    async fn touch_last_used(&self, id: Uuid) -> Result<(), StoreError>;

    /// Flip `is_active` to false for an owner's record. Returns whether a
    /// row changed.
    async fn deactivate(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError>;

    /// All records for an owner, newest first.
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<TokenRecord>, StoreError>;
}
