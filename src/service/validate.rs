//! Token validation.
//!
//! Fail-fast pipeline: syntactic prefix check (no store access), fingerprint
//! lookup among active records, expiry, permission check, then a best-effort
//! `last_used_at` touch. The presented cleartext is never logged.

use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::store::TokenStore;
use crate::token::codec::{self, TOKEN_PREFIX};
use crate::token::permissions::PermissionSet;

/// Identity and grants returned to the caller for downstream authorization.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    pub owner_id: Uuid,
    pub token_name: String,
    pub permissions: PermissionSet,
}

pub async fn validate(
    store: &dyn TokenStore,
    presented: &str,
    required: &[String],
) -> Result<ValidatedToken, AppError> {
    if !presented.starts_with(TOKEN_PREFIX) {
        return Err(AppError::MalformedToken);
    }

    let fingerprint = codec::fingerprint(presented);
    let record = store
        .find_active_by_fingerprint(&fingerprint)
        .await?
        .ok_or(AppError::NotFoundOrRevoked)?;

    if let Some(expires_at) = record.expires_at {
        if expires_at < Utc::now() {
            return Err(AppError::Expired);
        }
    }

    if !required.is_empty() && !record.permissions.grants_all(required) {
        return Err(AppError::Forbidden);
    }

    // Observability side effect, not a correctness gate: a failed touch must
    // not fail an otherwise valid token.
    if let Err(e) = store.touch_last_used(record.id).await {
        tracing::warn!(token_id = %record.id, "failed to update last_used_at: {}", e);
    }

    Ok(ValidatedToken {
        owner_id: record.owner_id,
        token_name: record.name,
        permissions: record.permissions,
    })
}
