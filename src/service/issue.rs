//! Token issuance.
//!
//! One durable insert per successful call; the cleartext is observable only
//! in the returned [`IssuedToken`] and is never persisted or logged.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::store::{NewTokenRecord, StoreError, TokenRecord, TokenStore};
use crate::token::codec;
use crate::token::permissions::PermissionSet;

use super::{MAX_ACTIVE_TOKENS_PER_OWNER, MAX_GENERATION_ATTEMPTS};

pub const NAME_MAX_LEN: usize = 50;

#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub owner_id: Uuid,
    pub name: String,
    pub permissions: PermissionSet,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of a successful issuance. `cleartext` is shown exactly once.
#[derive(Debug)]
pub struct IssuedToken {
    pub cleartext: String,
    pub record: TokenRecord,
}

pub async fn issue(store: &dyn TokenStore, req: IssueRequest) -> Result<IssuedToken, AppError> {
    let name_len = req.name.chars().count();
    if name_len == 0 || name_len > NAME_MAX_LEN {
        return Err(AppError::InvalidInput(format!(
            "token name must be 1-{NAME_MAX_LEN} characters"
        )));
    }

    // Check-then-insert; concurrent issuers can transiently overshoot the
    // quota by the degree of concurrency (tolerated, see DESIGN.md).
    let active = store.count_active(req.owner_id).await?;
    if active >= MAX_ACTIVE_TOKENS_PER_OWNER {
        return Err(AppError::QuotaExceeded);
    }

    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        let cleartext = codec::generate();
        let new = NewTokenRecord {
            owner_id: req.owner_id,
            name: req.name.clone(),
            fingerprint: codec::fingerprint(&cleartext),
            token_prefix: codec::display_prefix(&cleartext),
            permissions: req.permissions.clone(),
            expires_at: req.expires_at,
        };

        match store.insert(&new).await {
            Ok(record) => {
                tracing::info!(
                    token_id = %record.id,
                    owner_id = %record.owner_id,
                    name = %record.name,
                    "issued personal access token"
                );
                return Ok(IssuedToken { cleartext, record });
            }
            Err(StoreError::DuplicateFingerprint) => {
                tracing::warn!(attempt, "fingerprint collision on insert, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "exhausted {MAX_GENERATION_ATTEMPTS} token generation attempts"
    )))
}
