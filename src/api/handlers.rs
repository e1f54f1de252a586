use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::service::{issue, validate};
use crate::store::{TokenRecord, TokenStore};
use crate::token::permissions::PermissionSet;
use crate::AppState;

use super::AuthedUser;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct IssueTokenRequest {
    #[serde(rename = "tokenName")]
    pub token_name: String,
    pub permissions: PermissionSet,
    /// RFC 3339 timestamp, or the sentinel `"never"` for no expiry.
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<String>,
}

#[derive(Serialize)]
pub struct IssueTokenResponse {
    /// The cleartext token. This is the only place it is ever visible.
    pub token: String,
    #[serde(rename = "tokenData")]
    pub token_data: TokenData,
}

#[derive(Serialize)]
pub struct TokenData {
    pub id: Uuid,
    pub token_name: String,
    pub token_prefix: String,
    pub permissions: PermissionSet,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ValidateTokenRequest {
    pub token: String,
    #[serde(rename = "requiredPermissions", default)]
    pub required_permissions: Vec<String>,
}

#[derive(Serialize)]
pub struct ValidateTokenResponse {
    pub valid: bool,
    pub user_id: Uuid,
    pub token_name: String,
    pub permissions: PermissionSet,
}

/// Token listing entry: metadata only, no fingerprint, no cleartext.
#[derive(Serialize)]
pub struct TokenView {
    pub id: Uuid,
    pub token_name: String,
    pub token_prefix: String,
    pub permissions: PermissionSet,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<TokenRecord> for TokenView {
    fn from(r: TokenRecord) -> Self {
        TokenView {
            id: r.id,
            token_name: r.name,
            token_prefix: r.token_prefix,
            permissions: r.permissions,
            is_active: r.is_active,
            expires_at: r.expires_at,
            last_used_at: r.last_used_at,
            created_at: r.created_at,
        }
    }
}

fn parse_expiry(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    match raw {
        None => Ok(None),
        Some("never") => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| {
                AppError::InvalidInput(format!("expiresAt must be RFC 3339 or \"never\": {s}"))
            }),
    }
}

// ── Handlers ─────────────────────────────────────────────────

/// POST /api/v1/tokens — issue a new personal access token
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(owner_id)): Extension<AuthedUser>,
    Json(payload): Json<IssueTokenRequest>,
) -> Result<Json<IssueTokenResponse>, AppError> {
    let expires_at = parse_expiry(payload.expires_at.as_deref())?;

    let issued = issue::issue(
        &state.store,
        issue::IssueRequest {
            owner_id,
            name: payload.token_name,
            permissions: payload.permissions,
            expires_at,
        },
    )
    .await?;

    let record = issued.record;
    Ok(Json(IssueTokenResponse {
        token: issued.cleartext,
        token_data: TokenData {
            id: record.id,
            token_name: record.name,
            token_prefix: record.token_prefix,
            permissions: record.permissions,
            expires_at: record.expires_at,
            created_at: record.created_at,
        },
    }))
}

/// POST /api/v1/tokens/validate — validate a presented token
pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ValidateTokenRequest>,
) -> Result<Json<ValidateTokenResponse>, AppError> {
    let validated = validate::validate(
        &state.store,
        &payload.token,
        &payload.required_permissions,
    )
    .await?;

    Ok(Json(ValidateTokenResponse {
        valid: true,
        user_id: validated.owner_id,
        token_name: validated.token_name,
        permissions: validated.permissions,
    }))
}

/// GET /api/v1/tokens — list the caller's tokens (metadata only)
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(owner_id)): Extension<AuthedUser>,
) -> Result<Json<Vec<TokenView>>, AppError> {
    let records = state.store.list_for_owner(owner_id).await?;
    Ok(Json(records.into_iter().map(TokenView::from).collect()))
}

/// DELETE /api/v1/tokens/:id — revoke one of the caller's tokens
pub async fn revoke_token(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(owner_id)): Extension<AuthedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let revoked = state.store.deactivate(id, owner_id).await?;
    Ok(Json(json!({ "id": id, "revoked": revoked })))
}

// ── Tests ───────────────────────────────────────────────────────
