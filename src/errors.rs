use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("active token quota exceeded")]
    QuotaExceeded,

    #[error("identity verification failed")]
    Unauthenticated,

    #[error("malformed token")]
    MalformedToken,

    #[error("token not found or revoked")]
    NotFoundOrRevoked,

    #[error("token expired")]
    Expired,

    #[error("insufficient permissions")]
    Forbidden,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::InvalidInput(reason) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "invalid_input",
                reason.clone(),
            ),
            AppError::QuotaExceeded => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "quota_exceeded",
                "maximum number of active tokens reached".to_string(),
            ),
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "identity_verification_failed",
                "missing or invalid user credential".to_string(),
            ),
            AppError::MalformedToken => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "malformed_token",
                "token does not look like a personal access token".to_string(),
            ),
            AppError::NotFoundOrRevoked => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "token_not_found",
                "invalid or revoked token".to_string(),
            ),
            AppError::Expired => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "token_expired",
                "token has expired".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "insufficient_permissions",
                "token does not grant the required permissions".to_string(),
            ),
            AppError::Store(e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
