use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::AppState;

pub mod handlers;

/// Build the token API router.
/// All routes are relative — the caller mounts this under `/api/v1`.
pub fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Issuance, listing and revocation act on the caller's own tokens and
    // need an upstream-verified identity; validation authenticates with the
    // presented token itself.
    let owner_routes = Router::new()
        .route(
            "/tokens",
            get(handlers::list_tokens).post(handlers::issue_token),
        )
        .route("/tokens/:id", delete(handlers::revoke_token))
        .route_layer(middleware::from_fn_with_state(
            state.config.clone(),
            require_identity,
        ));

    Router::new()
        .merge(owner_routes)
        .route("/tokens/validate", post(handlers::validate_token))
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Owner identity established by the external identity collaborator's JWT.
#[derive(Debug, Clone, Copy)]
pub struct AuthedUser(pub Uuid);

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Middleware: verifies the `Authorization: Bearer <jwt>` user credential
/// and injects the owner id. Any verification failure is a structured 401.
async fn require_identity(
    State(cfg): State<Config>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| {
            tracing::warn!("token API: missing Authorization bearer credential");
            AppError::Unauthenticated
        })?;

    let key = DecodingKey::from_secret(cfg.jwt_secret.as_bytes());
    let claims = jsonwebtoken::decode::<Claims>(bearer, &key, &Validation::new(Algorithm::HS256))
        .map_err(|e| {
            tracing::warn!("token API: identity verification failed: {}", e);
            AppError::Unauthenticated
        })?
        .claims;

    let owner_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        tracing::warn!("token API: identity subject is not a UUID");
        AppError::Unauthenticated
    })?;

    req.extensions_mut().insert(AuthedUser(owner_id));
    Ok(next.run(req).await)
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{to_bytes, Body};
    use axum::http::header;
    use axum::Extension;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;
    use tower::ServiceExt;

    const SECRET: &str = "unit-test-signing-secret";

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: usize,
    }

    fn test_config() -> Config {
        Config {
            port: 0,
            database_url: String::new(),
            jwt_secret: SECRET.to_string(),
        }
    }

    /// A router with only the identity middleware and a probe handler that
    /// echoes the injected owner id.
    fn guarded_router() -> Router {
        async fn whoami(Extension(AuthedUser(owner_id)): Extension<AuthedUser>) -> String {
            owner_id.to_string()
        }
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(
                test_config(),
                require_identity,
            ))
    }

    fn jwt_for(sub: &str, secret: &str) -> String {
        let claims = TestClaims {
            sub: sub.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    async fn send(authorization: Option<String>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let response = guarded_router()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_missing_bearer_is_401_with_error_body() {
        let (status, body) = send(None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"]["code"], "identity_verification_failed");
        assert_eq!(json["error"]["type"], "authentication_error");
    }

    #[tokio::test]
    async fn test_garbage_bearer_is_401() {
        let (status, body) = send(Some("Bearer not-a-jwt".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"]["code"], "identity_verification_failed");
    }

    #[tokio::test]
    async fn test_wrong_signing_secret_is_401() {
        let sub = Uuid::new_v4().to_string();
        let (status, _) = send(Some(format!(
            "Bearer {}",
            jwt_for(&sub, "some-other-secret")
        )))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_uuid_subject_is_401() {
        let (status, _) = send(Some(format!("Bearer {}", jwt_for("service-account", SECRET)))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_jwt_reaches_handler_with_owner_id() {
        let owner = Uuid::new_v4();
        let (status, body) =
            send(Some(format!("Bearer {}", jwt_for(&owner.to_string(), SECRET)))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, owner.to_string());
    }
}
