use std::sync::Arc;

use axum::extract::State;
use axum::http::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use bazaar_core::access::ensure_admin;
use bazaar_core::{AppError, Claims};

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the cookie that mirrors the issued token.
pub const TOKEN_COOKIE: &str = "bazaar-token";

/// Extract `<token>` from `Bearer <token>`.
fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that verifies `Authorization: Bearer <jwt>` and stores its [`Claims`]
/// in the request extensions.
///
/// No header at all is a 401; a header that fails verification is a 403.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return ApiError(AppError::Unauthorized(
            "Missing Authorization header. Expected: Bearer <token>".into(),
        ))
        .into_response();
    };

    let verified = header
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Forbidden("malformed Authorization header".into()))
        .and_then(|token| state.tokens.verify(token));

    match verified {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected bearer token");
            ApiError(e).into_response()
        }
    }
}

/// Middleware that lets the request through only when the authenticated user
/// is stored with the `admin` role. Must run after [`require_auth`].
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let email = match request.extensions().get::<Claims>() {
        Some(claims) => claims.email.clone(),
        None => {
            return ApiError(AppError::Unauthorized("authentication required".into()))
                .into_response();
        }
    };

    if let Err(e) = ensure_admin(&state.db.documents(), &email).await {
        return ApiError(e).into_response();
    }

    next.run(request).await
}
