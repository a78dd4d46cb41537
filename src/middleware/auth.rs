use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Claims;
use crate::error::ApiError;

pub const NO_CREDENTIALS: &str = "no credentials provided";
pub const MALFORMED_CREDENTIALS: &str = "malformed credentials";
pub const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Authenticated identity extracted from the bearer token
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
        }
    }
}

/// Rejects the request unless it carries a valid bearer token, then makes
/// the caller's identity available as `Extension<AuthUser>`.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;

    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::debug!("Rejected bearer token for {} {}: {}", request.method(), request.uri().path(), e);
        ApiError::unauthorized(INVALID_CREDENTIALS)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Split `Authorization` on its first space; anything but `Bearer <token>` is malformed.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers.get(AUTHORIZATION).ok_or(NO_CREDENTIALS)?;
    let value = value.to_str().map_err(|_| MALFORMED_CREDENTIALS)?;
    if value.is_empty() {
        return Err(NO_CREDENTIALS);
    }

    match value.split_once(' ') {
        Some(("Bearer", token)) => Ok(token),
        _ => Err(MALFORMED_CREDENTIALS),
    }
}
